use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use tracing::error;

use cntube_stt::Transcription;

use crate::state::AppState;
use crate::types::{ErrorResponse, ProcessRequest, ProcessResponse};
use crate::workflow;

#[post("/process")]
pub async fn process(
    req: web::Json<ProcessRequest>,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let req = req.into_inner();
    let user_level = req
        .user_level
        .unwrap_or(state.config.default_user_level)
        .clamp(1, 7);

    match workflow::run(&state, &req.video_url, user_level).await {
        Ok(output) => {
            let Transcription { text, segments, .. } = output.transcription;
            Ok(HttpResponse::Ok().json(ProcessResponse {
                success: true,
                video: output.video,
                transcription: text,
                segments,
                analysis: output.analysis,
            }))
        }
        Err(e) => {
            error!("Processing failed at {} stage: {}", e.stage.as_str(), e.source);

            let status = StatusCode::from_u16(e.source.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Ok(HttpResponse::build(status).json(ErrorResponse {
                error: e.source.to_string(),
                stage: e.stage.as_str().to_string(),
            }))
        }
    }
}
