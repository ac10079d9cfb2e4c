use tracing::info;

use cntube_analysis::AnalysisResult;
use cntube_common::CntubeError;
use cntube_media::{TempSession, VideoInfo};
use cntube_stt::{Transcription, TranscriptionOptions};

use crate::state::AppState;

/// Embedding queries stay bounded regardless of transcript length
const MAX_QUERY_CHARS: usize = 2000;

/// Pipeline stages, used for error attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validation,
    Download,
    Transcription,
    Analysis,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Download => "download",
            Self::Transcription => "transcription",
            Self::Analysis => "analysis",
        }
    }
}

/// A stage failure
#[derive(Debug, thiserror::Error)]
#[error("{} stage failed: {source}", stage.as_str())]
pub struct PipelineError {
    /// Stage that produced the failure
    pub stage: PipelineStage,

    /// Underlying error
    #[source]
    pub source: CntubeError,
}

impl PipelineError {
    fn new(stage: PipelineStage, source: CntubeError) -> Self {
        Self { stage, source }
    }
}

/// Everything the pipeline produced for one request
pub struct PipelineOutput {
    pub video: VideoInfo,
    pub transcription: Transcription,
    pub analysis: AnalysisResult,
}

/// Run the full pipeline for one video URL
///
/// Stages run sequentially: validate, probe + download audio, transcribe,
/// analyze. The session directory is removed on every exit path by the
/// `TempSession` drop guard.
pub async fn run(
    state: &AppState,
    video_url: &str,
    user_level: u8,
) -> Result<PipelineOutput, PipelineError> {
    cntube_media::validate_url(video_url)
        .map_err(|e| PipelineError::new(PipelineStage::Validation, e))?;

    let session = TempSession::create(&state.config.temp_dir)
        .map_err(|e| PipelineError::new(PipelineStage::Download, e))?;

    info!("Processing video: {}", video_url);
    let video = cntube_media::probe_video(video_url)
        .await
        .map_err(|e| PipelineError::new(PipelineStage::Download, e))?;
    info!("Video found: {} ({})", video.title, video.id);

    let audio_path = cntube_media::fetch_audio(video_url, session.dir())
        .await
        .map_err(|e| PipelineError::new(PipelineStage::Download, e))?;

    // Whisper inference is CPU-bound; keep it off the executor threads
    let engine = state.engine.clone();
    let transcription = tokio::task::spawn_blocking(move || {
        let options = TranscriptionOptions::default();
        engine.transcribe(&audio_path, &options)
    })
    .await
    .map_err(|e| {
        PipelineError::new(
            PipelineStage::Transcription,
            CntubeError::internal(format!("Transcription task panicked: {}", e)),
        )
    })?
    .map_err(|e| PipelineError::new(PipelineStage::Transcription, e))?;

    if transcription.text.trim().is_empty() {
        return Err(PipelineError::new(
            PipelineStage::Transcription,
            CntubeError::transcription("No speech recognized in the audio"),
        ));
    }

    info!(
        "Transcription done: {} segments, language {}",
        transcription.segments.len(),
        transcription.language
    );

    // Audio is no longer needed
    drop(session);

    let grammar_context = match &state.grammar {
        Some(grammar) => {
            grammar
                .retrieve_context(retrieval_query(&transcription.text), user_level)
                .await
        }
        None => None,
    };

    let analysis = state
        .analyzer
        .analyze(&transcription.text, grammar_context.as_deref())
        .await;

    Ok(PipelineOutput {
        video,
        transcription,
        analysis,
    })
}

/// Prefix of the transcript used as the retrieval query
fn retrieval_query(text: &str) -> &str {
    match text.char_indices().nth(MAX_QUERY_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Validation.as_str(), "validation");
        assert_eq!(PipelineStage::Download.as_str(), "download");
        assert_eq!(PipelineStage::Transcription.as_str(), "transcription");
        assert_eq!(PipelineStage::Analysis.as_str(), "analysis");
    }

    #[test]
    fn test_pipeline_error_carries_stage_and_status() {
        let err = PipelineError::new(
            PipelineStage::Validation,
            CntubeError::invalid_input("URL must start with http:// or https://"),
        );
        assert_eq!(err.stage.as_str(), "validation");
        assert_eq!(err.source.status_code(), 400);
        assert!(err.to_string().contains("validation stage failed"));
    }

    #[test]
    fn test_retrieval_query_truncates_on_char_boundary() {
        let text = "學".repeat(MAX_QUERY_CHARS + 50);
        let query = retrieval_query(&text);
        assert_eq!(query.chars().count(), MAX_QUERY_CHARS);

        let short = "短文本";
        assert_eq!(retrieval_query(short), short);
    }
}
