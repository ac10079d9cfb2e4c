//! CNtube HTTP Server
//!
//! Actix-web REST API: the video processing pipeline and a health probe

mod routes;
mod state;
mod types;
mod workflow;

pub use state::AppState;
pub use types::{ErrorResponse, HealthResponse, ProcessRequest, ProcessResponse};
pub use workflow::{run as run_pipeline, PipelineError, PipelineOutput, PipelineStage};

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_actix_web::TracingLogger;

use cntube_common::{AppConfig, Result};

/// Initialize the engines and run the HTTP server until shutdown
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_address = config.server_bind_address();
    let state = Arc::new(AppState::initialize(config).await?);

    info!("Starting HTTP server on {}", bind_address);

    let app_state = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .service(routes::process::process)
            .service(routes::system::health)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
