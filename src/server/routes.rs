// src/server/routes.rs

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::engine::Orchestrator;
use crate::errors::CrawlctlError;
use crate::exec::ProcessLauncher;
use crate::types::{LaunchRequest, StatusRecord};

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error returned by the handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<CrawlctlError> for ApiError {
    fn from(err: CrawlctlError) -> Self {
        let status = match err {
            CrawlctlError::AlreadyRunning => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Router exposing the orchestrator's start/stop/status operations.
pub fn create_router<L>(orchestrator: Arc<Orchestrator<L>>) -> Router
where
    L: ProcessLauncher + 'static,
{
    Router::new()
        .route("/api/crawler/start", post(start_handler::<L>))
        .route("/api/crawler/stop", post(stop_handler::<L>))
        .route("/api/crawler/status", get(status_handler::<L>))
        .with_state(orchestrator)
        .layer(cors_layer())
}

/// Any origin may call the API; preflights are answered by the layer.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// POST /api/crawler/start
async fn start_handler<L: ProcessLauncher + 'static>(
    State(orchestrator): State<Arc<Orchestrator<L>>>,
    payload: Result<Json<LaunchRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Json(request) = payload.inspect_err(|e| warn!(error = %e, "rejected start request body"))?;
    debug!(?request, "start requested over HTTP");

    orchestrator.start(&request).await?;
    Ok(Json(MessageBody {
        message: "Crawler started",
    }))
}

/// POST /api/crawler/stop
async fn stop_handler<L: ProcessLauncher + 'static>(
    State(orchestrator): State<Arc<Orchestrator<L>>>,
) -> Json<MessageBody> {
    orchestrator.stop().await;
    Json(MessageBody {
        message: "Crawler stopped",
    })
}

/// GET /api/crawler/status
async fn status_handler<L: ProcessLauncher + 'static>(
    State(orchestrator): State<Arc<Orchestrator<L>>>,
) -> Json<StatusRecord> {
    Json(orchestrator.full_state())
}
