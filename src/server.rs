//! HTTP boundary: request/response shapes and error-code mapping.
//!
//! `POST /chat` runs the pipeline; `GET /health` is a liveness probe.
//! Every failure is mapped to the error taxonomy before externalization —
//! raw provider text never reaches a response body. Full detail is
//! logged server-side only.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::error::ChatError;
use crate::pipeline::ChatPipeline;
use crate::types::ChatRequest;

/// Shared state for request handlers.
///
/// The pipeline is absent when the service started without its required
/// secrets; chat requests then receive a structured configuration error
/// instead of the process refusing to boot, so operators see the
/// machine-readable code.
#[derive(Clone)]
pub struct AppState {
    /// The composed pipeline, when configuration was complete at startup.
    pub pipeline: Option<Arc<ChatPipeline>>,
}

/// Caller-facing error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message, free of internal detail.
    pub error: String,
    /// Machine-readable code, distinct from the HTTP status.
    #[serde(rename = "errorCode")]
    pub error_code: &'static str,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
/// while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    // A body axum cannot deserialize still gets the structured error
    // contract, not the default plain-text rejection.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(&ChatError::Validation(rejection.body_text()));
        }
    };

    let Some(pipeline) = state.pipeline else {
        return error_response(&ChatError::Configuration(
            "pseudonymization salt is not set".to_owned(),
        ));
    };

    match pipeline.handle(&request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Map a pipeline error to status, code, and a safe message.
fn error_response(e: &ChatError) -> Response {
    let (status, message) = match e {
        ChatError::Validation(detail) => {
            warn!(error = %e, "rejected invalid request");
            (StatusCode::BAD_REQUEST, detail.clone())
        }
        ChatError::Configuration(_) => {
            error!(error = %e, "configuration error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error".to_owned(),
            )
        }
        ChatError::Provider(_) | ChatError::Internal(_) => {
            error!(error = %e, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            )
        }
    };

    (
        status,
        Json(ErrorBody {
            error: message,
            error_code: e.error_code(),
        }),
    )
        .into_response()
}
