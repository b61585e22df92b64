//! HTTP Surface
//!
//! The axum [`Router`] the gateway exposes to chat clients: a single OpenAI-compatible
//! `POST /v1/chat/completions` endpoint plus a `/health` probe, grounded on the teacher's
//! `mcp_http_adapter::AxumHttpAdapter` (`Router::new().route(...)`, `TcpListener::bind`,
//! `axum::serve`) rather than introducing a second web framework.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::orchestrator::{Orchestrator, OrchestratorOutcome};
use crate::response_adapter::{render_buffered, render_streaming};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
}

/// Build the gateway's [`Router`].
pub fn build_router(config: Arc<GatewayConfig>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/v1/chat/completions",
            post(chat_completions).options(chat_completions_preflight),
        )
        .with_state(AppState { config })
        .layer(middleware::from_fn(log_requests))
}

/// One `log::info!` line per inbound request: method, path, status, duration. Ambient request
/// logging, not a log-shipping or analytics feature.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(request).await;
    log::info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status(),
        start.elapsed()
    );
    response
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Minimal CORS preflight courtesy: a 200 with an empty body, not a full CORS layer.
async fn chat_completions_preflight() -> impl IntoResponse {
    StatusCode::OK
}

async fn chat_completions(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let model = match payload.get("model").and_then(|v| v.as_str()) {
        Some(m) => m.to_string(),
        None => {
            return GatewayError::MalformedRequest("missing required field \"model\"".to_string())
                .into_response()
        }
    };

    if !state.config.is_model_allowed(&model) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": format!("model '{}' is not allowed by this gateway", model) })),
        )
            .into_response();
    }

    let messages = match payload.get("messages").and_then(|v| v.as_array()) {
        Some(m) => m.clone(),
        None => {
            return GatewayError::MalformedRequest("missing required field \"messages\"".to_string())
                .into_response()
        }
    };

    let stream = payload.get("stream").and_then(|v| v.as_bool()).unwrap_or(false);

    let orchestrator = Orchestrator::new(&state.config);
    match orchestrator.run(&model, messages, stream).await {
        Ok(outcome @ OrchestratorOutcome::Streaming(_)) => render_streaming(outcome),
        Ok(outcome @ OrchestratorOutcome::Buffered { .. }) => render_buffered(outcome),
        Err(e) => GatewayError::from(e).into_response(),
    }
}
