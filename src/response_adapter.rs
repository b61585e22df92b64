//! Response Adapter
//!
//! Turns an [`OrchestratorOutcome`] into the HTTP response the client actually sees, the way
//! the teacher's `mcp_http_adapter` turns library results into `(StatusCode, Json(...))` pairs.
//! Two distinct render paths back the gateway's dual response contract:
//!
//! - [`render_buffered`] returns the upstream's own JSON body verbatim, with one added
//!   `__react_messages` trace field.
//! - [`render_streaming`] relays the upstream SSE body byte-for-byte, stripping headers that
//!   don't make sense once the gateway (not the upstream) is the thing the client is talking
//!   to, and adding `X-Accel-Buffering: no` so intermediating proxies don't buffer the stream.

use crate::orchestrator::OrchestratorOutcome;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use futures_util::TryStreamExt;
use serde_json::json;

/// Headers that describe the connection to *upstream* and must not leak through when the
/// gateway relays its body to the client.
const STRIPPED_HEADERS: &[&str] = &["www-authenticate", "content-encoding"];

/// Render a completed buffered outcome as a JSON response: the upstream's own final-call body,
/// untouched but for one added `__react_messages` trace field of the full conversation after
/// the client's own messages (the injected steering prompt is never included). The upstream's
/// own `usage` field, if any, is left exactly as upstream sent it — never overwritten with the
/// cross-iteration accumulated total.
pub fn render_buffered(outcome: OrchestratorOutcome) -> Response {
    match outcome {
        OrchestratorOutcome::Buffered { mut body, trace, usage: _ } => {
            body["__react_messages"] = json!(trace);
            (StatusCode::OK, Json(body)).into_response()
        }
        OrchestratorOutcome::Streaming(_) => {
            // The orchestrator only produces a Streaming outcome when the caller asked for
            // one; render_streaming is the counterpart that handles it.
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "expected a buffered outcome" })),
            )
                .into_response()
        }
    }
}

/// Relay a streaming outcome's upstream SSE body unmodified, with header hygiene applied.
pub fn render_streaming(outcome: OrchestratorOutcome) -> Response {
    match outcome {
        OrchestratorOutcome::Streaming(upstream) => {
            let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::OK);
            let mut headers = HeaderMap::new();
            for (name, value) in upstream.headers() {
                if STRIPPED_HEADERS.contains(&name.as_str().to_ascii_lowercase().as_str()) {
                    continue;
                }
                headers.insert(name.clone(), value.clone());
            }
            headers.insert(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("text/event-stream"),
            );
            headers.insert(
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            );

            let body = Body::from_stream(upstream.bytes_stream().map_err(std::io::Error::other));

            let mut response = Response::new(body);
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        OrchestratorOutcome::Buffered { .. } => {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "expected a streaming outcome" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream_client::TokenUsage;
    use serde_json::Value;

    #[tokio::test]
    async fn render_buffered_includes_trace_and_leaves_upstream_usage_untouched() {
        let outcome = OrchestratorOutcome::Buffered {
            body: json!({
                "choices": [{ "index": 0, "message": { "role": "assistant", "content": "hi" } }],
                "usage": { "prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4 },
            }),
            trace: vec![json!({ "role": "user", "content": "hello" })],
            // A much larger accumulated total from earlier tool-calling iterations, to prove
            // it never overwrites the single settling call's own `usage` field above.
            usage: Some(TokenUsage { prompt_tokens: 300, completion_tokens: 100, total_tokens: 400 }),
        };
        let response = render_buffered(outcome);
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "hi");
        assert_eq!(body["__react_messages"][0]["content"], "hello");
        assert_eq!(body["usage"]["total_tokens"], 4);
    }
}
