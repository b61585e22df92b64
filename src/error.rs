//! Error kinds for the gateway, mirroring the propagation policy: tool-layer errors are
//! absorbed locally and turned into model-visible text, while upstream and request-decoding
//! errors surface to the HTTP client.
//!
//! Follows the teacher codebase's existing `BashError`/`FileSystemError` idiom: hand-rolled
//! `Display` + `std::error::Error` impls, no `thiserror`/`anyhow`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::fmt;

/// Errors raised while validating a caller-supplied relative path.
///
/// Never crosses the tool boundary as an `Err` — [`crate::tool_executor::ToolExecutor::execute`]
/// converts it into an `Error:`-prefixed string for the model to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path contained the `..` traversal token.
    Traversal,
    /// The path began with a sensitive absolute prefix (`/etc`, `/root`, ...).
    SensitivePrefix(String),
    /// The resolved, normalized path escaped the process working directory.
    EscapesWorkingDirectory,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Traversal => write!(f, "Path traversal not allowed (contains '..')"),
            PathError::SensitivePrefix(prefix) => {
                write!(f, "Path is not allowed (sensitive prefix '{}')", prefix)
            }
            PathError::EscapesWorkingDirectory => {
                write!(f, "Path escapes the working directory")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Errors raised while dispatching or running a whitelisted tool.
///
/// Like [`PathError`], every variant is absorbed by the Tool Executor and rendered as an
/// `Error:`-prefixed tool message rather than propagated to the orchestrator as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The requested tool name has no entry in the whitelist.
    Unknown(String),
    /// The caller-supplied path argument failed [`PathError`] validation.
    Path(PathError),
    /// The subprocess exceeded the wall-clock timeout.
    Timeout,
    /// Captured stdout/stderr exceeded the output cap.
    OutputOverflow,
    /// The subprocess could not be spawned, or exited nonzero with no useful output.
    Runtime(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Unknown(name) => {
                write!(f, "Tool '{}' not found in whitelist", name)
            }
            ToolError::Path(e) => write!(f, "{}", e),
            ToolError::Timeout => write!(f, "Command timed out after 10 seconds"),
            ToolError::OutputOverflow => {
                write!(f, "Command output exceeded the 1 MiB cap")
            }
            ToolError::Runtime(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ToolError {}

/// A non-2xx response from the upstream LLM. Surfaced to the client verbatim; never retried.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    /// HTTP status code returned by upstream.
    pub status: u16,
    /// Raw response body, forwarded unparsed in the `details` field.
    pub body: String,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream call failed with status {}: {}", self.status, self.body)
    }
}

impl std::error::Error for UpstreamError {}

/// Top-level error surfaced by the HTTP surface, mapped to a status code and JSON body.
#[derive(Debug)]
pub enum GatewayError {
    /// The client's JSON body could not be decoded. Maps to HTTP 400.
    MalformedRequest(String),
    /// The upstream LLM returned a non-2xx response. Maps to upstream's own status.
    Upstream(UpstreamError),
    /// Anything else. Maps to HTTP 500.
    Internal(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::MalformedRequest(msg) => write!(f, "malformed request: {}", msg),
            GatewayError::Upstream(e) => write!(f, "{}", e),
            GatewayError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<UpstreamError> for GatewayError {
    fn from(e: UpstreamError) -> Self {
        GatewayError::Upstream(e)
    }
}

/// Maps each variant to the status code and JSON body the HTTP surface sends the client.
/// A network-level failure reaching upstream at all (`status == 0`) gets a plain `{error}`
/// body and 502; an upstream response that itself failed gets `{error, details}` with
/// upstream's own status passed through.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::MalformedRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            GatewayError::Upstream(e) if e.status == 0 => {
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
            }
            GatewayError::Upstream(e) => (
                StatusCode::from_u16(e.status).unwrap_or(StatusCode::BAD_GATEWAY),
                Json(json!({ "error": "API call failed", "details": e.body })),
            )
                .into_response(),
            GatewayError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": msg })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_request_maps_to_400() {
        let response = GatewayError::MalformedRequest("bad body".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn network_level_upstream_failure_maps_to_502() {
        let response = GatewayError::Upstream(UpstreamError { status: 0, body: "timed out".to_string() }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn upstream_http_failure_passes_through_its_own_status() {
        let response =
            GatewayError::Upstream(UpstreamError { status: 429, body: "rate limited".to_string() }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
