//! Upstream Client
//!
//! Talks to the OpenAI-compatible chat-completions endpoint over raw `reqwest`, the same way
//! the teacher's `clients::common::send_with_native_tools` does rather than going through a
//! provider SDK: build the wire JSON by hand, POST it, and parse `choices[0].message` back out.
//! The shared, connection-pooled `reqwest::Client` is grounded on the teacher's
//! `SHARED_HTTP_CLIENT` `lazy_static`.
//!
//! Two send paths mirror the gateway's dual response contract: [`send_buffered`] parses the
//! full JSON body so the orchestrator can inspect tool calls, while [`send_streaming`] hands
//! back the raw [`reqwest::Response`] untouched so the HTTP surface can relay its SSE body
//! byte-for-byte.

use crate::error::UpstreamError;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

lazy_static! {
    /// Shared HTTP client with persistent connection pooling, reused across every upstream
    /// call made by the gateway.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(300))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build shared HTTP client");
}

/// Borrow the lazily initialized shared [`reqwest::Client`].
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// A single `tool_calls[]` entry parsed out of an assistant message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Token accounting reported by the upstream `usage` object, if present.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// The parsed result of a buffered (non-streaming) call to upstream.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
    /// The full, unmodified JSON body upstream returned. The Response Adapter augments this
    /// verbatim with a trace field rather than reconstructing a response shape by hand.
    pub raw: Value,
}

/// Build the JSON body shared by [`send_buffered`] and [`send_streaming`].
fn build_body(model: &str, messages: &[Value], tools: &[Value], stream: bool) -> Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
        "stream": stream,
    });
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools.to_vec());
    }
    body
}

/// POST to `{base_url}/v1/chat/completions` and parse the full JSON body.
///
/// Used for every iteration of the tool-discovery loop, where the orchestrator needs to
/// inspect `tool_calls` before deciding whether to continue.
pub async fn send_buffered(
    base_url: &str,
    api_key: &str,
    model: &str,
    messages: &[Value],
    tools: &[Value],
) -> Result<ChatResponse, UpstreamError> {
    let body = build_body(model, messages, tools, false);
    let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

    let resp = get_shared_http_client()
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| UpstreamError {
            status: 0,
            body: e.to_string(),
        })?;

    let status = resp.status();
    let text = resp.text().await.map_err(|e| UpstreamError {
        status: status.as_u16(),
        body: e.to_string(),
    })?;

    if !status.is_success() {
        log::error!("upstream_client::send_buffered: HTTP {} from {}: {}", status, url, text);
        return Err(UpstreamError {
            status: status.as_u16(),
            body: text,
        });
    }

    let parsed: Value = serde_json::from_str(&text).map_err(|e| UpstreamError {
        status: status.as_u16(),
        body: format!("could not parse upstream response: {}", e),
    })?;

    let message = parsed
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| UpstreamError {
            status: status.as_u16(),
            body: "upstream response had no choices[0].message".to_string(),
        })?;

    let content = message.get("content").and_then(|c| c.as_str()).map(|s| s.to_string());

    let tool_calls = message
        .get("tool_calls")
        .and_then(|tc| tc.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|tc| {
                    let id = tc.get("id")?.as_str()?.to_string();
                    let func = tc.get("function")?;
                    let name = func.get("name")?.as_str()?.to_string();
                    let args_str = func.get("arguments").and_then(|a| a.as_str()).unwrap_or("{}");
                    let arguments = parse_tool_arguments(args_str);
                    Some(ToolCall { id, name, arguments })
                })
                .collect()
        })
        .unwrap_or_default();

    let usage = parsed.get("usage").and_then(|u| serde_json::from_value(u.clone()).ok());

    Ok(ChatResponse {
        content,
        tool_calls,
        usage,
        raw: parsed,
    })
}

/// Parse a tool call's `arguments` string, treating an empty string or any non-object JSON
/// value as the empty object rather than as a parse failure.
fn parse_tool_arguments(args_str: &str) -> Value {
    match serde_json::from_str::<Value>(args_str) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => serde_json::json!({}),
    }
}

/// POST to `{base_url}/v1/chat/completions` with `"stream": true` and return the raw
/// [`reqwest::Response`] so the caller can relay its SSE body untouched.
pub async fn send_streaming(
    base_url: &str,
    api_key: &str,
    model: &str,
    messages: &[Value],
    tools: &[Value],
) -> Result<reqwest::Response, UpstreamError> {
    let body = build_body(model, messages, tools, true);
    let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

    let resp = get_shared_http_client()
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| UpstreamError {
            status: 0,
            body: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        log::error!("upstream_client::send_streaming: HTTP {} from {}: {}", status, url, text);
        return Err(UpstreamError {
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(resp)
}
