//! ReACT Orchestrator
//!
//! The state machine at the heart of the gateway: repeatedly call upstream, and whenever the
//! model responds with tool calls instead of a final answer, run them locally through
//! [`crate::tool_executor::ToolExecutor`] and feed the results back as `tool` messages. Bounded
//! to 10 iterations, mirroring the teacher's `Agent`'s tool-iteration loop (`max_tool_iterations`)
//! but with the cap this gateway's policy fixes rather than a caller-tunable knob.
//!
//! A steering system prompt describing the available tool categories is injected ahead of the
//! client's own messages on every upstream call and is never echoed back to the client: the
//! buffered response's `__react_messages` trace starts from the client's first message.
//!
//! Finalization always honors the client's own `stream` preference rather than piggybacking on
//! whichever call shape happened to settle the loop: a streaming client gets a fresh `stream`
//! call with no tools advertised even if the tool loop ended on its very first buffered call.

use crate::config::GatewayConfig;
use crate::tool_executor::ToolExecutor;
use crate::tool_registry::ToolRegistry;
use crate::upstream_client::{self, TokenUsage};
use serde_json::{json, Value};

/// Hard ceiling on tool-calling round trips per request. Fixed, not configurable: an
/// unbounded loop would let a misbehaving model turn one client request into unlimited
/// upstream spend.
pub const MAX_ITERATIONS: u32 = 10;

const STEERING_PROMPT: &str = "You are a helpful assistant with access to tools for inspecting \
the local host: its filesystem, clock, disk usage, operating system identity, toolchain \
version, and version-control status. This is a real local host, not a sandbox — never fabricate \
host-observable state such as file listings, the time, or VCS status; call the matching tool \
instead. When you have enough information, respond to the user directly without calling \
another tool.";

/// Outcome of running the ReACT loop to completion.
pub enum OrchestratorOutcome {
    /// The loop settled on a final assistant message. `body` is the upstream's own JSON body
    /// from the call that produced it, left otherwise untouched; `trace` is the full
    /// conversation minus the injected steering prompt.
    Buffered {
        body: Value,
        trace: Vec<Value>,
        usage: Option<TokenUsage>,
    },
    /// The client requested a stream; the raw final-call response is handed to the caller for
    /// passthrough relay.
    Streaming(reqwest::Response),
}

/// Drives the tool-calling loop for a single chat-completions request.
pub struct Orchestrator<'a> {
    config: &'a GatewayConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a GatewayConfig) -> Self {
        Self { config }
    }

    /// Run the ReACT loop for `model` over `client_messages`, finishing with whichever response
    /// shape `stream` requests.
    pub async fn run(
        &self,
        model: &str,
        client_messages: Vec<Value>,
        stream: bool,
    ) -> Result<OrchestratorOutcome, crate::error::UpstreamError> {
        let mut messages = Vec::with_capacity(client_messages.len() + 1);
        messages.push(json!({ "role": "system", "content": STEERING_PROMPT }));
        messages.extend(client_messages);

        let tools = ToolRegistry::to_wire();
        let mut usage_total: Option<TokenUsage> = None;
        let mut forced = false;
        let mut settled_body: Option<Value> = None;

        for iteration in 1..=MAX_ITERATIONS {
            let response = upstream_client::send_buffered(
                &self.config.upstream_base_url,
                &self.config.upstream_api_key,
                model,
                &messages,
                &tools,
            )
            .await?;

            usage_total = merge_usage(usage_total, response.usage.clone());

            if response.tool_calls.is_empty() {
                messages.push(json!({ "role": "assistant", "content": response.content }));
                settled_body = Some(response.raw);
                break;
            }

            let tool_calls_wire: Vec<Value> = response
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": serde_json::to_string(&tc.arguments).unwrap_or_else(|_| "{}".to_string()),
                        }
                    })
                })
                .collect();

            messages.push(json!({
                "role": "assistant",
                "content": response.content,
                "tool_calls": tool_calls_wire,
            }));

            for tc in &response.tool_calls {
                log::info!("orchestrator: executing tool '{}' (iteration {})", tc.name, iteration);
                let output = ToolExecutor::execute(&tc.name, &tc.arguments).await;
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": tc.id,
                    "content": output,
                }));
            }

            if iteration == MAX_ITERATIONS {
                forced = true;
            }
        }

        if stream {
            let resp = upstream_client::send_streaming(
                &self.config.upstream_base_url,
                &self.config.upstream_api_key,
                model,
                &messages,
                &[],
            )
            .await?;
            return Ok(OrchestratorOutcome::Streaming(resp));
        }

        let body = if forced {
            log::info!("orchestrator: iteration cap reached, forcing a final answer");
            let response = upstream_client::send_buffered(
                &self.config.upstream_base_url,
                &self.config.upstream_api_key,
                model,
                &messages,
                &[],
            )
            .await?;
            usage_total = merge_usage(usage_total, response.usage.clone());
            messages.push(json!({ "role": "assistant", "content": response.content }));
            response.raw
        } else {
            settled_body.expect("loop either settles or forces before exiting")
        };

        log::info!(
            "orchestrator: total usage across this request: {:?}",
            usage_total
        );

        Ok(OrchestratorOutcome::Buffered {
            body,
            trace: messages.into_iter().skip(1).collect(),
            usage: usage_total,
        })
    }
}

fn merge_usage(acc: Option<TokenUsage>, next: Option<TokenUsage>) -> Option<TokenUsage> {
    match (acc, next) {
        (None, n) => n,
        (a, None) => a,
        (Some(a), Some(n)) => Some(TokenUsage {
            prompt_tokens: a.prompt_tokens + n.prompt_tokens,
            completion_tokens: a.completion_tokens + n.completion_tokens,
            total_tokens: a.total_tokens + n.total_tokens,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_usage_sums_both_sides() {
        let a = TokenUsage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 };
        let b = TokenUsage { prompt_tokens: 2, completion_tokens: 3, total_tokens: 5 };
        let merged = merge_usage(Some(a), Some(b)).unwrap();
        assert_eq!(merged.total_tokens, 20);
    }

    #[test]
    fn merge_usage_handles_either_side_missing() {
        let a = TokenUsage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 };
        assert_eq!(merge_usage(None, Some(a.clone())).unwrap().total_tokens, 15);
        assert_eq!(merge_usage(Some(a), None).unwrap().total_tokens, 15);
        assert!(merge_usage(None, None).is_none());
    }

    #[test]
    fn iteration_cap_is_ten() {
        assert_eq!(MAX_ITERATIONS, 10);
    }
}
