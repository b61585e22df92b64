//! End-to-end ReACT loop scenarios driven against a mock upstream chat-completions server,
//! the way the teacher's `tests/bash_tool_test.rs` drives real subprocess scenarios rather than
//! mocking at the unit level.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use llmgate::config::GatewayConfig;
use llmgate::orchestrator::{Orchestrator, OrchestratorOutcome, MAX_ITERATIONS};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Spawn a mock upstream server whose scripted responses are produced by `respond`, called
/// once per request with the zero-based call index.
async fn spawn_mock_upstream<F>(respond: F) -> (String, tokio::task::JoinHandle<()>)
where
    F: Fn(usize) -> Value + Send + Sync + 'static,
{
    let state = Arc::new(MockState {
        calls: AtomicUsize::new(0),
        respond: Box::new(respond),
    });

    let router = Router::new()
        .route("/v1/chat/completions", post(mock_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), handle)
}

struct MockState {
    calls: AtomicUsize,
    respond: Box<dyn Fn(usize) -> Value + Send + Sync>,
}

async fn mock_handler(State(state): State<Arc<MockState>>, Json(_body): Json<Value>) -> Json<Value> {
    let call_index = state.calls.fetch_add(1, Ordering::SeqCst);
    Json((state.respond)(call_index))
}

fn chat_response(content: &str, tool_calls: Option<Value>) -> Value {
    let mut message = json!({ "role": "assistant", "content": content });
    if let Some(tool_calls) = tool_calls {
        message["tool_calls"] = tool_calls;
        message["content"] = Value::Null;
    }
    json!({
        "choices": [{ "index": 0, "message": message }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 },
    })
}

fn test_config(base_url: String) -> GatewayConfig {
    GatewayConfig {
        upstream_base_url: base_url,
        upstream_api_key: "test-key".to_string(),
        allowed_models: None,
        bind_addr: "0.0.0.0:0".to_string(),
    }
}

#[tokio::test]
async fn plain_chat_without_any_tool_call() {
    let (base_url, _server) = spawn_mock_upstream(|_| chat_response("Hello there!", None)).await;
    let config = test_config(base_url);
    let orchestrator = Orchestrator::new(&config);

    let outcome = orchestrator
        .run("gpt-4.1", vec![json!({ "role": "user", "content": "hi" })], false)
        .await
        .unwrap();

    match outcome {
        OrchestratorOutcome::Buffered { body, trace, usage } => {
            assert_eq!(body["choices"][0]["message"]["content"], "Hello there!");
            assert_eq!(trace[0]["content"], "hi");
            assert_eq!(usage.unwrap().total_tokens, 15);
        }
        OrchestratorOutcome::Streaming(_) => panic!("expected a buffered outcome"),
    }
}

#[tokio::test]
async fn single_tool_call_round_trip() {
    let (base_url, _server) = spawn_mock_upstream(|call_index| {
        if call_index == 0 {
            chat_response(
                "",
                Some(json!([{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "get_current_time", "arguments": "{}" }
                }])),
            )
        } else {
            chat_response("It is currently some time.", None)
        }
    })
    .await;
    let config = test_config(base_url);
    let orchestrator = Orchestrator::new(&config);

    let outcome = orchestrator
        .run("gpt-4.1", vec![json!({ "role": "user", "content": "what time is it?" })], false)
        .await
        .unwrap();

    match outcome {
        OrchestratorOutcome::Buffered { body, trace, .. } => {
            assert_eq!(body["choices"][0]["message"]["content"], "It is currently some time.");
            assert!(trace.iter().any(|m| m["role"] == "tool"));
        }
        OrchestratorOutcome::Streaming(_) => panic!("expected a buffered outcome"),
    }
}

#[tokio::test]
async fn rejected_path_argument_is_fed_back_as_a_tool_error() {
    let (base_url, _server) = spawn_mock_upstream(|call_index| {
        if call_index == 0 {
            chat_response(
                "",
                Some(json!([{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "list_files_in_path", "arguments": "{\"path\": \"../../etc\"}" }
                }])),
            )
        } else {
            chat_response("I can't look outside the project.", None)
        }
    })
    .await;
    let config = test_config(base_url);
    let orchestrator = Orchestrator::new(&config);

    let outcome = orchestrator
        .run("gpt-4.1", vec![json!({ "role": "user", "content": "show me /etc" })], false)
        .await
        .unwrap();

    match outcome {
        OrchestratorOutcome::Buffered { trace, .. } => {
            let tool_message = trace.iter().find(|m| m["role"] == "tool").unwrap();
            assert!(tool_message["content"].as_str().unwrap().starts_with("Error:"));
        }
        OrchestratorOutcome::Streaming(_) => panic!("expected a buffered outcome"),
    }
}

#[tokio::test]
async fn iteration_cap_forces_a_final_answer() {
    let (base_url, _server) = spawn_mock_upstream(|call_index| {
        if call_index < MAX_ITERATIONS as usize {
            chat_response(
                "",
                Some(json!([{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "get_current_time", "arguments": "{}" }
                }])),
            )
        } else {
            chat_response("Here is my best answer so far.", None)
        }
    })
    .await;
    let config = test_config(base_url);
    let orchestrator = Orchestrator::new(&config);

    let outcome = orchestrator
        .run("gpt-4.1", vec![json!({ "role": "user", "content": "loop forever" })], false)
        .await
        .unwrap();

    match outcome {
        OrchestratorOutcome::Buffered { body, .. } => {
            assert_eq!(
                body["choices"][0]["message"]["content"],
                "Here is my best answer so far."
            );
        }
        OrchestratorOutcome::Streaming(_) => panic!("expected a buffered outcome"),
    }
    assert_eq!(MAX_ITERATIONS, 10);
}

#[tokio::test]
async fn streaming_client_always_gets_a_fresh_streaming_call() {
    let (base_url, _server) = spawn_mock_upstream(|_| chat_response("Hello there!", None)).await;
    let config = test_config(base_url);
    let orchestrator = Orchestrator::new(&config);

    let outcome = orchestrator
        .run("gpt-4.1", vec![json!({ "role": "user", "content": "hi" })], true)
        .await
        .unwrap();

    assert!(matches!(outcome, OrchestratorOutcome::Streaming(_)));
}
