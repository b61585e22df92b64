// src/lib.rs

//! `llmgate` is a reverse-proxy gateway that sits in front of an OpenAI-compatible
//! chat-completions endpoint and extends it with a tool-augmented ReACT reasoning loop:
//! the gateway repeatedly consults the upstream LLM, executes any tool calls the model
//! requests against the local host, feeds the results back, and finally returns either a
//! buffered JSON reply or a relayed SSE stream to the client.
//!
//! See [`orchestrator`] for the state machine at the heart of the crate.

pub mod config;
pub mod error;
pub mod http_api;
pub mod orchestrator;
pub mod path_sanitizer;
pub mod response_adapter;
pub mod tool_executor;
pub mod tool_registry;
pub mod upstream_client;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use orchestrator::Orchestrator;
