//! Configuration for the gateway.
//!
//! Provides [`GatewayConfig`], the single environment-supplied record consumed at startup.
//! Following the same philosophy as the original CloudLLM config: no TOML/YAML parsing
//! dependency is introduced, callers just populate a plain struct.
//!
//! # Example
//!
//! ```rust
//! use llmgate::config::GatewayConfig;
//!
//! let config = GatewayConfig {
//!     upstream_base_url: "https://api.openai.com".to_string(),
//!     upstream_api_key: "sk-...".to_string(),
//!     allowed_models: None,
//!     bind_addr: "0.0.0.0:8080".to_string(),
//! };
//! assert!(config.is_model_allowed("gpt-4.1"));
//! ```

use std::fmt;

/// Default bind address used when `GATEWAY_BIND_ADDR` is not set.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Global configuration for the gateway, loaded once at process startup.
///
/// Immutable after construction; freely shareable across request workers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the upstream OpenAI-compatible service, e.g. `"https://api.openai.com"`.
    /// No trailing slash.
    pub upstream_base_url: String,
    /// Bearer token sent as `Authorization: Bearer <token>` on every upstream call.
    pub upstream_api_key: String,
    /// Allowlisted model names. `None` means every model name is accepted.
    pub allowed_models: Option<Vec<String>>,
    /// Socket address the HTTP surface binds to.
    pub bind_addr: String,
}

/// Failure building a [`GatewayConfig`] from the process environment.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl GatewayConfig {
    /// Build a [`GatewayConfig`] from environment variables.
    ///
    /// Required: `GATEWAY_UPSTREAM_BASE_URL`, `GATEWAY_UPSTREAM_API_KEY`.
    /// Optional: `GATEWAY_ALLOWED_MODELS` (comma-separated), `GATEWAY_BIND_ADDR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let upstream_base_url = std::env::var("GATEWAY_UPSTREAM_BASE_URL")
            .map_err(|_| ConfigError("GATEWAY_UPSTREAM_BASE_URL is not set".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let upstream_api_key = std::env::var("GATEWAY_UPSTREAM_API_KEY")
            .map_err(|_| ConfigError("GATEWAY_UPSTREAM_API_KEY is not set".to_string()))?;

        let allowed_models = std::env::var("GATEWAY_ALLOWED_MODELS").ok().map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<String>>()
        });

        let bind_addr =
            std::env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            upstream_base_url,
            upstream_api_key,
            allowed_models,
            bind_addr,
        })
    }

    /// Whether `model` is permitted by the configured allowlist.
    ///
    /// A `None` allowlist permits every model name.
    pub fn is_model_allowed(&self, model: &str) -> bool {
        match &self.allowed_models {
            None => true,
            Some(allowed) => allowed.iter().any(|m| m == model),
        }
    }
}
