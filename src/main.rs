//! Gateway binary entrypoint: load configuration from the environment, build the HTTP
//! surface, and serve it. Grounded on the teacher's `mcp_http_adapter::AxumHttpAdapter::serve`
//! (`TcpListener::bind` + `axum::serve`).

use llmgate::config::GatewayConfig;
use llmgate::http_api::build_router;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = GatewayConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let router = build_router(Arc::new(config));

    log::info!("llmgate listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
