//! Daemon entry point for the refdoc bot.
//!
//! Loads configuration from the command line and environment, reflects the
//! documentation corpus, and serves the MCP and event gateway surfaces.

mod bootstrap;
mod config;

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use refdoc_gateway::{GatewayServer, GatewayServerConfig};
use refdoc_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::RefdocConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing(config: &RefdocConfig) -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level)?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = RefdocConfig::from_args()?;
    init_tracing(&config)?;

    if !config.serves_anything() {
        warn!("no serving surface enabled; nothing to do");
        return Ok(());
    }

    let index = bootstrap::build_index(&config).await;
    let control = bootstrap::build_control_plane(&config, index);
    let _sweeper = control.sessions().clone().spawn_sweeper();

    let mut servers: Vec<BoxFuture<'static, Result<(), BoxError>>> = Vec::new();
    if config.enable_stdio {
        servers.push(serve_stdio(control.clone()).boxed());
    }
    if config.mcp_serve {
        servers.push(
            serve_streamable_http(control.clone(), McpHttpServerConfig::new(config.mcp_http_addr))
                .boxed(),
        );
    }
    if config.gateway_serve {
        let gateway = GatewayServer::new(
            control.clone(),
            GatewayServerConfig::new(config.gateway_addr)
                .with_max_body_bytes(config.gateway_max_body_bytes)
                .with_request_timeout(config.gateway_timeout),
        );
        servers.push(gateway.serve().boxed());
    }
    info!(surfaces = servers.len(), "refdoc-botd started");

    try_join_all(servers).await?;
    Ok(())
}
