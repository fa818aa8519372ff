//! MCP server runners for refdoc.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, State};
use axum::routing::get;
use axum::Router;
use refdoc_core::control::ReflectControlPlane;
use refdoc_core::transport::LocalTransport;
use rmcp::serve_server;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig,
    StreamableHttpService,
    session::local::LocalSessionManager,
};
use serde::Serialize;
use tracing::info;

use crate::RefdocMcp;

/// Configuration for the MCP streamable HTTP server.
#[derive(Debug, Clone)]
pub struct McpHttpServerConfig {
    pub addr: SocketAddr,
    pub stateful_mode: bool,
    pub sse_keep_alive: Option<Duration>,
    pub sse_retry: Option<Duration>,
}

impl McpHttpServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            stateful_mode: true,
            sse_keep_alive: Some(Duration::from_secs(15)),
            sse_retry: Some(Duration::from_secs(3)),
        }
    }

    #[must_use]
    pub const fn with_stateful_mode(mut self, stateful_mode: bool) -> Self {
        self.stateful_mode = stateful_mode;
        self
    }

    #[must_use]
    pub const fn with_sse_keep_alive(mut self, sse_keep_alive: Option<Duration>) -> Self {
        self.sse_keep_alive = sse_keep_alive;
        self
    }

    #[must_use]
    pub const fn with_sse_retry(mut self, sse_retry: Option<Duration>) -> Self {
        self.sse_retry = sse_retry;
        self
    }
}

impl Default for McpHttpServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 4030)))
    }
}

/// Serves the MCP server over stdio.
///
/// # Errors
/// Returns any transport or server error.
pub async fn serve_stdio(
    control: ReflectControlPlane<LocalTransport>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = RefdocMcp::new(control);
    info!("serving MCP over stdio");
    let (stdin, stdout) = stdio();
    let running = serve_server(service, (stdin, stdout)).await?;
    let _ = running.waiting().await?;
    Ok(())
}

/// Readiness report served on `/health` next to the MCP endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    /// `None` while no corpus index is loaded.
    pub indexed_classes: Option<usize>,
    pub pending_sessions: usize,
}

async fn service_status(
    State(control): State<ReflectControlPlane<LocalTransport>>,
) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "ok",
        indexed_classes: control.index().map(|index| index.class_count()),
        pending_sessions: control.sessions().len().await,
    })
}

/// Builds the HTTP app: the MCP service under `/mcp` and a status route.
#[must_use]
pub fn router(control: ReflectControlPlane<LocalTransport>, config: &McpHttpServerConfig) -> Router {
    let shared = control.clone();
    let mcp: StreamableHttpService<RefdocMcp, LocalSessionManager> = StreamableHttpService::new(
        move || Ok(RefdocMcp::new(shared.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            sse_keep_alive: config.sse_keep_alive,
            sse_retry: config.sse_retry,
            stateful_mode: config.stateful_mode,
            ..Default::default()
        },
    );

    Router::new()
        .route("/health", get(service_status))
        .with_state(control)
        .nest_service("/mcp", mcp)
}

/// Serves the MCP server using streamable HTTP transport.
///
/// # Errors
/// Returns any listener or server error.
pub async fn serve_streamable_http(
    control: ReflectControlPlane<LocalTransport>,
    config: McpHttpServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(control, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "serving MCP over streamable HTTP");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use refdoc_core::control::BotIdentity;
    use refdoc_core::index::SymbolIndex;
    use refdoc_core::transport::{ChannelId, MessageHandle, MessageId};
    use refdoc_store::models::ClassDescriptor;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn control() -> ReflectControlPlane<LocalTransport> {
        ReflectControlPlane::new(Arc::new(LocalTransport::new()), BotIdentity::new("7", "refdoc"))
    }

    fn class(fqn: &str) -> ClassDescriptor {
        ClassDescriptor {
            fqn: fqn.to_string(),
            name: fqn.to_string(),
            source_path: None,
            doc: None,
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    async fn status(app: Router) -> Value {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        serde_json::from_slice(&bytes).expect("status should be json")
    }

    #[test]
    fn default_config_binds_loopback() {
        let config = McpHttpServerConfig::default().with_stateful_mode(false);
        assert_eq!(config.addr, SocketAddr::from(([127, 0, 0, 1], 4030)));
        assert!(!config.stateful_mode);
        assert_eq!(config.sse_keep_alive, Some(Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn status_reports_a_missing_index() {
        let body = status(router(control(), &McpHttpServerConfig::default())).await;
        assert_eq!(body["status"], "ok");
        assert!(body["indexed_classes"].is_null());
        assert_eq!(body["pending_sessions"], 0);
    }

    #[tokio::test]
    async fn status_counts_classes_and_pending_selections() {
        let index = SymbolIndex::from_classes([class("HttpClient"), class("HttpRequest")])
            .expect("index should build");
        let control = control().with_index(Arc::new(index));
        let origin = MessageHandle::new(MessageId::new("m-1"), ChannelId::new("general"));
        control
            .reflect(&origin, &["Http"])
            .await
            .expect("reflect should prompt");

        let body = status(router(control, &McpHttpServerConfig::default())).await;
        assert_eq!(body["indexed_classes"], 2);
        assert_eq!(body["pending_sessions"], 1);
    }
}
