//! HTTP event gateway for refdoc.
//!
//! A chat service adapter posts inbound messages and reaction events here and
//! gets back what the bot answered, so the adapter only has to relay them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use refdoc_core::control::{CommandOutcome, ControlError, ReactionDispatch, ReflectControlPlane};
use refdoc_core::transport::{InboundMessage, LocalTransport, OutboundMessage, ReactionAdded};
use serde::Serialize;
use tracing::{info, warn};

/// Configuration for the gateway HTTP server.
#[derive(Debug, Clone)]
pub struct GatewayServerConfig {
    pub addr: SocketAddr,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl GatewayServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            max_body_bytes: 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for GatewayServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 4031)))
    }
}

/// HTTP gateway server wrapper.
pub struct GatewayServer {
    config: GatewayServerConfig,
    state: AppState,
}

impl GatewayServer {
    #[must_use]
    pub const fn new(
        control: ReflectControlPlane<LocalTransport>,
        config: GatewayServerConfig,
    ) -> Self {
        let state = AppState {
            control,
            request_timeout: config.request_timeout,
        };
        Self { config, state }
    }

    /// Builds the router without binding a listener.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.config.max_body_bytes)
    }

    /// Runs the HTTP server until shutdown.
    ///
    /// # Errors
    /// Returns any listener or server error.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = build_router(self.state, self.config.max_body_bytes);

        info!("refdoc-gateway listening on {addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    control: ReflectControlPlane<LocalTransport>,
    request_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn timeout() -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            message: "event handling timed out".to_string(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Transport(err) => Self::bad_gateway(err.to_string()),
            ControlError::Session(err) => Self::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse { error: self.message });
        (self.status, payload).into_response()
    }
}

/// Outcome of an event plus the messages the bot posted for it.
#[derive(Debug, Serialize)]
struct EventReply<O> {
    outcome: O,
    messages: Vec<OutboundMessage>,
}

fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events/message", post(message_event))
        .route("/events/reaction", post(reaction_event))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn message_event(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Result<Json<EventReply<CommandOutcome>>, ApiError> {
    if message.id.as_str().trim().is_empty() {
        return Err(ApiError::bad_request("message id is required"));
    }
    if message.channel.as_str().trim().is_empty() {
        return Err(ApiError::bad_request("channel is required"));
    }

    let outbox = Arc::new(state.control.transport().request_scope());
    let control = state.control.with_transport(outbox.clone());
    let outcome = tokio::time::timeout(state.request_timeout, control.handle_message(&message))
        .await
        .map_err(|_| {
            warn!(channel = %message.channel, "message event timed out");
            ApiError::timeout()
        })??;
    let messages = outbox.take_all().await;

    Ok(Json(EventReply { outcome, messages }))
}

async fn reaction_event(
    State(state): State<AppState>,
    Json(event): Json<ReactionAdded>,
) -> Result<Json<EventReply<ReactionDispatch>>, ApiError> {
    if event.message_id.as_str().trim().is_empty() {
        return Err(ApiError::bad_request("message_id is required"));
    }

    let outbox = Arc::new(state.control.transport().request_scope());
    let control = state.control.with_transport(outbox.clone());
    let outcome = tokio::time::timeout(state.request_timeout, control.handle_reaction(&event))
        .await
        .map_err(|_| {
            warn!(message = %event.message_id, "reaction event timed out");
            ApiError::timeout()
        })??;
    let messages = outbox.take_all().await;

    Ok(Json(EventReply { outcome, messages }))
}
