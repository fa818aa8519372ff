use std::sync::Arc;

use refdoc_core::control::{ReactionDispatch, ReflectOutcome};
use refdoc_core::transport::{
    ChannelId,
    MessageHandle,
    MessageId,
    NUMBER_MARKERS,
    OutboundMessage,
    ReactionAdded,
    UserId,
};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{RefdocMcp, helpers};

const DEFAULT_CHANNEL: &str = "mcp";
const DEFAULT_USER: &str = "mcp-client";

/// Parameters for running the reflect command.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReflectParams {
    /// Words following `reflect`, e.g. `methods App\Http\Client` or `Client::send`.
    pub args: String,
    /// Conversation the command is issued in. Defaults to `mcp`.
    pub channel: Option<String>,
}

/// Parameters for answering a selection prompt.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReactParams {
    /// Id of the prompt message returned by `reflect`.
    pub message_id: String,
    /// Keycap marker of the chosen option, or its number (`1` to `9`).
    pub marker: String,
    /// Who reacts. Defaults to `mcp-client`.
    pub user_id: Option<String>,
}

/// Outcome of a tool call plus the messages the bot posted for it.
#[derive(Debug, Clone, Serialize)]
pub struct ToolReply<O> {
    pub outcome: O,
    pub messages: Vec<OutboundMessage>,
}

fn split_args(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    args.trim().split(' ').collect()
}

fn normalize_marker(marker: &str) -> String {
    let trimmed = marker.trim();
    trimmed
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|position| NUMBER_MARKERS.get(position))
        .map_or_else(|| trimmed.to_string(), |marker| (*marker).to_string())
}

impl RefdocMcp {
    pub(crate) async fn run_reflect(
        &self,
        params: ReflectParams,
    ) -> Result<ToolReply<ReflectOutcome>, ErrorData> {
        let channel = ChannelId::new(params.channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string()));
        let origin = MessageHandle::new(MessageId::new(Uuid::new_v4().to_string()), channel);
        debug!(channel = %origin.channel, args = %params.args, "reflect tool call");

        let outbox = Arc::new(self.control().transport().request_scope());
        let outcome = self
            .control()
            .with_transport(outbox.clone())
            .reflect(&origin, &split_args(&params.args))
            .await
            .map_err(helpers::map_control_err)?;
        let messages = outbox.take_all().await;
        Ok(ToolReply { outcome, messages })
    }

    pub(crate) async fn run_react(
        &self,
        params: ReactParams,
    ) -> Result<ToolReply<ReactionDispatch>, ErrorData> {
        if params.message_id.trim().is_empty() {
            return Err(helpers::invalid_params("message_id is required"));
        }
        let event = ReactionAdded {
            message_id: MessageId::new(params.message_id.trim()),
            user_id: UserId::new(params.user_id.unwrap_or_else(|| DEFAULT_USER.to_string())),
            marker: normalize_marker(&params.marker),
        };

        let outbox = Arc::new(self.control().transport().request_scope());
        let outcome = self
            .control()
            .with_transport(outbox.clone())
            .handle_reaction(&event)
            .await
            .map_err(helpers::map_control_err)?;
        let messages = outbox.take_all().await;
        Ok(ToolReply { outcome, messages })
    }
}

#[tool_router(router = tool_router_reflect, vis = "pub")]
impl RefdocMcp {
    #[tool(description = "Run the reflect command. Returns the outcome and the messages posted in reply.")]
    async fn reflect(
        &self,
        Parameters(params): Parameters<ReflectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let reply = self.run_reflect(params).await?;
        Ok(CallToolResult::success(vec![Content::json(reply)?]))
    }

    #[tool(description = "Pick an option of a pending selection prompt by reacting with its marker.")]
    async fn react(
        &self,
        Parameters(params): Parameters<ReactParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let reply = self.run_react(params).await?;
        Ok(CallToolResult::success(vec![Content::json(reply)?]))
    }

    #[tool(description = "List selection prompts still waiting for a reaction.")]
    async fn list_pending_sessions(&self) -> Result<CallToolResult, ErrorData> {
        let pending = self.control().sessions().pending().await;
        Ok(CallToolResult::success(vec![Content::json(pending)?]))
    }
}
