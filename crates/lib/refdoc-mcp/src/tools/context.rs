use refdoc_core::control::usage_text;
use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::RefdocMcp;

/// Payload listing the MCP commands and the chat usage of `reflect`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
    pub reflect_usage: String,
}

impl HelpCommands {
    fn for_server(server: &RefdocMcp) -> Self {
        Self {
            commands: vec![
                "help - List MCP commands and the reflect usage.".to_string(),
                "health - Returns 'ok'.".to_string(),
                "reflect - Run the reflect command with the words following `reflect`."
                    .to_string(),
                "react - Pick an option of a selection prompt by marker or number."
                    .to_string(),
                "list_pending_sessions - List selection prompts still waiting for a reaction."
                    .to_string(),
            ],
            reflect_usage: usage_text(server.control().identity()),
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl RefdocMcp {
    #[tool(description = "List the MCP commands and how the reflect command is used.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::for_server(self))?]))
    }
}
