//! MCP server implementation for refdoc.
//!
//! This crate exposes the reflect command and the selection flow as rmcp
//! tools. Tool calls run against the in-process transport and return the
//! messages the bot would have posted.

mod helpers;
mod tools;
pub mod server;

use refdoc_core::control::ReflectControlPlane;
use refdoc_core::transport::LocalTransport;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

pub use tools::{ReactParams, ReflectParams, ToolReply};

const SERVER_INSTRUCTIONS: &str = r"refdoc answers documentation questions about a reflected code corpus.

Workflow:
1. Call `reflect` with the words you would type after `reflect` in chat:
   - `methods <class_name>` lists the public methods of a class.
   - `properties <class_name>` (or just `<class_name>`) lists documented properties.
   - `<Class::method>` shows parameters, return value and thrown types of a method.
   Matching is a case-sensitive substring match on fully-qualified names. Only a
   query containing `::` searches methods.
2. When several symbols match, the reply is a numbered prompt and the outcome is
   `awaiting_selection`. Call `react` with the prompt `message_id` and the marker of
   the option you want (`1️⃣` through `9️⃣`, or simply the option number).
3. `list_pending_sessions` shows prompts still waiting for a selection.

Notes:
- More than 9 matches answers `too_many_results`; narrow the query.
- `health` returns `ok`. `help` lists the tools.";

/// MCP server wrapper around the reflect control plane.
#[derive(Clone)]
pub struct RefdocMcp {
    tool_router: ToolRouter<Self>,
    control: ReflectControlPlane<LocalTransport>,
}

impl RefdocMcp {
    /// Creates a new server over a shared control plane.
    #[must_use]
    pub fn new(control: ReflectControlPlane<LocalTransport>) -> Self {
        let tool_router =
            Self::tool_router_core() + Self::tool_router_reflect() + Self::tool_router_context();
        Self {
            tool_router,
            control,
        }
    }

    #[must_use]
    pub const fn control(&self) -> &ReflectControlPlane<LocalTransport> {
        &self.control
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl RefdocMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl ServerHandler for RefdocMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
