//! MCP tool modules.
//!
//! Tools are grouped by domain: the reflect command with its selection flow,
//! and contextual help.

pub mod reflect;
mod context;

pub use reflect::{ReactParams, ReflectParams, ToolReply};
