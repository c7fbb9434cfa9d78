//! MCP tool implementations.
//!
//! This module contains all tools exposed by the looproute server. Every
//! tool answers with pretty-printed JSON text content.

pub mod cache;
pub mod favorites;
pub mod loop_route;
pub mod tile_fetch;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
