//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use crate::state::AppState;
use crate::tools::cache;
use crate::tools::favorites::{self, FavoriteIdParams};
use crate::tools::loop_route::{self, LoopRouteParams};
use crate::tools::tile_fetch::{TileFetchParams, fetch_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for looproute.
#[derive(Clone)]
pub struct LoopRouteServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl LoopRouteServer {
    /// Create a new server handler over shared state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Fetch a URL through the tile cache worker. Map tile and map API GETs are answered from the monthly cache and refreshed in the background; other requests pass through."
    )]
    async fn tile_fetch(&self, params: Parameters<TileFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Activate the tile cache worker, deleting tile caches from previous months.")]
    async fn cache_activate(&self) -> Result<CallToolResult, McpError> {
        cache::activate_impl(&self.state.worker).await
    }

    #[tool(description = "Show worker state, the current cache generation, intercepted hosts, and per-cache entry counts.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        cache::status_impl(&self.state.worker).await
    }

    #[tool(
        description = "Generate a round-trip cycling route from a start point and ride duration. The route becomes the pending route for favorite_save."
    )]
    async fn loop_route_generate(&self, params: Parameters<LoopRouteParams>) -> Result<CallToolResult, McpError> {
        loop_route::generate_impl(&self.state.planner, params.0).await
    }

    #[tool(description = "Close the route detail panel and discard the pending route.")]
    async fn route_detail_close(&self) -> Result<CallToolResult, McpError> {
        loop_route::close_impl(&self.state.planner).await
    }

    #[tool(description = "Save the pending generated route as a favorite.")]
    async fn favorite_save(&self) -> Result<CallToolResult, McpError> {
        favorites::save_impl(&self.state.planner).await
    }

    #[tool(description = "Load the favorite routes list from the backend.")]
    async fn favorite_list(&self) -> Result<CallToolResult, McpError> {
        favorites::list_impl(&self.state.planner).await
    }

    #[tool(description = "Draw a favorite from the loaded list on the map and return its summary.")]
    async fn favorite_open(&self, params: Parameters<FavoriteIdParams>) -> Result<CallToolResult, McpError> {
        favorites::open_impl(&self.state.planner, params.0).await
    }

    #[tool(description = "Delete a favorite route.")]
    async fn favorite_delete(&self, params: Parameters<FavoriteIdParams>) -> Result<CallToolResult, McpError> {
        favorites::delete_impl(&self.state.planner, params.0).await
    }
}

impl ServerHandler for LoopRouteServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "looproute-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
