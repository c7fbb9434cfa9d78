//! loop_route_generate and route_detail_close tool implementations.

use looproute_client::{GeneratedLoop, RoutePlanner, planner::Viewport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for loop_route_generate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoopRouteParams {
    /// Latitude of the start point, -90..=90.
    pub lat: f64,

    /// Longitude of the start point, -180..=180.
    pub lon: f64,

    /// Ride duration in minutes (default from configuration, usually 30).
    #[serde(default)]
    pub minutes: Option<u32>,

    /// Start label; also used as the route name.
    #[serde(default)]
    pub start_label: Option<String>,
}

/// Output structure for loop_route_generate tool.
#[derive(Debug, Clone, Serialize)]
pub struct LoopRouteOutput {
    #[serde(flatten)]
    pub route: GeneratedLoop,
    /// Viewport the map was fitted to.
    pub viewport: Option<Viewport>,
    pub points: usize,
}

/// Output structure for route_detail_close tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RouteDetailCloseOutput {
    pub closed: bool,
}

/// Implementation of the loop_route_generate tool.
pub async fn generate_impl(planner: &RoutePlanner, params: LoopRouteParams) -> Result<CallToolResult, McpError> {
    let route = planner
        .generate_loop(params.lat, params.lon, params.minutes, params.start_label.as_deref())
        .await?;

    let map = planner.map().await;
    let output = LoopRouteOutput {
        points: route.favorite.metadata.coordinates.len(),
        viewport: map.viewport().copied(),
        route,
    };

    json_result(&output)
}

/// Implementation of the route_detail_close tool.
pub async fn close_impl(planner: &RoutePlanner) -> Result<CallToolResult, McpError> {
    planner.close_detail().await;
    json_result(&RouteDetailCloseOutput { closed: true })
}
