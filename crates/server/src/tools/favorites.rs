//! Favorite route tools: save, list, open, delete.

use looproute_client::{FavoriteRoute, RoutePlanner, RouteSummary, planner::Viewport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters naming one favorite.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FavoriteIdParams {
    /// Favorite id as listed by favorite_list.
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteSaveOutput {
    pub favorite: FavoriteRoute,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteListOutput {
    pub count: usize,
    pub favorites: Vec<FavoriteRoute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteOpenOutput {
    pub id: String,
    pub summary: RouteSummary,
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FavoriteDeleteOutput {
    pub deleted: String,
    /// Favorites left in the local list.
    pub remaining: usize,
}

/// Implementation of the favorite_save tool.
pub async fn save_impl(planner: &RoutePlanner) -> Result<CallToolResult, McpError> {
    let favorite = planner.save_pending().await?;
    json_result(&FavoriteSaveOutput { favorite })
}

/// Implementation of the favorite_list tool.
pub async fn list_impl(planner: &RoutePlanner) -> Result<CallToolResult, McpError> {
    let favorites = planner.load_favorites().await?;
    json_result(&FavoriteListOutput { count: favorites.len(), favorites })
}

/// Implementation of the favorite_open tool.
///
/// Looks the id up in the list loaded by favorite_list.
pub async fn open_impl(planner: &RoutePlanner, params: FavoriteIdParams) -> Result<CallToolResult, McpError> {
    let summary = planner.open_favorite(&params.id).await?;
    let viewport = planner.map().await.viewport().copied();
    json_result(&FavoriteOpenOutput { id: params.id.trim().to_string(), summary, viewport })
}

/// Implementation of the favorite_delete tool.
pub async fn delete_impl(planner: &RoutePlanner, params: FavoriteIdParams) -> Result<CallToolResult, McpError> {
    planner.delete_favorite(&params.id).await?;
    let remaining = planner.favorites().await.len();
    json_result(&FavoriteDeleteOutput { deleted: params.id.trim().to_string(), remaining })
}
