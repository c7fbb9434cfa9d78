//! cache_status tool implementation.

use chrono::Utc;
use looproute_client::TileCacheWorker;
use looproute_core::CacheSummary;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    pub state: String,
    pub generation: String,
    pub allowed_hosts: Vec<String>,
    pub tile_host_suffix: String,
    /// Every cache in the store with its entry count.
    pub caches: Vec<CacheSummary>,
    pub checked_at: String,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(worker: &TileCacheWorker) -> Result<CallToolResult, McpError> {
    let caches = worker.store().cache_summaries().await?;

    let output = CacheStatusOutput {
        state: worker.state().await.as_str().to_string(),
        generation: worker.generation().name(),
        allowed_hosts: worker.scope().hosts(),
        tile_host_suffix: worker.scope().suffix().to_string(),
        caches,
        checked_at: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    };

    json_result(&output)
}
