//! cache_activate tool implementation.
//!
//! Runs worker activation: stale generations are deleted before the worker
//! starts intercepting. Safe to call again on an active worker.

use looproute_client::TileCacheWorker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheActivateOutput {
    /// Cache generation now in use.
    pub generation: String,
    pub state: String,
    /// Caches deleted by this activation.
    pub pruned: Vec<String>,
}

/// Implementation of the cache_activate tool.
pub async fn activate_impl(worker: &TileCacheWorker) -> Result<CallToolResult, McpError> {
    let pruned = worker.activate().await?;

    let output = CacheActivateOutput {
        generation: worker.generation().name(),
        state: worker.state().await.as_str().to_string(),
        pruned,
    };

    json_result(&output)
}
