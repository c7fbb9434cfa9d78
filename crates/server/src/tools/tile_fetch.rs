//! tile_fetch tool implementation.
//!
//! Offers a request to the tile cache worker. Requests it does not intercept
//! are fetched straight from the upstream without touching the cache.

use std::collections::BTreeMap;

use looproute_client::{FetchOutcome, ResponseKind, TileRequest, TileResponse, Upstream};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;
use crate::state::AppState;

/// Input parameters for tile_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TileFetchParams {
    /// Absolute http(s) URL to request.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are cached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Include the body as text when it is valid UTF-8.
    #[serde(default)]
    pub include_body: bool,

    /// Wait for any background refresh to finish before answering.
    #[serde(default)]
    pub wait_for_revalidation: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for tile_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TileFetchOutput {
    pub url: String,
    pub method: String,
    /// `cache`, `network`, `network_error`, or `passthrough`.
    pub source: String,
    /// Cache generation consulted, when the worker intercepted the request.
    pub cache_name: Option<String>,
    /// HTTP status; 0 for a network error.
    pub status: u16,
    /// `basic` or `error`.
    pub kind: String,
    pub content_type: Option<String>,
    pub bytes: usize,
    pub body_sha256: String,
    pub body: Option<String>,
}

impl TileFetchOutput {
    fn new(request: &TileRequest, response: &TileResponse, source: &str, cache_name: Option<String>) -> Self {
        Self {
            url: request.url.to_string(),
            method: request.method.to_string(),
            source: source.to_string(),
            cache_name,
            status: response.status,
            kind: match response.kind {
                ResponseKind::Basic => "basic".into(),
                ResponseKind::Error => "error".into(),
            },
            content_type: response.content_type().map(str::to_string),
            bytes: response.body.len(),
            body_sha256: response.body_sha256(),
            body: None,
        }
    }
}

async fn pass_through(upstream: &dyn Upstream, request: &TileRequest) -> TileResponse {
    match upstream.fetch(request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "pass-through fetch failed");
            TileResponse::network_error()
        }
    }
}

/// Implementation of the tile_fetch tool.
pub async fn fetch_impl(state: &AppState, params: TileFetchParams) -> Result<CallToolResult, McpError> {
    let headers: Vec<(String, String)> = params.headers.into_iter().collect();
    let request = TileRequest::from_parts(&params.method, &params.url, &headers).map_err(ToolError::from)?;
    let shown = request.clone();

    let (mut output, response) = match state.worker.handle_fetch(request).await? {
        FetchOutcome::Responded { response, source } => {
            let cache_name = Some(state.worker.generation().name());
            (TileFetchOutput::new(&shown, &response, source.as_str(), cache_name), response)
        }
        FetchOutcome::PassThrough(request) => {
            let response = pass_through(state.upstream.as_ref(), &request).await;
            (TileFetchOutput::new(&request, &response, "passthrough", None), response)
        }
    };

    if params.include_body {
        output.body = std::str::from_utf8(&response.body).ok().map(str::to_string);
    }

    if params.wait_for_revalidation {
        state.worker.settle().await;
    }

    json_result(&output)
}
