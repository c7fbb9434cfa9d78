//! looproute-mcp server entry point.
//!
//! Boots the tile cache worker and the route planner, then serves MCP on
//! stdio transport. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use looproute_client::{HostScope, HttpUpstream, RouteApiClient, RoutePlanner, TileCacheWorker, Upstream};
use looproute_core::{AppConfig, CacheGeneration, TileStore};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        db = %config.db_path.display(),
        api = %config.api_base_url,
        "Starting looproute-mcp server on stdio transport"
    );

    let store = TileStore::open(&config.db_path).await?;
    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(&config.user_agent)?);
    let worker = TileCacheWorker::new(
        store,
        upstream.clone(),
        HostScope::from_config(&config),
        CacheGeneration::current(&config.cache_prefix),
    );
    worker.install().await;
    worker.activate().await?;

    let backend = Arc::new(RouteApiClient::from_config(&config)?);
    let planner = RoutePlanner::new(backend, config.default_minutes);

    let state = Arc::new(state::AppState::new(worker, upstream, planner));
    let handler = handler::LoopRouteServer::new(state.clone());
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    state.worker.settle().await;

    Ok(())
}
