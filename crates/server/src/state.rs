//! Shared state behind every tool call.

use std::sync::Arc;

use looproute_client::{RoutePlanner, TileCacheWorker, Upstream};

/// The worker, its pass-through upstream, and the route planner.
pub struct AppState {
    pub worker: TileCacheWorker,
    /// Used for requests the worker declines to intercept.
    pub upstream: Arc<dyn Upstream>,
    pub planner: RoutePlanner,
}

impl AppState {
    pub fn new(worker: TileCacheWorker, upstream: Arc<dyn Upstream>, planner: RoutePlanner) -> Self {
        Self { worker, upstream, planner }
    }
}
