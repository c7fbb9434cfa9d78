//! Client code for looproute.
//!
//! This crate provides the tile cache worker and its upstream fetcher, the
//! route-planning backend client, and the planner that keeps route page
//! state between calls. The server wires them together.

pub mod api;
pub mod fetch;
pub mod planner;
pub mod worker;

pub use api::{
    ApiConfig, ApiError, FavoriteMetadata, FavoriteRoute, LoopRoute, LoopRouteRequest, NewFavorite, RouteApiClient,
    RouteBackend, RouteType,
};
pub use fetch::{FetchError, HttpUpstream, ResponseKind, TileRequest, TileResponse, Upstream};
pub use planner::{GeneratedLoop, MapView, RouteDetail, RoutePlanner, RouteSummary};
pub use worker::{FetchOutcome, HostScope, ResponseSource, TileCacheWorker, WorkerState};
