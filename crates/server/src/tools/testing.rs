//! In-process fakes shared by the tool tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use looproute_client::api::FavoriteMetadata;
use looproute_client::{
    ApiError, FavoriteRoute, FetchError, HostScope, LoopRoute, LoopRouteRequest, NewFavorite, ResponseKind,
    RouteBackend, RoutePlanner, TileCacheWorker, TileRequest, TileResponse, Upstream,
};
use looproute_core::{CacheGeneration, TileStore};
use rmcp::model::CallToolResult;

use crate::state::AppState;

/// Answers every request with `200 tile {n}`, counting calls.
#[derive(Default)]
pub(crate) struct CountingUpstream {
    calls: AtomicUsize,
}

impl CountingUpstream {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for CountingUpstream {
    async fn fetch(&self, _request: &TileRequest) -> Result<TileResponse, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut response = TileResponse::network_error();
        response.kind = ResponseKind::Basic;
        response.status = 200;
        response.body = Bytes::from(format!("tile {n}"));
        Ok(response)
    }
}

/// Route backend that always returns the same loop and keeps saved favorites.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub favorites: Mutex<Vec<FavoriteRoute>>,
    pub fail_routes: Mutex<bool>,
}

pub(crate) fn sample_route() -> LoopRoute {
    LoopRoute {
        coordinates: vec![vec![126.978, 37.5665], vec![126.99, 37.58], vec![126.978, 37.5665]],
        distance_meters: Some(5120.0),
        duration_ms: Some(1_260_000.0),
        bbox: Some(vec![126.978, 37.5665, 126.99, 37.58]),
        ascend: Some(12.4),
        descend: Some(11.6),
    }
}

pub(crate) fn stored_favorite(id: &str, coordinates: Vec<Vec<f64>>) -> FavoriteRoute {
    FavoriteRoute {
        id: id.to_string(),
        name: format!("route {id}"),
        route_type: looproute_client::RouteType::Loop,
        start_point: String::new(),
        end_point: String::new(),
        distance_km: Some(7.5),
        duration_minutes: Some(25),
        metadata: FavoriteMetadata { coordinates, ..Default::default() },
        created_at: None,
        updated_at: None,
    }
}

#[async_trait]
impl RouteBackend for FakeBackend {
    async fn loop_route(&self, req: LoopRouteRequest) -> Result<LoopRoute, ApiError> {
        req.validate()?;
        if *self.fail_routes.lock().unwrap() {
            return Err(ApiError::Upstream { status: 502, message: "GraphHopper service unreachable".into() });
        }
        Ok(sample_route())
    }

    async fn save_favorite(&self, favorite: &NewFavorite) -> Result<FavoriteRoute, ApiError> {
        let mut favorites = self.favorites.lock().unwrap();
        let mut record = stored_favorite(&(favorites.len() + 100).to_string(), favorite.metadata.coordinates.clone());
        record.name = favorite.name.clone();
        favorites.insert(0, record.clone());
        Ok(record)
    }

    async fn delete_favorite(&self, id: &str) -> Result<(), ApiError> {
        let mut favorites = self.favorites.lock().unwrap();
        let before = favorites.len();
        favorites.retain(|f| f.id != id);
        if favorites.len() == before {
            return Err(ApiError::Upstream { status: 404, message: "Not found.".into() });
        }
        Ok(())
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteRoute>, ApiError> {
        Ok(self.favorites.lock().unwrap().clone())
    }
}

async fn build_state(backend: Arc<FakeBackend>) -> (AppState, Arc<CountingUpstream>) {
    let store = TileStore::open_in_memory().await.unwrap();
    let upstream = Arc::new(CountingUpstream::default());
    let scope = HostScope::new(["api.mapbox.com", "events.mapbox.com"], ".tiles.mapbox.com");
    let worker = TileCacheWorker::new(store, upstream.clone(), scope, CacheGeneration::current("mapbox-tiles"));
    worker.install().await;
    worker.activate().await.unwrap();

    let planner = RoutePlanner::new(backend, 30);
    (AppState::new(worker, upstream.clone(), planner), upstream)
}

/// Active worker over an in-memory store plus a planner on a fake backend.
pub(crate) async fn tile_state() -> (AppState, Arc<CountingUpstream>) {
    build_state(Arc::new(FakeBackend::default())).await
}

pub(crate) async fn planner_state(backend: Arc<FakeBackend>) -> AppState {
    build_state(backend).await.0
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output_json(result: CallToolResult) -> serde_json::Value {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .expect("tool result has text content");
    serde_json::from_str(&text).unwrap()
}
