//! Loop route planner.
//!
//! Holds the state the route page keeps between user actions: the pending
//! (generated, unsaved) route, the route detail panel, the favorites list and
//! the map overlay. All backend calls go through [`RouteBackend`].

pub mod map_view;
pub mod summary;

pub use map_view::{Bounds, FitOptions, LineOverlay, LngLat, MapView, ROUTE_OVERLAY_ID, Viewport};
pub use summary::{RouteSummary, format_distance_km, format_duration_minutes, format_elevation};

use std::sync::Arc;

use looproute_core::Error;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::api::{FavoriteMetadata, FavoriteRoute, LoopRouteRequest, NewFavorite, RouteBackend, RouteType};

/// Name used when the start label is blank.
pub const DEFAULT_ROUTE_NAME: &str = "Loop route";

/// What the detail panel is showing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDetail {
    pub summary: RouteSummary,
    /// Set when the detail shows a stored favorite rather than a fresh route.
    pub favorite_id: Option<String>,
}

/// A freshly generated loop, ready to be saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedLoop {
    pub favorite: NewFavorite,
    pub summary: RouteSummary,
    pub minutes_requested: u32,
}

#[derive(Debug, Default)]
struct PlannerState {
    pending: Option<NewFavorite>,
    detail: Option<RouteDetail>,
    favorites: Vec<FavoriteRoute>,
    map: MapView,
}

pub struct RoutePlanner {
    backend: Arc<dyn RouteBackend>,
    default_minutes: u32,
    state: Mutex<PlannerState>,
}

impl RoutePlanner {
    pub fn new(backend: Arc<dyn RouteBackend>, default_minutes: u32) -> Self {
        Self { backend, default_minutes: default_minutes.max(1), state: Mutex::new(PlannerState::default()) }
    }

    fn resolve_minutes(&self, minutes: Option<u32>) -> u32 {
        minutes.filter(|m| *m > 0).unwrap_or(self.default_minutes).max(1)
    }

    /// Request a loop around `(lat, lon)`, draw it and hold it as pending.
    ///
    /// The pending slot and detail are cleared before the request and stay
    /// empty if it fails.
    pub async fn generate_loop(
        &self, lat: f64, lon: f64, minutes: Option<u32>, start_label: Option<&str>,
    ) -> Result<GeneratedLoop, Error> {
        let minutes = self.resolve_minutes(minutes);

        {
            let mut state = self.state.lock().await;
            state.pending = None;
            state.detail = None;
        }

        let route = self
            .backend
            .loop_route(LoopRouteRequest { lat, lon, minutes })
            .await?;

        let raw_label = start_label.unwrap_or_default();
        let label = raw_label.trim();
        let name = if label.is_empty() { DEFAULT_ROUTE_NAME } else { label };
        let duration_minutes = route.duration_minutes().unwrap_or(minutes);

        let favorite = NewFavorite {
            name: name.to_string(),
            route_type: RouteType::Loop,
            start_point: raw_label.to_string(),
            end_point: raw_label.to_string(),
            distance_km: route.distance_km(),
            duration_minutes: Some(duration_minutes),
            metadata: FavoriteMetadata::from(&route),
        };
        let summary = RouteSummary::for_loop(name, &route, duration_minutes);

        let mut state = self.state.lock().await;
        state.map.draw_route(&route.coordinates);
        state.pending = Some(favorite.clone());
        state.detail = Some(RouteDetail { summary: summary.clone(), favorite_id: None });

        tracing::info!(
            points = route.coordinates.len(),
            distance_km = ?favorite.distance_km,
            duration_minutes,
            "generated loop route"
        );

        Ok(GeneratedLoop { favorite, summary, minutes_requested: minutes })
    }

    /// Save the pending route as a favorite.
    ///
    /// # Errors
    ///
    /// `Error::NoPendingRoute` without touching the network when nothing is
    /// pending. On a backend failure the pending route is kept for a retry.
    pub async fn save_pending(&self) -> Result<FavoriteRoute, Error> {
        let pending = self
            .state
            .lock()
            .await
            .pending
            .clone()
            .ok_or(Error::NoPendingRoute)?;

        let saved = self.backend.save_favorite(&pending).await?;

        let mut state = self.state.lock().await;
        if state.pending.as_ref() == Some(&pending) {
            state.pending = None;
        }
        state.favorites.retain(|f| f.id != saved.id);
        state.favorites.insert(0, saved.clone());

        tracing::info!(id = %saved.id, name = %saved.name, "saved favorite route");
        Ok(saved)
    }

    /// Close the detail panel, discarding any pending route.
    pub async fn close_detail(&self) {
        let mut state = self.state.lock().await;
        state.pending = None;
        state.detail = None;
    }

    /// Replace the local favorites list with the backend's.
    pub async fn load_favorites(&self) -> Result<Vec<FavoriteRoute>, Error> {
        let favorites = self.backend.list_favorites().await?;
        self.state.lock().await.favorites = favorites.clone();
        tracing::debug!(count = favorites.len(), "loaded favorites");
        Ok(favorites)
    }

    /// Draw a stored favorite and show its summary.
    pub async fn open_favorite(&self, id: &str) -> Result<RouteSummary, Error> {
        let id = id.trim();
        let mut state = self.state.lock().await;

        let favorite = state
            .favorites
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| Error::FavoriteNotFound(id.to_string()))?;

        if !favorite.has_coordinates() {
            return Err(Error::MissingCoordinates(format!(
                "favorite {id} has no stored coordinates to draw"
            )));
        }

        let summary = RouteSummary::for_favorite(&favorite);
        state.map.draw_route(&favorite.metadata.coordinates);
        state.detail = Some(RouteDetail { summary: summary.clone(), favorite_id: Some(favorite.id) });
        state.pending = None;

        Ok(summary)
    }

    /// Delete a favorite on the backend, then drop it locally.
    pub async fn delete_favorite(&self, id: &str) -> Result<(), Error> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("favorite id must not be empty".into()));
        }

        self.backend.delete_favorite(id).await?;

        let mut state = self.state.lock().await;
        state.favorites.retain(|f| f.id != id);
        if state
            .detail
            .as_ref()
            .is_some_and(|d| d.favorite_id.as_deref() == Some(id))
        {
            state.detail = None;
        }

        tracing::info!(id, "deleted favorite route");
        Ok(())
    }

    pub async fn pending(&self) -> Option<NewFavorite> {
        self.state.lock().await.pending.clone()
    }

    pub async fn detail(&self) -> Option<RouteDetail> {
        self.state.lock().await.detail.clone()
    }

    pub async fn favorites(&self) -> Vec<FavoriteRoute> {
        self.state.lock().await.favorites.clone()
    }

    pub async fn map(&self) -> MapView {
        self.state.lock().await.map.clone()
    }

    pub fn default_minutes(&self) -> u32 {
        self.default_minutes
    }
}
