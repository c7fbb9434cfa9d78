//! Headless map view holding the drawn route overlay and viewport fit.

use serde::Serialize;

/// Id of the single route overlay.
pub const ROUTE_OVERLAY_ID: &str = "generated-route";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// Axis-aligned bounds: south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub sw: LngLat,
    pub ne: LngLat,
}

impl Bounds {
    fn point(p: LngLat) -> Self {
        Self { sw: p, ne: p }
    }

    fn extend(&mut self, p: LngLat) {
        self.sw.lng = self.sw.lng.min(p.lng);
        self.sw.lat = self.sw.lat.min(p.lat);
        self.ne.lng = self.ne.lng.max(p.lng);
        self.ne.lat = self.ne.lat.max(p.lat);
    }

    /// Bounds of every `[lng, lat, ..]` coordinate; shorter entries are skipped.
    pub fn of(coordinates: &[Vec<f64>]) -> Option<Self> {
        coordinates
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| LngLat { lng: c[0], lat: c[1] })
            .fold(None, |acc: Option<Bounds>, p| match acc {
                None => Some(Bounds::point(p)),
                Some(mut b) => {
                    b.extend(p);
                    Some(b)
                }
            })
    }
}

/// Viewport fit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitOptions {
    pub padding: u32,
    pub max_zoom: f64,
    pub duration_ms: u32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { padding: 48, max_zoom: 15.0, duration_ms: 800 }
    }
}

/// Line overlay style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f64,
    pub opacity: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self { color: "#2563eb", width: 4.0, opacity: 0.85 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineOverlay {
    pub id: &'static str,
    pub coordinates: Vec<Vec<f64>>,
    pub style: LineStyle,
}

/// Viewport target after fitting a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub bounds: Bounds,
    pub options: FitOptions,
}

/// At most one route overlay plus the last viewport fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapView {
    overlay: Option<LineOverlay>,
    viewport: Option<Viewport>,
}

impl MapView {
    /// Replace the route overlay and fit the viewport to it.
    ///
    /// When no coordinate is usable the overlay is still replaced but the
    /// viewport is left where it was.
    pub fn draw_route(&mut self, coordinates: &[Vec<f64>]) {
        self.overlay =
            Some(LineOverlay { id: ROUTE_OVERLAY_ID, coordinates: coordinates.to_vec(), style: LineStyle::default() });

        if let Some(bounds) = Bounds::of(coordinates) {
            self.viewport = Some(Viewport { bounds, options: FitOptions::default() });
        }
    }

    pub fn overlay(&self) -> Option<&LineOverlay> {
        self.overlay.as_ref()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }
}
