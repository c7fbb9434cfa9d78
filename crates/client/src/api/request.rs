//! Loop route request parameters and validation.

use serde::Serialize;

use super::ApiError;

/// Round-trip route request around an origin point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRouteRequest {
    pub lat: f64,
    pub lon: f64,
    /// Target ride duration in minutes (at least 1).
    pub minutes: u32,
}

/// Query string sent to the route endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct LoopRouteQuery {
    lat: String,
    lon: String,
    minutes: u32,
    points_encoded: &'static str,
}

impl LoopRouteRequest {
    /// Validate the request parameters.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(ApiError::InvalidRequest(format!("latitude out of range: {}", self.lat)));
        }

        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(ApiError::InvalidRequest(format!("longitude out of range: {}", self.lon)));
        }

        if self.minutes < 1 {
            return Err(ApiError::InvalidRequest("minutes must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Query parameters, always asking for decoded coordinates.
    pub(crate) fn query(&self) -> LoopRouteQuery {
        LoopRouteQuery {
            lat: self.lat.to_string(),
            lon: self.lon.to_string(),
            minutes: self.minutes,
            points_encoded: "false",
        }
    }
}
