//! Route backend response types and error-message extraction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generated loop route as returned by the route endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopRoute {
    /// `[lng, lat]` or `[lng, lat, elevation]` points.
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
    #[serde(default)]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub ascend: Option<f64>,
    #[serde(default)]
    pub descend: Option<f64>,
}

impl LoopRoute {
    /// Distance in kilometres rounded to two decimals.
    pub fn distance_km(&self) -> Option<f64> {
        self.distance_meters
            .filter(|m| m.is_finite())
            .map(|m| (m / 1000.0 * 100.0).round() / 100.0)
    }

    /// Duration in whole minutes (at least 1), or None when the backend
    /// reported no duration.
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_ms
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .map(|ms| (ms / 60_000.0).round().max(1.0) as u32)
    }
}

/// Pick the user-facing message out of an error body.
///
/// Uses `detail`, then `error`, then `fallback`. Null, `false`, zero and
/// empty strings count as absent; other non-string values are rendered as
/// JSON.
pub fn error_message(body: Option<&Value>, fallback: &str) -> String {
    let pick = |key: &str| {
        body.and_then(|b| b.get(key)).and_then(|v| match v {
            Value::Null | Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    };

    pick("detail")
        .or_else(|| pick("error"))
        .unwrap_or_else(|| fallback.to_string())
}
