//! Favorite route records exchanged with the backend.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::LoopRoute;

/// Kind of planner that produced a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Loop,
    Directions,
}

/// Geometry and elevation detail stored alongside a favorite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoriteMetadata {
    pub bbox: Option<Vec<f64>>,
    pub ascend: Option<f64>,
    pub descend: Option<f64>,
    pub coordinates: Vec<Vec<f64>>,
}

impl From<&LoopRoute> for FavoriteMetadata {
    fn from(route: &LoopRoute) -> Self {
        Self {
            bbox: route.bbox.clone(),
            ascend: route.ascend,
            descend: route.descend,
            coordinates: route.coordinates.clone(),
        }
    }
}

/// A favorite that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFavorite {
    pub name: String,
    pub route_type: RouteType,
    pub start_point: String,
    pub end_point: String,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub metadata: FavoriteMetadata,
}

/// A stored favorite as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRoute {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub route_type: RouteType,
    #[serde(default)]
    pub start_point: String,
    #[serde(default)]
    pub end_point: String,
    #[serde(default, deserialize_with = "decimal_or_null")]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default, deserialize_with = "metadata_or_null")]
    pub metadata: FavoriteMetadata,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl FavoriteRoute {
    /// True when the stored geometry can be drawn.
    pub fn has_coordinates(&self) -> bool {
        !self.metadata.coordinates.is_empty()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected string or number id, got {other}"))),
    }
}

/// Decimal fields arrive as `"12.35"`, `12.35`, or null.
fn decimal_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid decimal: {s}"))),
        other => Err(de::Error::custom(format!("expected decimal, got {other}"))),
    }
}

fn metadata_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FavoriteMetadata, D::Error> {
    Ok(Option::<FavoriteMetadata>::deserialize(deserializer)?.unwrap_or_default())
}
