//! Route detail summary shown after a route is drawn.

use serde::Serialize;

use crate::api::{FavoriteRoute, LoopRoute};

/// Display strings for the route detail panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub name: String,
    pub distance: String,
    pub duration: String,
    pub ascend: String,
    pub descend: String,
    pub meta: String,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// `"12.35 km"` from a distance in metres.
pub fn format_distance_km(meters: Option<f64>) -> String {
    match finite(meters) {
        Some(m) => format!("{:.2} km", m / 1000.0),
        None => "-- km".to_string(),
    }
}

pub fn format_duration_minutes(minutes: Option<u32>) -> String {
    match minutes {
        Some(n) => format!("{n} min"),
        None => "-- min".to_string(),
    }
}

/// Elevation gain or loss rounded to whole metres.
pub fn format_elevation(meters: Option<f64>) -> String {
    match finite(meters) {
        // Adding zero folds -0 into 0.
        Some(m) => format!("{} m", m.round() + 0.0),
        None => "-- m".to_string(),
    }
}

impl RouteSummary {
    /// Summary for a freshly generated loop.
    pub fn for_loop(name: &str, route: &LoopRoute, duration_minutes: u32) -> Self {
        let km = route
            .distance_km()
            .map_or_else(|| "--".to_string(), |km| km.to_string());

        Self {
            name: name.to_string(),
            distance: format_distance_km(route.distance_meters),
            duration: format_duration_minutes(Some(duration_minutes)),
            ascend: format_elevation(route.ascend),
            descend: format_elevation(route.descend),
            meta: format!("{km} km · about {duration_minutes} min"),
        }
    }

    /// Summary for a stored favorite. Zero values display as absent.
    pub fn for_favorite(favorite: &FavoriteRoute) -> Self {
        let nonzero = |v: Option<f64>| v.filter(|v| *v != 0.0);

        let distance = match finite(nonzero(favorite.distance_km)) {
            Some(km) => format!("{km:.2} km"),
            None => "-- km".to_string(),
        };
        let meta = if favorite.metadata.bbox.is_some() {
            "Saved route loaded."
        } else {
            "Check the saved route details."
        };

        Self {
            name: favorite.name.clone(),
            distance,
            duration: format_duration_minutes(favorite.duration_minutes.filter(|m| *m != 0)),
            ascend: format_elevation(nonzero(favorite.metadata.ascend)),
            descend: format_elevation(nonzero(favorite.metadata.descend)),
            meta: meta.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FavoriteMetadata, RouteType};

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance_km(Some(12345.678)), "12.35 km");
        assert_eq!(format_distance_km(Some(0.0)), "0.00 km");
        assert_eq!(format_distance_km(None), "-- km");
        assert_eq!(format_distance_km(Some(f64::NAN)), "-- km");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_minutes(Some(45)), "45 min");
        assert_eq!(format_duration_minutes(None), "-- min");
    }

    #[test]
    fn test_format_elevation() {
        assert_eq!(format_elevation(Some(84.6)), "85 m");
        assert_eq!(format_elevation(Some(-3.2)), "-3 m");
        assert_eq!(format_elevation(Some(-0.3)), "0 m");
        assert_eq!(format_elevation(None), "-- m");
        assert_eq!(format_elevation(Some(f64::INFINITY)), "-- m");
    }

    #[test]
    fn test_loop_summary() {
        let route = LoopRoute {
            coordinates: vec![vec![126.9, 37.5]],
            distance_meters: Some(5120.0),
            ascend: Some(12.4),
            ..Default::default()
        };
        let summary = RouteSummary::for_loop("Yeouido", &route, 21);

        assert_eq!(summary.name, "Yeouido");
        assert_eq!(summary.distance, "5.12 km");
        assert_eq!(summary.duration, "21 min");
        assert_eq!(summary.ascend, "12 m");
        assert_eq!(summary.descend, "-- m");
        assert_eq!(summary.meta, "5.12 km · about 21 min");
    }

    #[test]
    fn test_loop_summary_without_distance() {
        let summary = RouteSummary::for_loop("Loop route", &LoopRoute::default(), 30);
        assert_eq!(summary.distance, "-- km");
        assert_eq!(summary.meta, "-- km · about 30 min");
    }

    #[test]
    fn test_favorite_summary() {
        let favorite = FavoriteRoute {
            id: "4".into(),
            name: "Han river loop".into(),
            route_type: RouteType::Loop,
            start_point: String::new(),
            end_point: String::new(),
            distance_km: Some(12.3),
            duration_minutes: Some(0),
            metadata: FavoriteMetadata {
                bbox: Some(vec![126.9, 37.5, 127.0, 37.6]),
                ascend: Some(0.0),
                descend: Some(40.5),
                coordinates: vec![vec![126.9, 37.5]],
            },
            created_at: None,
            updated_at: None,
        };
        let summary = RouteSummary::for_favorite(&favorite);

        assert_eq!(summary.distance, "12.30 km");
        assert_eq!(summary.duration, "-- min");
        assert_eq!(summary.ascend, "-- m");
        assert_eq!(summary.descend, "41 m");
        assert_eq!(summary.meta, "Saved route loaded.");
    }
}
