use std::str::FromStr;

use crate::aggregate::{severity, Severity};
use crate::config::*;

/// The metric that drives the size of the markers.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Metric {
    Farmers,
    Acres,
    Awareness,
    Definite,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Farmers => "farmers",
            Metric::Acres => "acres",
            Metric::Awareness => "awareness",
            Metric::Definite => "definite",
        }
    }
}

impl FromStr for Metric {
    type Err = ConfigErrors;

    fn from_str(s: &str) -> Result<Metric, ConfigErrors> {
        match s {
            "farmers" => Ok(Metric::Farmers),
            "acres" => Ok(Metric::Acres),
            "awareness" => Ok(Metric::Awareness),
            "definite" => Ok(Metric::Definite),
            x => Err(ConfigErrors::InvalidOption {
                name: "metric".to_string(),
                value: x.to_string(),
            }),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct MarkerData {
    pub lat: f64,
    pub lng: f64,
    pub severity: Severity,
    pub radius_base: f64,
    pub radius: f64,
    pub label: String,
    pub city: String,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

const MIN_RADIUS: f64 = 5.0;
const MAX_RADIUS: f64 = 25.0;
const RADIUS_SCALE: f64 = 0.4;
// Used for rate metrics when the rate is missing (or zero).
const DEFAULT_RATE_BASE: f64 = 5.0;
const EARTH_RADIUS_KM: f64 = 6371.0;

/// The value that scales a marker for the selected metric.
pub fn radius_base(session: &Session, metric: Metric) -> f64 {
    let rate_base = |r: Option<f64>| match r {
        Some(x) if x > 0.0 => x,
        _ => DEFAULT_RATE_BASE,
    };
    match metric {
        Metric::Farmers => session.total_farmers.max(0.0).sqrt(),
        Metric::Acres => session.total_acres.max(0.0).sqrt(),
        Metric::Awareness => rate_base(session.awareness_rate),
        Metric::Definite => rate_base(session.definite_rate),
    }
}

pub fn marker_radius(base: f64) -> f64 {
    (MIN_RADIUS + base * RADIUS_SCALE).min(MAX_RADIUS)
}

/// The markers of the sessions that have coordinates.
///
/// Markers are colored by awareness rate.
pub fn map_markers(sessions: &[Session], metric: Metric) -> Vec<MarkerData> {
    sessions
        .iter()
        .filter_map(|s| {
            let c = s.coords?;
            let base = radius_base(s, metric);
            Some(MarkerData {
                lat: c.lat,
                lng: c.lng,
                severity: severity(s.awareness_rate),
                radius_base: base,
                radius: marker_radius(base),
                label: if s.location.is_empty() {
                    "Session".to_string()
                } else {
                    s.location.clone()
                },
                city: if s.city.is_empty() {
                    "Unknown".to_string()
                } else {
                    s.city.clone()
                },
            })
        })
        .collect()
}

/// The box enclosing all the sessions with coordinates, for fitting the map view.
pub fn bounds(sessions: &[Session]) -> Option<Bounds> {
    sessions
        .iter()
        .filter_map(|s| s.coords)
        .fold(None, |acc: Option<Bounds>, c| {
            Some(match acc {
                None => Bounds {
                    south: c.lat,
                    west: c.lng,
                    north: c.lat,
                    east: c.lng,
                },
                Some(b) => Bounds {
                    south: b.south.min(c.lat),
                    west: b.west.min(c.lng),
                    north: b.north.max(c.lat),
                    east: b.east.max(c.lng),
                },
            })
        })
}

/// The coordinates of the sessions, in order, skipping the ones without coordinates.
pub fn route(sessions: &[Session]) -> Vec<LatLng> {
    sessions.iter().filter_map(|s| s.coords).collect()
}

fn haversine_km(a: &LatLng, b: &LatLng) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Great-circle length of the route, in kilometers.
pub fn route_length_km(points: &[LatLng]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_km(&w[0], &w[1]))
        .fold(0.0, |acc, d| acc + d)
}
