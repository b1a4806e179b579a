// src/matching/geospatial.rs
use crate::utils::constants::{EARTH_RADIUS_KM, KM_TO_MILES};

/// Great-circle distance in kilometers (haversine). Any missing or non-finite
/// coordinate yields `None`.
pub fn distance_km(
    lat1: Option<f64>,
    lon1: Option<f64>,
    lat2: Option<f64>,
    lon2: Option<f64>,
) -> Option<f64> {
    let (lat1, lon1, lat2, lon2) = (finite(lat1)?, finite(lon1)?, finite(lat2)?, finite(lon2)?);
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let (delta_phi, delta_lambda) = ((lat2 - lat1).to_radians(), (lon2 - lon1).to_radians());
    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    Some(2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt()))
}

pub fn distance_miles(
    lat1: Option<f64>,
    lon1: Option<f64>,
    lat2: Option<f64>,
    lon2: Option<f64>,
) -> Option<f64> {
    distance_km(lat1, lon1, lat2, lon2).map(|km| km * KM_TO_MILES)
}

/// Reads a coordinate cell. Blank, non-numeric and non-finite values are
/// missing rather than errors.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    finite(trimmed.parse::<f64>().ok())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
