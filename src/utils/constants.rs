// src/utils/constants.rs

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const KM_TO_MILES: f64 = 0.621371;

/// Minimum token-sort score (0-100) for a withdrawal to be linked to a bank.
pub const DEFAULT_MATCH_THRESHOLD: u8 = 80;
