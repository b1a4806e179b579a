// src/models/core.rs
use serde::Serialize;

/// One row of either input table, reduced to the fields matching needs.
/// Identity is the row's position in its source table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityRecord {
    pub row_index: usize,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl EntityRecord {
    pub fn new(
        row_index: usize,
        name: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Self {
        Self {
            row_index,
            name: name.map(str::to_string),
            latitude,
            longitude,
        }
    }
}

/// Columns added to a withdrawal row by a matching run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRecord {
    pub row_index: usize,
    pub clean_name: String,
    pub matched_key: Option<String>,
    pub matched_bank_name: Option<String>,
    pub match_score: u8,
    pub matched_latitude: Option<f64>,
    pub matched_longitude: Option<f64>,
    pub distance_km: Option<f64>,
    pub distance_miles: Option<f64>,
}
