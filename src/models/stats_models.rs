// src/models/stats_models.rs
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::matching::matcher::CacheStats;

/// Summary of one matching run, logged at the end and optionally written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct MatchStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub threshold: u8,
    pub total_records: usize,
    pub records_with_names: usize,
    pub matched_records: usize,
    pub match_rate: f64,
    pub avg_match_score: f64,
    pub unique_bank_keys: usize,
    pub bank_records: usize,
    pub cache: CacheStats,
    pub distances_computed: usize,
    pub avg_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub matching_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchMethodType {
    Name,
    Geospatial,
}
