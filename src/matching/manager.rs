// src/matching/manager.rs - Runs name matching and distance validation over two tables
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

use crate::matching::geospatial::{distance_km, distance_miles};
use crate::matching::matcher::{CandidateIndex, MatchResult, MatchRun};
use crate::matching::name::normalize_bank_name;
use crate::models::core::{EntityRecord, MatchedRecord};
use crate::models::stats_models::{MatchMethodType, MatchStats};
use crate::utils::get_memory_usage;
use crate::utils::progress_bars::logging::MatchingLogger;
use crate::utils::progress_bars::progress_config::ProgressConfig;

pub struct MatchOutput {
    /// One entry per withdrawal, in input order
    pub records: Vec<MatchedRecord>,
    pub stats: MatchStats,
}

/// Links every withdrawal to its best bank and attaches the distance between
/// the two sites. Never fails: missing names, coordinates and rejected
/// matches all come back as absent fields.
pub fn run_bank_matching(
    withdrawals: &[EntityRecord],
    banks: &[EntityRecord],
    threshold: u8,
    progress: &ProgressConfig,
) -> MatchOutput {
    let start_time = Instant::now();
    let run_id = Uuid::new_v4().to_string();
    let run_timestamp = Utc::now().naive_utc();
    let logger = MatchingLogger::new(MatchMethodType::Name);
    logger.log_start(&run_id, threshold);
    logger.log_data_loaded(withdrawals.len(), "withdrawal");
    logger.log_data_loaded(banks.len(), "bank");

    logger.log_phase("Building candidate index", Some("normalizing bank names"));
    let index = CandidateIndex::build(banks.iter().map(|b| b.name.as_deref()));
    logger.log_index_built(banks.len(), index.len());
    if index.is_empty() {
        logger.log_warning("No usable bank names; every withdrawal will be unmatched");
    }

    logger.log_phase("Normalizing withdrawal names", None);
    let clean_names: Vec<String> = withdrawals
        .iter()
        .map(|w| normalize_bank_name(w.name.as_deref()))
        .collect();
    let records_with_names = clean_names.iter().filter(|n| !n.is_empty()).count();
    logger.log_data_quality_issue(
        "withdrawals without a usable name",
        withdrawals.len() - records_with_names,
    );

    logger.log_phase("Matching names", Some("token-sort ratio against all bank keys"));
    let mut run = MatchRun::new(&index, threshold);
    let pb = progress.create_bar(clean_names.len() as u64, "Matching bank names...");
    let results = run.match_all(pb.wrap_iter(clean_names.iter()));
    pb.finish_with_message("Name matching complete");
    let cache = run.cache_stats();
    if progress.should_show_cache_stats() {
        logger.log_cache_results(cache.hits, cache.misses, cache.comparisons);
    }

    let geo_logger = MatchingLogger::new(MatchMethodType::Geospatial);
    geo_logger.log_phase("Computing distances", Some("haversine between impact and bank sites"));
    let records: Vec<MatchedRecord> = withdrawals
        .iter()
        .zip(clean_names)
        .zip(results)
        .map(|((withdrawal, clean_name), result)| {
            attach_bank(withdrawal, clean_name, result, &index, banks)
        })
        .collect();

    let matched: Vec<&MatchedRecord> = records.iter().filter(|r| r.matched_key.is_some()).collect();
    let distances: Vec<f64> = records.iter().filter_map(|r| r.distance_km).collect();
    geo_logger.log_data_quality_issue(
        "matched withdrawals without complete coordinates",
        matched.len() - distances.len(),
    );

    let avg_match_score = mean(matched.iter().map(|r| f64::from(r.match_score)));
    let avg_distance_km = mean(distances.iter().copied());
    let max_distance_km = distances.iter().copied().reduce(f64::max);
    geo_logger.log_distance_summary(distances.len(), records.len(), avg_distance_km);
    logger.log_completion(matched.len(), records.len(), avg_match_score.unwrap_or(0.0));
    if progress.should_show_memory() {
        logger.log_debug(&format!("Memory usage: {} MB", get_memory_usage()));
    }

    let stats = MatchStats {
        run_id,
        run_timestamp,
        threshold,
        total_records: records.len(),
        records_with_names,
        matched_records: matched.len(),
        match_rate: if records.is_empty() {
            0.0
        } else {
            matched.len() as f64 / records.len() as f64 * 100.0
        },
        avg_match_score: avg_match_score.unwrap_or(0.0),
        unique_bank_keys: index.len(),
        bank_records: banks.len(),
        cache,
        distances_computed: distances.len(),
        avg_distance_km,
        max_distance_km,
        matching_time: start_time.elapsed().as_secs_f64(),
    };

    MatchOutput { records, stats }
}

fn attach_bank(
    withdrawal: &EntityRecord,
    clean_name: String,
    result: MatchResult,
    index: &CandidateIndex,
    banks: &[EntityRecord],
) -> MatchedRecord {
    let bank = index
        .resolve(result.matched_key.as_deref())
        .and_then(|candidate| banks.get(candidate.row_index));
    let (bank_lat, bank_lon) = bank.map_or((None, None), |b| (b.latitude, b.longitude));

    MatchedRecord {
        row_index: withdrawal.row_index,
        clean_name,
        matched_bank_name: bank.and_then(|b| b.name.clone()),
        matched_key: result.matched_key,
        match_score: result.score,
        matched_latitude: bank_lat,
        matched_longitude: bank_lon,
        distance_km: distance_km(withdrawal.latitude, withdrawal.longitude, bank_lat, bank_lon),
        distance_miles: distance_miles(withdrawal.latitude, withdrawal.longitude, bank_lat, bank_lon),
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn withdrawals() -> Vec<EntityRecord> {
        vec![
            EntityRecord::new(0, Some("Wetland A"), Some(34.05), Some(-118.24)),
            EntityRecord::new(1, Some("Wetland B"), Some(36.16), Some(-115.15)),
            EntityRecord::new(2, Some("Wetland C"), None, Some(-74.0)),
            EntityRecord::new(3, None, Some(40.71), Some(-74.0)),
            EntityRecord::new(4, Some("Wetland A"), Some(36.16), Some(-115.15)),
        ]
    }

    fn banks() -> Vec<EntityRecord> {
        vec![
            EntityRecord::new(0, Some("Wetland A Mitigation Bank"), Some(34.05), Some(-118.24)),
            EntityRecord::new(1, Some("Wetland B2"), Some(36.16), Some(-115.15)),
            EntityRecord::new(2, Some("Wetland C3"), Some(40.71), Some(-74.0)),
        ]
    }

    #[test]
    fn test_records_align_with_input() {
        let output = run_bank_matching(&withdrawals(), &banks(), 80, &ProgressConfig::disabled());
        let records = output.records;
        assert_eq!(records.len(), 5);
        assert!(records.iter().enumerate().all(|(i, r)| r.row_index == i));

        assert_eq!(records[0].matched_key.as_deref(), Some("wetland a"));
        assert_eq!(records[0].matched_bank_name.as_deref(), Some("Wetland A Mitigation Bank"));
        assert_eq!(records[0].match_score, 100);
        assert_eq!(records[0].distance_km, Some(0.0));

        assert_eq!(records[3].clean_name, "");
        assert_eq!(records[3].matched_key, None);
        assert_eq!(records[3].match_score, 0);
        assert_eq!(records[3].distance_km, None);
    }

    #[test]
    fn test_distance_needs_all_coordinates() {
        let output = run_bank_matching(&withdrawals(), &banks(), 80, &ProgressConfig::disabled());
        let wetland_c = &output.records[2];
        assert!(wetland_c.matched_key.is_some());
        assert_eq!(wetland_c.matched_latitude, Some(40.71));
        assert_eq!(wetland_c.distance_km, None);
        assert_eq!(wetland_c.distance_miles, None);

        let far = &output.records[4];
        let km = far.distance_km.unwrap();
        assert!(km > 300.0 && km < 400.0, "got {km}");
        assert!((far.distance_miles.unwrap() - km * 0.621371).abs() < 1e-9);
    }

    #[test]
    fn test_stats_summarize_run() {
        let output = run_bank_matching(&withdrawals(), &banks(), 80, &ProgressConfig::disabled());
        let stats = output.stats;
        assert_eq!(stats.total_records, 5);
        assert_eq!(stats.records_with_names, 4);
        assert_eq!(stats.matched_records, 4);
        assert_eq!(stats.unique_bank_keys, 3);
        assert_eq!(stats.cache.hits, 1);
        assert_eq!(stats.cache.misses, 3);
        assert_eq!(stats.distances_computed, 3);
        assert!((stats.match_rate - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_banks_leaves_everything_unmatched() {
        let output = run_bank_matching(&withdrawals(), &[], 80, &ProgressConfig::disabled());
        assert!(output.records.iter().all(|r| r.matched_key.is_none() && r.match_score == 0));
        assert_eq!(output.stats.avg_distance_km, None);
        assert_eq!(output.stats.match_rate, 0.0);
    }
}
