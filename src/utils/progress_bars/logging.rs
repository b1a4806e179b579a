// src/utils/progress_bars/logging.rs - Logging helpers for matching stages
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::stats_models::MatchMethodType;

#[derive(Clone)]
pub struct MatchingLogger {
    method_name: &'static str,
    method_emoji: &'static str,
    start_time: Instant,
}

impl MatchingLogger {
    pub fn new(method_type: MatchMethodType) -> Self {
        let (method_name, method_emoji) = match method_type {
            MatchMethodType::Name => ("NAME", "👤"),
            MatchMethodType::Geospatial => ("GEO", "📍"),
        };

        Self {
            method_name,
            method_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, threshold: u8) {
        info!(
            "[{}] {} 🚀 Starting {} matching (run ID: {}, threshold: {})",
            self.method_name,
            self.method_emoji,
            self.method_name.to_lowercase(),
            run_id,
            threshold
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.method_name, self.method_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.method_name, self.method_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!(
            "[{}] {} 📊 Loaded {} {} records",
            self.method_name, self.method_emoji, count, data_type
        );
    }

    pub fn log_index_built(&self, raw_count: usize, unique_keys: usize) {
        info!(
            "[{}] {} ✅ Candidate index built: {} bank records → {} unique normalized keys",
            self.method_name, self.method_emoji, raw_count, unique_keys
        );
    }

    pub fn log_cache_results(&self, cache_hits: usize, cache_misses: usize, comparisons: usize) {
        let total = cache_hits + cache_misses;
        if total > 0 {
            let hit_rate = (cache_hits as f64 / total as f64) * 100.0;
            info!(
                "[{}] {} 💾 Cache results: {} hits, {} misses ({:.1}% hit rate), {} comparisons",
                self.method_name, self.method_emoji, cache_hits, cache_misses, hit_rate, comparisons
            );
        }
    }

    pub fn log_completion(&self, matched: usize, total: usize, avg_score: f64) {
        let duration = self.start_time.elapsed();
        let rate = if total > 0 {
            (matched as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        info!(
            "[{}] {} 🎉 COMPLETED: {}/{} records matched ({:.2}%) in {:.2?}",
            self.method_name, self.method_emoji, matched, total, rate, duration
        );
        if matched > 0 {
            info!(
                "[{}] {} 📊 Average match score: {:.1}",
                self.method_name, self.method_emoji, avg_score
            );
        }
    }

    pub fn log_distance_summary(&self, computed: usize, total: usize, avg_km: Option<f64>) {
        match avg_km {
            Some(avg) => info!(
                "[{}] {} 📏 Distances computed for {}/{} records (mean {:.2} km)",
                self.method_name, self.method_emoji, computed, total, avg
            ),
            None => info!(
                "[{}] {} 📏 No distances computed ({} records)",
                self.method_name, self.method_emoji, total
            ),
        }
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} instances of {}",
                self.method_name, self.method_emoji, count, issue_type
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.method_name, self.method_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.method_name, self.method_emoji, message);
    }
}
