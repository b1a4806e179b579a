// src/utils/matching_config.rs

use anyhow::{bail, Result};
use log::{info, warn};
use std::env;

use crate::utils::constants::DEFAULT_MATCH_THRESHOLD;

/// Which CSV columns carry the name and coordinates of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl ColumnMapping {
    pub fn new(name: &str, latitude: &str, longitude: &str) -> Self {
        Self {
            name: name.to_string(),
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        }
    }
}

/// Configuration for one withdrawal -> bank matching run
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum token-sort score to accept a bank. Held wider than a score so
    /// an out-of-range setting survives until `validate`.
    pub threshold: u16,
    /// Columns of the withdrawals/impacts table
    pub withdrawal_columns: ColumnMapping,
    /// Columns of the banks/credit-providers table
    pub bank_columns: ColumnMapping,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: u16::from(DEFAULT_MATCH_THRESHOLD),
            withdrawal_columns: ColumnMapping::new(
                "Name",
                "Impact LocationLatitude",
                "Impact LocationLongitude",
            ),
            bank_columns: ColumnMapping::new("Name", "Latitude", "Longitude"),
        }
    }
}

impl MatchingConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threshold: threshold_from_env(defaults.threshold),
            withdrawal_columns: ColumnMapping {
                name: env_or("WITHDRAWALS_NAME_COLUMN", defaults.withdrawal_columns.name),
                latitude: env_or(
                    "WITHDRAWALS_LATITUDE_COLUMN",
                    defaults.withdrawal_columns.latitude,
                ),
                longitude: env_or(
                    "WITHDRAWALS_LONGITUDE_COLUMN",
                    defaults.withdrawal_columns.longitude,
                ),
            },
            bank_columns: ColumnMapping {
                name: env_or("BANKS_NAME_COLUMN", defaults.bank_columns.name),
                latitude: env_or("BANKS_LATITUDE_COLUMN", defaults.bank_columns.latitude),
                longitude: env_or("BANKS_LONGITUDE_COLUMN", defaults.bank_columns.longitude),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            bail!(
                "Match threshold must be between 0 and 100, got {}",
                self.threshold
            );
        }
        Ok(())
    }

    /// Threshold as a match score, capped at 100. Call `validate` first to
    /// reject out-of-range settings instead of capping them.
    pub fn score_threshold(&self) -> u8 {
        self.threshold.min(100) as u8
    }

    pub fn log_config(&self) {
        info!("Match threshold: {}", self.threshold);
        info!(
            "Withdrawal columns: name='{}', lat='{}', lon='{}'",
            self.withdrawal_columns.name,
            self.withdrawal_columns.latitude,
            self.withdrawal_columns.longitude
        );
        info!(
            "Bank columns: name='{}', lat='{}', lon='{}'",
            self.bank_columns.name, self.bank_columns.latitude, self.bank_columns.longitude
        );
    }
}

fn threshold_from_env(default: u16) -> u16 {
    let Ok(raw) = env::var("MATCH_THRESHOLD") else {
        return default;
    };
    match raw.trim().parse::<u16>() {
        Ok(threshold) => threshold,
        Err(e) => {
            warn!(
                "Ignoring MATCH_THRESHOLD='{}' ({}); using default {}",
                raw, e, default
            );
            default
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchingConfig::default();
        assert_eq!(config.threshold, 80);
        assert_eq!(config.withdrawal_columns.name, "Name");
        assert_eq!(config.withdrawal_columns.latitude, "Impact LocationLatitude");
        assert_eq!(config.bank_columns.longitude, "Longitude");
        assert!(config.validate().is_ok());
        assert_eq!(config.score_threshold(), 80);
    }

    #[test]
    fn test_env_config() {
        env::set_var("MATCH_THRESHOLD", "85");
        env::set_var("BANKS_NAME_COLUMN", "Bank Name");
        env::set_var("WITHDRAWALS_LATITUDE_COLUMN", " ");

        let config = MatchingConfig::from_env();
        assert_eq!(config.threshold, 85);
        assert_eq!(config.bank_columns.name, "Bank Name");
        assert_eq!(config.withdrawal_columns.latitude, "Impact LocationLatitude");

        // Out of range is kept so validate() can report it
        env::set_var("MATCH_THRESHOLD", "300");
        let config = MatchingConfig::from_env();
        assert_eq!(config.threshold, 300);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("300"));

        env::set_var("MATCH_THRESHOLD", "eighty");
        assert_eq!(MatchingConfig::from_env().threshold, 80);

        // Clean up
        env::remove_var("MATCH_THRESHOLD");
        env::remove_var("BANKS_NAME_COLUMN");
        env::remove_var("WITHDRAWALS_LATITUDE_COLUMN");
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = MatchingConfig {
            threshold: 101,
            ..MatchingConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.score_threshold(), 100);
    }
}
