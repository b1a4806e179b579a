//! Credit-classification filtering for the withdrawals table
//! Restricts matching to transactions whose classification mentions a wetland type

use log::{debug, info};
use std::env;

pub const DEFAULT_CLASSIFICATION_COLUMN: &str = "Credit Classification or Subdivision";

pub const DEFAULT_WETLAND_KEYWORDS: [&str; 13] = [
    "wetland",
    "wetlands",
    "marsh",
    "palustrine",
    "estuarine",
    "swamp",
    "bog",
    "meadow",
    "vernal pool",
    "pem",
    "pss",
    "pfo",
    "pub",
];

#[derive(Debug, Clone)]
pub struct ClassificationFilterConfig {
    pub enabled: bool,
    pub column: String,
    /// Lowercased keywords, matched as substrings
    pub keywords: Vec<String>,
}

impl Default for ClassificationFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            column: DEFAULT_CLASSIFICATION_COLUMN.to_string(),
            keywords: DEFAULT_WETLAND_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl ClassificationFilterConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = env::var("CLASSIFICATION_FILTER_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let column = env::var("CLASSIFICATION_COLUMN")
            .ok()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(defaults.column);

        let keywords: Vec<String> = env::var("CLASSIFICATION_KEYWORDS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let keywords = if keywords.is_empty() {
            defaults.keywords
        } else {
            keywords
        };

        debug!(
            "Classification filter config: enabled={}, column={}, keywords={:?}",
            enabled, column, keywords
        );

        Self {
            enabled,
            column,
            keywords,
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.keywords.is_empty()
    }

    /// Whether a row with this classification is kept. Rows without a
    /// classification are dropped while the filter is active.
    pub fn matches(&self, classification: Option<&str>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(classification) = classification else {
            return false;
        };
        let lowered = classification.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        if self.is_active() {
            info!("🌿 Classification filtering ENABLED on column '{}'", self.column);
            info!("   Keywords: {:?}", self.keywords);
        } else {
            info!("Classification filtering disabled - all withdrawal rows are matched");
        }
    }
}
