//! Archive pipeline configuration.
//!
//! Every tunable has a default, so an empty `[archive]` section (or none at
//! all) gives a working pipeline.
//!
//! # Example
//!
//! ```toml
//! [archive]
//! enabled = true
//! batch_size = 5000
//! minimum_signature_lifetime_days = 14
//! interval_secs = 300
//! orphan_delete_policy = "selected"
//! upstream_queues = ["signatures_pending", "validations_pending"]
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Archive pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Whether any rows are moved or deleted at all.
    /// Default: true
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum rows selected per category per run.
    /// Bounds the working set and the size of each delete statement.
    /// Default: 5000
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Grace period before an unprocessed signature with no validation token
    /// becomes eligible for archiving.
    /// Default: 14 days
    #[serde(default = "default_minimum_signature_lifetime_days")]
    pub minimum_signature_lifetime_days: u32,

    /// How often the `worker` command runs the pipeline (in seconds).
    /// Default: 300
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Which orphaned validation keys are deleted after archiving.
    #[serde(default)]
    pub orphan_delete_policy: OrphanDeletePolicy,

    /// Upstream queues whose drain timestamps feed the `last_fully_emptied`
    /// watermark.
    #[serde(default = "default_upstream_queues")]
    pub upstream_queues: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            batch_size: default_batch_size(),
            minimum_signature_lifetime_days: default_minimum_signature_lifetime_days(),
            interval_secs: default_interval_secs(),
            orphan_delete_policy: OrphanDeletePolicy::default(),
            upstream_queues: default_upstream_queues(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_batch_size() -> u32 {
    5000
}

fn default_minimum_signature_lifetime_days() -> u32 {
    14 // 2 weeks
}

fn default_interval_secs() -> u64 {
    300
}

fn default_upstream_queues() -> Vec<String> {
    vec![
        "signatures_pending".to_string(),
        "validations_pending".to_string(),
    ]
}

/// Deletion rule for the orphaned-validation stage.
///
/// The signature stages only ever delete rows that were confirmed in the
/// archive. Orphaned validation tokens have historically been deleted
/// whether or not their archive write succeeded; `Selected` keeps that
/// behaviour and `Confirmed` aligns orphans with the other stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanDeletePolicy {
    /// Delete every selected orphan, archived or not
    #[default]
    Selected,
    /// Delete only orphans whose archive write succeeded
    Confirmed,
}

impl std::fmt::Display for OrphanDeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrphanDeletePolicy::Selected => write!(f, "selected"),
            OrphanDeletePolicy::Confirmed => write!(f, "confirmed"),
        }
    }
}

impl ArchiveConfig {
    /// Minimum signature lifetime as a chrono Duration.
    pub fn minimum_signature_lifetime(&self) -> chrono::Duration {
        chrono::Duration::days(self.minimum_signature_lifetime_days as i64)
    }

    /// Get the worker interval as a Duration.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }

    /// Checks every setting, including the worker interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_batching()?;
        if self.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "archive.interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Checks only what a single run needs. The interval is a worker concern.
    pub fn validate_batching(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "archive.batch_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
