//! Per-project auto-maintenance configuration

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Unit for the maintenance check interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Minutes,
    #[default]
    Hours,
}

/// Auto-maintenance configuration, one per project.
///
/// All fields default on load so an absent or partial persisted blob yields
/// a disabled config with the fuse off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoMaintenanceConfig {
    /// Whether scheduled maintenance runs for this project
    #[serde(default)]
    pub enabled: bool,

    /// Interval magnitude between checks
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Interval unit
    #[serde(default)]
    pub unit: IntervalUnit,

    /// Fuse threshold in percent of the daily quota; 0 disables the fuse
    #[serde(default)]
    pub fuse_threshold: u32,

    /// Timestamp of the last maintenance check (epoch milliseconds).
    /// Monotonically non-decreasing.
    #[serde(default)]
    pub last_check: i64,
}

fn default_interval() -> u64 {
    24
}

impl Default for AutoMaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_interval(),
            unit: IntervalUnit::Hours,
            fuse_threshold: 0,
            last_check: 0,
        }
    }
}

impl AutoMaintenanceConfig {
    /// The configured interval as a duration.
    pub fn interval_duration(&self) -> Duration {
        let minutes = match self.unit {
            IntervalUnit::Minutes => self.interval,
            IntervalUnit::Hours => self.interval * 60,
        };
        Duration::minutes(minutes as i64)
    }

    /// Whether a maintenance check is due at `now`. A check within the
    /// interval since `last_check` is rate-limited.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let elapsed_ms = now.timestamp_millis() - self.last_check;
        elapsed_ms > self.interval_duration().num_milliseconds()
    }

    /// Advance the last-check bookkeeping to `now`.
    pub fn mark_checked(&mut self, now: DateTime<Utc>) {
        self.last_check = self.last_check.max(now.timestamp_millis());
    }
}
