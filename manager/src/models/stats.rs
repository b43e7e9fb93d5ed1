//! Usage statistics snapshots

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Daily request quota applied when the telemetry API reports no ceiling
/// (the deployment platform's free-tier allowance).
pub const DAILY_REQUEST_QUOTA: u64 = 100_000;

/// Per-account usage snapshot for the current accounting window.
///
/// A failed collection for one account is captured in `error` and never
/// affects the snapshots of other accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Account alias this snapshot belongs to
    pub alias: String,

    /// Total requests across all targets of the account
    #[serde(default)]
    pub total: u64,

    /// Per-target request counts, keyed by target identifier
    #[serde(default)]
    pub breakdown: HashMap<String, u64>,

    /// Fixed quota ceiling for the accounting window
    #[serde(default = "default_quota")]
    pub quota: u64,

    /// Error descriptor when collection failed for this account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_quota() -> u64 {
    DAILY_REQUEST_QUOTA
}

impl StatsSnapshot {
    pub fn collected(alias: String, total: u64, breakdown: HashMap<String, u64>) -> Self {
        Self {
            alias,
            total,
            breakdown,
            quota: DAILY_REQUEST_QUOTA,
            error: None,
        }
    }

    pub fn failed(alias: String, error: String) -> Self {
        Self {
            alias,
            total: 0,
            breakdown: HashMap::new(),
            quota: DAILY_REQUEST_QUOTA,
            error: Some(error),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}
