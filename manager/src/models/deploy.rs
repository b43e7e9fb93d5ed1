//! Deploy pipeline result types

use serde::{Deserialize, Serialize};

/// Outcome of one deploy attempt against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResult {
    /// Alias of the owning account; empty for run-level notices
    #[serde(default)]
    pub account: String,

    /// Target identifier; empty for run-level notices
    #[serde(default)]
    pub target: String,

    pub success: bool,

    /// Sink-reported error text or exception text on failure
    #[serde(default)]
    pub message: String,
}

impl TargetResult {
    pub fn ok(account: &str, target: &str) -> Self {
        Self {
            account: account.to_string(),
            target: target.to_string(),
            success: true,
            message: "updated".to_string(),
        }
    }

    pub fn failed(account: &str, target: &str, message: String) -> Self {
        Self {
            account: account.to_string(),
            target: target.to_string(),
            success: false,
            message,
        }
    }

    /// A single run-level notice that aborted or short-circuited the run.
    pub fn notice(message: String) -> Self {
        Self {
            account: String::new(),
            target: String::new(),
            success: false,
            message,
        }
    }
}
