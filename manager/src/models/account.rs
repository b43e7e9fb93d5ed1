//! Account registry entries and project variables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One managed account with its credential pair and target assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Display label (not unique-enforced)
    #[serde(default)]
    pub alias: String,

    /// Account identifier at the deployment sink
    pub account_id: String,

    /// API credential used against the sink and the telemetry API
    pub api_token: String,

    /// Deployment targets assigned to this account, keyed by project id.
    /// This assignment is authoritative: the deploy pipeline never
    /// discovers targets on its own.
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<String>>,
}

impl Account {
    /// Targets assigned to this account for one project.
    pub fn targets_for(&self, project_id: &str) -> &[String] {
        self.targets
            .get(project_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// A named plain-text value injected into a deployed target's runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,

    /// May be empty; empty values are never pushed to a target.
    #[serde(default)]
    pub value: String,
}
