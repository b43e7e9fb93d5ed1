//! Traffic fuse evaluation
//!
//! The fuse decides, per project, whether any account's project-scoped
//! usage crossed the configured threshold. A single breaching account is
//! sufficient to trigger rotation for the whole project, so evaluation
//! stops at the first breach.

use tracing::{debug, info};

use crate::models::account::Account;
use crate::models::stats::StatsSnapshot;

/// Usage attributed to one project on one account: the sum of the
/// breakdown counts over the account's assigned targets.
pub fn project_usage(snapshot: &StatsSnapshot, targets: &[String]) -> u64 {
    targets
        .iter()
        .map(|t| snapshot.breakdown.get(t).copied().unwrap_or(0))
        .sum()
}

/// Evaluate the fuse for one project. A threshold of 0 disables the fuse
/// entirely. Accounts are checked in registration order; accounts with a
/// missing or errored snapshot, or with no targets assigned to this
/// project, are skipped.
pub fn fuse_triggered(
    project_id: &str,
    accounts: &[Account],
    snapshots: &[StatsSnapshot],
    threshold: u32,
) -> bool {
    if threshold == 0 {
        return false;
    }

    for account in accounts {
        let Some(snapshot) = snapshots.iter().find(|s| s.alias == account.alias) else {
            continue;
        };
        if snapshot.is_err() {
            continue;
        }

        let targets = account.targets_for(project_id);
        if targets.is_empty() {
            continue;
        }

        let usage = project_usage(snapshot, targets);
        let used_percent = usage as f64 / snapshot.quota as f64 * 100.0;

        debug!(
            "Fuse check for {} on account {}: {} requests ({:.1}%)",
            project_id, account.alias, usage, used_percent
        );

        if used_percent >= threshold as f64 {
            info!(
                "Fuse triggered for {} on account {}: {:.1}% >= {}%",
                project_id, account.alias, used_percent, threshold
            );
            return true;
        }
    }

    false
}
