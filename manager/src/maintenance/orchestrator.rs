//! Scheduled maintenance orchestration
//!
//! One tick walks every registered project: rate-limit gate, fuse
//! evaluation, then version check. The fuse takes precedence over a stale
//! version because a breached quota calls for a new secret, not just a
//! redeploy. Version-check failures are tolerated so a flaky upstream
//! cannot stall the schedule.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::maintenance::{deploy, fuse, rotate, stats, version_check};
use crate::models::account::Account;
use crate::models::deploy::TargetResult;
use crate::models::stats::StatsSnapshot;
use crate::registry::{ProjectRegistry, ProjectTemplate};
use crate::storage::repo::ConfigRepo;

/// Outcome of one maintenance pass over one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No config stored, or maintenance disabled
    Disabled,
    /// Checked recently; nothing done and `last_check` untouched
    RateLimited,
    /// Fuse breached: secret rotated and fleet redeployed
    FuseTriggered,
    /// Upstream moved: fleet redeployed without rotation
    VersionStale,
    /// Nothing to do
    UpToDate,
}

pub struct Orchestrator {
    http: Arc<HttpClient>,
    repo: ConfigRepo,
    registry: &'static ProjectRegistry,
}

impl Orchestrator {
    pub fn new(
        http: Arc<HttpClient>,
        repo: ConfigRepo,
        registry: &'static ProjectRegistry,
    ) -> Self {
        Self {
            http,
            repo,
            registry,
        }
    }

    /// Run one maintenance tick across all registered projects.
    ///
    /// Usage snapshots are collected once and shared by every project's
    /// fuse evaluation. A failure in one project is logged and never
    /// stops the others.
    pub async fn run_tick(&self) -> Result<(), ManagerError> {
        let accounts = self.repo.load_accounts().await?;
        if accounts.is_empty() {
            debug!("Maintenance tick skipped: no accounts configured");
            return Ok(());
        }

        let snapshots = stats::collect_stats(&self.http, &accounts, true).await;

        for template in self.registry.iter() {
            match self.tick_project(template, &accounts, &snapshots).await {
                Ok(outcome) => debug!("Maintenance for {}: {:?}", template.id, outcome),
                Err(e) => error!("Maintenance for {} failed: {}", template.id, e),
            }
        }

        Ok(())
    }

    /// One maintenance pass over one project.
    pub async fn tick_project(
        &self,
        template: &ProjectTemplate,
        accounts: &[Account],
        snapshots: &[StatsSnapshot],
    ) -> Result<TickOutcome, ManagerError> {
        let Some(mut config) = self.repo.load_config(&template.id).await? else {
            return Ok(TickOutcome::Disabled);
        };
        if !config.enabled {
            return Ok(TickOutcome::Disabled);
        }

        let now = Utc::now();
        if !config.is_due(now) {
            return Ok(TickOutcome::RateLimited);
        }

        let outcome = if config.fuse_threshold > 0
            && fuse::fuse_triggered(&template.id, accounts, snapshots, config.fuse_threshold)
        {
            info!("Fuse triggered for {}, rotating secret", template.id);
            let results =
                rotate::rotate_and_deploy(&self.http, &self.repo, template, accounts).await?;
            log_deploy_results(&template.id, &results);
            TickOutcome::FuseTriggered
        } else {
            match version_check::check_update(&self.http, template, &self.repo).await {
                Ok(comparison) if comparison.needs_update() => {
                    info!(
                        "Upstream revision for {} moved to {}, redeploying",
                        template.id, comparison.remote.revision
                    );
                    // An update failure is caught like a check failure so
                    // the bookkeeping below still runs.
                    match self.deploy_latest(template, accounts).await {
                        Ok(results) => log_deploy_results(&template.id, &results),
                        Err(e) => warn!("Redeploy of {} failed: {}", template.id, e),
                    }
                    TickOutcome::VersionStale
                }
                Ok(_) => TickOutcome::UpToDate,
                // A failed check still counts as a check; the next attempt
                // waits a full interval.
                Err(e) => {
                    warn!("Version check for {} failed: {}", template.id, e);
                    TickOutcome::UpToDate
                }
            }
        };

        config.mark_checked(now);
        self.repo.save_config(&template.id, &config).await?;

        Ok(outcome)
    }

    /// Redeploy a project with its currently persisted variable set.
    async fn deploy_latest(
        &self,
        template: &ProjectTemplate,
        accounts: &[Account],
    ) -> Result<Vec<TargetResult>, ManagerError> {
        let variables = self.repo.load_variables(&template.id).await?;
        deploy::deploy_project(&self.http, &self.repo, template, &variables, accounts).await
    }
}

fn log_deploy_results(project_id: &str, results: &[TargetResult]) {
    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;
    if failed > 0 {
        warn!(
            "Deploy of {} finished: {} updated, {} failed",
            project_id, succeeded, failed
        );
    } else {
        info!("Deploy of {} finished: {} updated", project_id, succeeded);
    }
}
