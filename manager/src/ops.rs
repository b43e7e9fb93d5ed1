//! Operations facade
//!
//! On-demand entry points shared by the control API: everything the
//! scheduler does automatically can also be invoked here, plus the
//! configuration reads and writes.

use std::sync::Arc;

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::maintenance::{deploy, stats, version_check};
use crate::models::account::{Account, Variable};
use crate::models::config::AutoMaintenanceConfig;
use crate::models::deploy::TargetResult;
use crate::models::stats::StatsSnapshot;
use crate::models::version::VersionComparison;
use crate::registry::{ProjectRegistry, ProjectTemplate};
use crate::storage::repo::ConfigRepo;

#[derive(Clone)]
pub struct Operations {
    http: Arc<HttpClient>,
    repo: ConfigRepo,
    registry: &'static ProjectRegistry,
}

impl Operations {
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

    pub fn registry(&self) -> &'static ProjectRegistry {
        self.registry
    }

    /// Resolve a project id against the registry.
    pub fn template(&self, project_id: &str) -> Result<&'static ProjectTemplate, ManagerError> {
        self.registry
            .get(project_id)
            .ok_or_else(|| ManagerError::UnknownProject(project_id.to_string()))
    }

    pub async fn accounts(&self) -> Result<Vec<Account>, ManagerError> {
        self.repo.load_accounts().await
    }

    pub async fn set_accounts(&self, accounts: &[Account]) -> Result<(), ManagerError> {
        self.repo.save_accounts(accounts).await
    }

    pub async fn variables(&self, project_id: &str) -> Result<Vec<Variable>, ManagerError> {
        self.template(project_id)?;
        self.repo.load_variables(project_id).await
    }

    pub async fn set_variables(
        &self,
        project_id: &str,
        variables: &[Variable],
    ) -> Result<(), ManagerError> {
        self.template(project_id)?;
        self.repo.save_variables(project_id, variables).await
    }

    /// Read a project's maintenance config; never stored means default (disabled).
    pub async fn maintenance_config(
        &self,
        project_id: &str,
    ) -> Result<AutoMaintenanceConfig, ManagerError> {
        self.template(project_id)?;
        Ok(self
            .repo
            .load_config(project_id)
            .await?
            .unwrap_or_default())
    }

    /// Write a project's maintenance config. The scheduler's `last_check`
    /// bookkeeping is preserved from the stored config so an admin write
    /// never resets the rate-limit window.
    pub async fn set_maintenance_config(
        &self,
        project_id: &str,
        mut config: AutoMaintenanceConfig,
    ) -> Result<AutoMaintenanceConfig, ManagerError> {
        self.template(project_id)?;
        let stored = self.repo.load_config(project_id).await?.unwrap_or_default();
        config.last_check = stored.last_check;
        self.repo.save_config(project_id, &config).await?;
        Ok(config)
    }

    pub async fn check_update(
        &self,
        project_id: &str,
    ) -> Result<VersionComparison, ManagerError> {
        let template = self.template(project_id)?;
        version_check::check_update(&self.http, template, &self.repo).await
    }

    /// Deploy a project on demand with an explicit variable set. The set is
    /// persisted first so the scheduler reuses it on later runs.
    pub async fn deploy(
        &self,
        project_id: &str,
        variables: Vec<Variable>,
    ) -> Result<Vec<TargetResult>, ManagerError> {
        let template = self.template(project_id)?;
        self.repo.save_variables(project_id, &variables).await?;
        let accounts = self.repo.load_accounts().await?;
        deploy::deploy_project(&self.http, &self.repo, template, &variables, &accounts).await
    }

    /// Collect totals-only usage snapshots for all accounts.
    pub async fn stats(&self) -> Result<Vec<StatsSnapshot>, ManagerError> {
        let accounts = self.repo.load_accounts().await?;
        Ok(stats::collect_stats(&self.http, &accounts, false).await)
    }
}
