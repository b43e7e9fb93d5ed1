//! Typed access to the persisted configuration blobs
//!
//! Key schema: one global key for the account registry, and per-project keys
//! for the variable set, the version record, and the auto-maintenance config.
//! Absent blobs load as documented defaults.

use std::sync::Arc;

use crate::errors::ManagerError;
use crate::models::account::{Account, Variable};
use crate::models::config::AutoMaintenanceConfig;
use crate::models::version::VersionRecord;
use crate::storage::kv::KvStore;

/// Global key for the unified account registry
pub const ACCOUNTS_KEY: &str = "accounts";

pub fn variables_key(project_id: &str) -> String {
    format!("vars_{project_id}")
}

pub fn version_key(project_id: &str) -> String {
    format!("version_{project_id}")
}

pub fn config_key(project_id: &str) -> String {
    format!("auto_maintenance_{project_id}")
}

/// Typed repository over the opaque key-value store.
#[derive(Clone)]
pub struct ConfigRepo {
    store: Arc<dyn KvStore>,
}

impl ConfigRepo {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Load the account registry; absent loads as empty.
    pub async fn load_accounts(&self) -> Result<Vec<Account>, ManagerError> {
        match self.store.get(ACCOUNTS_KEY).await? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_accounts(&self, accounts: &[Account]) -> Result<(), ManagerError> {
        let blob = serde_json::to_string(accounts)?;
        self.store.put(ACCOUNTS_KEY, &blob).await
    }

    /// Load a project's variable set; absent loads as empty.
    pub async fn load_variables(&self, project_id: &str) -> Result<Vec<Variable>, ManagerError> {
        match self.store.get(&variables_key(project_id)).await? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_variables(
        &self,
        project_id: &str,
        variables: &[Variable],
    ) -> Result<(), ManagerError> {
        let blob = serde_json::to_string(variables)?;
        self.store.put(&variables_key(project_id), &blob).await
    }

    /// Load a project's version record; absent until the first successful deploy.
    pub async fn load_version(
        &self,
        project_id: &str,
    ) -> Result<Option<VersionRecord>, ManagerError> {
        match self.store.get(&version_key(project_id)).await? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    pub async fn save_version(
        &self,
        project_id: &str,
        record: &VersionRecord,
    ) -> Result<(), ManagerError> {
        let blob = serde_json::to_string(record)?;
        self.store.put(&version_key(project_id), &blob).await
    }

    /// Load a project's auto-maintenance config. `None` means no config has
    /// ever been stored; callers treat that as disabled.
    pub async fn load_config(
        &self,
        project_id: &str,
    ) -> Result<Option<AutoMaintenanceConfig>, ManagerError> {
        match self.store.get(&config_key(project_id)).await? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    pub async fn save_config(
        &self,
        project_id: &str,
        config: &AutoMaintenanceConfig,
    ) -> Result<(), ManagerError> {
        let blob = serde_json::to_string(config)?;
        self.store.put(&config_key(project_id), &blob).await
    }
}
