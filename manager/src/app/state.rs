//! Application state management

use std::sync::Arc;

use tokio::fs;
use tracing::info;

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::maintenance::orchestrator::Orchestrator;
use crate::ops::Operations;
use crate::registry;
use crate::storage::kv::FileKvStore;
use crate::storage::layout::StorageLayout;
use crate::storage::repo::ConfigRepo;
use crate::storage::settings::EndpointSettings;

/// Main application state
pub struct AppState {
    /// HTTP client shared by all external calls
    pub http_client: Arc<HttpClient>,

    /// Typed configuration repository
    pub repo: ConfigRepo,

    /// On-demand operations facade
    pub ops: Operations,

    /// Scheduled maintenance orchestrator
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Initialize application state
    pub async fn init(
        layout: &StorageLayout,
        endpoints: &EndpointSettings,
    ) -> Result<Self, ManagerError> {
        info!("Initializing application state...");

        fs::create_dir_all(layout.kv_dir()).await?;

        let store = Arc::new(FileKvStore::new(layout.kv_dir()));
        let repo = ConfigRepo::new(store);

        let http_client = Arc::new(HttpClient::new(endpoints)?);

        let registry = registry::builtin();
        let ops = Operations::new(http_client.clone(), repo.clone(), registry);
        let orchestrator = Arc::new(Orchestrator::new(
            http_client.clone(),
            repo.clone(),
            registry,
        ));

        Ok(Self {
            http_client,
            repo,
            ops,
            orchestrator,
        })
    }
}
