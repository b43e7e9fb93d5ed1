//! Upstream version comparison

use tracing::debug;

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::models::version::VersionComparison;
use crate::registry::ProjectTemplate;
use crate::storage::repo::ConfigRepo;

/// Compare the persisted version record against the upstream source.
/// Read-only: nothing is persisted here, even on success.
pub async fn check_update(
    http: &HttpClient,
    template: &ProjectTemplate,
    repo: &ConfigRepo,
) -> Result<VersionComparison, ManagerError> {
    let local = repo.load_version(&template.id).await?;
    let remote = http.fetch_latest_revision(&template.version_url).await?;

    debug!(
        "Version check for {}: local={:?} remote={}",
        template.id,
        local.as_ref().map(|r| r.revision.as_str()),
        remote.revision
    );

    Ok(VersionComparison { local, remote })
}
