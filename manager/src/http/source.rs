//! Upstream script and version source clients

use chrono::{DateTime, Utc};
use reqwest::header;
use serde_json::Value;
use tracing::debug;

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::models::version::RemoteRevision;

impl HttpClient {
    /// Download the raw upstream script bundle.
    pub async fn fetch_bundle(&self, url: &str) -> Result<String, ManagerError> {
        debug!("GET {} (bundle)", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::upstream(
                status.as_u16(),
                "bundle download failed".to_string(),
            ));
        }

        Ok(response.text().await?)
    }

    /// Fetch the latest revision metadata from the upstream version source.
    pub async fn fetch_latest_revision(&self, url: &str) -> Result<RemoteRevision, ManagerError> {
        debug!("GET {} (latest revision)", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.source_api_token {
            request = request.header(header::AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ManagerError::upstream(status.as_u16(), body));
        }

        let payload: Value = response.json().await?;
        parse_latest_revision(&payload)
    }
}

/// Extract revision metadata from a version-source response. The source
/// returns either a single commit object or a list with the newest first.
pub fn parse_latest_revision(payload: &Value) -> Result<RemoteRevision, ManagerError> {
    let commit = match payload.as_array() {
        Some(list) => list
            .first()
            .ok_or_else(|| ManagerError::upstream(200, "empty revision list".to_string()))?,
        None => payload,
    };

    let revision = commit
        .get("sha")
        .and_then(Value::as_str)
        .ok_or_else(|| ManagerError::upstream(200, "revision id missing".to_string()))?
        .to_string();

    let timestamp = commit
        .pointer("/commit/committer/date")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    let message = commit
        .pointer("/commit/message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(RemoteRevision {
        revision,
        timestamp,
        message,
    })
}
