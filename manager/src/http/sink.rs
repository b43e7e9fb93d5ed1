//! Deployment sink client (per-target bindings and version push)

use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::models::account::Account;

/// Module entry point submitted with every pushed version.
const MAIN_MODULE: &str = "index.js";

/// Runtime compatibility date submitted with every pushed version.
const COMPATIBILITY_DATE: &str = "2024-01-01";

/// One runtime binding on a deployed target.
///
/// Only plain-text bindings are ever written by the manager; bindings of
/// other kinds round-trip untouched through `rest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl Binding {
    pub fn plain_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "plain_text".to_string(),
            text: Some(text.into()),
            rest: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BindingsEnvelope {
    #[serde(default)]
    result: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
struct SinkErrorEnvelope {
    #[serde(default)]
    errors: Vec<SinkError>,
}

#[derive(Debug, Deserialize)]
struct SinkError {
    message: String,
}

impl HttpClient {
    fn script_url(&self, account: &Account, target: &str) -> String {
        format!(
            "{}/accounts/{}/workers/scripts/{}",
            self.sink_base_url, account.account_id, target
        )
    }

    /// Fetch the current binding set of one target.
    pub async fn fetch_bindings(
        &self,
        account: &Account,
        target: &str,
    ) -> Result<Vec<Binding>, ManagerError> {
        let url = format!("{}/bindings", self.script_url(account, target));
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&account.api_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(sink_error(response).await);
        }

        let envelope: BindingsEnvelope = response.json().await?;
        Ok(envelope.result)
    }

    /// Submit a new version for one target: script bundle, merged bindings,
    /// and fixed execution metadata.
    pub async fn push_version(
        &self,
        account: &Account,
        target: &str,
        script: &str,
        bindings: Vec<Binding>,
    ) -> Result<(), ManagerError> {
        let url = self.script_url(account, target);
        debug!("PUT {}", url);

        let metadata = json!({
            "main_module": MAIN_MODULE,
            "bindings": bindings,
            "compatibility_date": COMPATIBILITY_DATE,
        });

        let form = Form::new()
            .text("metadata", serde_json::to_string(&metadata)?)
            .part(
                "script",
                Part::bytes(script.as_bytes().to_vec())
                    .file_name(MAIN_MODULE)
                    .mime_str("application/javascript+module")?,
            );

        let response = self
            .client
            .put(&url)
            .bearer_auth(&account.api_token)
            .multipart(form)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(sink_error(response).await)
        }
    }
}

/// Map a non-success sink response to the error taxonomy: credential
/// rejections become `Auth`, everything else `UpstreamApi` with the
/// sink-reported message when one is present.
async fn sink_error(response: Response) -> ManagerError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<SinkErrorEnvelope>(&body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or_else(|| format!("sink returned {}", status));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ManagerError::Auth(message)
    } else {
        ManagerError::upstream(status.as_u16(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_roundtrip_preserves_unknown_fields() {
        let raw = r#"{"name":"KV","type":"kv_namespace","namespace_id":"abc"}"#;
        let binding: Binding = serde_json::from_str(raw).unwrap();
        assert_eq!(binding.kind, "kv_namespace");
        assert!(binding.text.is_none());

        let serialized = serde_json::to_value(&binding).unwrap();
        assert_eq!(serialized["namespace_id"], "abc");
    }

    #[test]
    fn test_plain_text_binding_shape() {
        let binding = Binding::plain_text("UUID", "v1");
        let serialized = serde_json::to_value(&binding).unwrap();
        assert_eq!(serialized["type"], "plain_text");
        assert_eq!(serialized["text"], "v1");
    }
}
