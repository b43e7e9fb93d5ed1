//! Telemetry API client (per-account usage queries)

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::models::account::Account;

/// Usage query: account-wide request total plus a per-target grouped
/// breakdown for the same window.
const USAGE_QUERY: &str = r#"
query getBillingMetrics($AccountID: String!, $filter: AccountWorkersInvocationsAdaptiveFilter_InputObject) {
  viewer {
    accounts(filter: {accountTag: $AccountID}) {
      workersInvocationsAdaptive(limit: 10000, filter: $filter) { sum { requests } }
      workersInvocationsAdaptiveGroups(limit: 1000, filter: $filter) {
        dimensions { scriptName }
        sum { requests }
      }
    }
  }
}
"#;

/// Usage figures for one account over one window.
#[derive(Debug, Clone)]
pub struct AccountUsage {
    pub total: u64,
    pub breakdown: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    data: Option<UsageData>,
    #[serde(default)]
    errors: Vec<QueryError>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    #[serde(default)]
    accounts: Vec<AccountMetrics>,
}

#[derive(Debug, Deserialize)]
struct AccountMetrics {
    #[serde(rename = "workersInvocationsAdaptive", default)]
    totals: Vec<RequestGroup>,

    #[serde(rename = "workersInvocationsAdaptiveGroups", default)]
    groups: Vec<BreakdownGroup>,
}

#[derive(Debug, Deserialize)]
struct RequestGroup {
    sum: RequestSum,
}

#[derive(Debug, Deserialize)]
struct RequestSum {
    #[serde(default)]
    requests: u64,
}

#[derive(Debug, Deserialize)]
struct BreakdownGroup {
    dimensions: Option<GroupDimensions>,
    sum: RequestSum,
}

#[derive(Debug, Deserialize)]
struct GroupDimensions {
    #[serde(rename = "scriptName")]
    script_name: Option<String>,
}

impl HttpClient {
    /// Query one account's usage for the window `[start, end)`.
    ///
    /// When `detailed` is false the per-target breakdown is left empty.
    pub async fn fetch_account_usage(
        &self,
        account: &Account,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        detailed: bool,
    ) -> Result<AccountUsage, ManagerError> {
        debug!("POST {} (usage for {})", self.telemetry_url, account.alias);

        let body = json!({
            "query": USAGE_QUERY,
            "variables": {
                "AccountID": account.account_id,
                "filter": {
                    "datetime_geq": window_start.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "datetime_leq": window_end.to_rfc3339_opts(SecondsFormat::Millis, true),
                }
            }
        });

        let response = self
            .client
            .post(&self.telemetry_url)
            .bearer_auth(&account.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ManagerError::upstream(status.as_u16(), body));
        }

        let payload: UsageResponse = response.json().await?;
        extract_usage(payload, detailed)
    }
}

fn extract_usage(payload: UsageResponse, detailed: bool) -> Result<AccountUsage, ManagerError> {
    if let Some(error) = payload.errors.into_iter().next() {
        return Err(ManagerError::upstream(200, error.message));
    }

    let metrics = payload
        .data
        .and_then(|d| d.viewer.accounts.into_iter().next())
        .ok_or_else(|| ManagerError::upstream(200, "no usage data returned".to_string()))?;

    let total = metrics.totals.iter().map(|g| g.sum.requests).sum();

    let mut breakdown = HashMap::new();
    if detailed {
        for group in metrics.groups {
            if let Some(name) = group.dimensions.and_then(|d| d.script_name) {
                breakdown.insert(name, group.sum.requests);
            }
        }
    }

    Ok(AccountUsage { total, breakdown })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> UsageResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_usage_totals_and_breakdown() {
        let response = payload(
            r#"{
                "data": {"viewer": {"accounts": [{
                    "workersInvocationsAdaptive": [{"sum": {"requests": 100}}, {"sum": {"requests": 20}}],
                    "workersInvocationsAdaptiveGroups": [
                        {"dimensions": {"scriptName": "edge-1"}, "sum": {"requests": 80}},
                        {"dimensions": {"scriptName": "edge-2"}, "sum": {"requests": 40}},
                        {"dimensions": null, "sum": {"requests": 5}}
                    ]
                }]}}
            }"#,
        );

        let usage = extract_usage(response, true).unwrap();
        assert_eq!(usage.total, 120);
        assert_eq!(usage.breakdown.get("edge-1"), Some(&80));
        assert_eq!(usage.breakdown.get("edge-2"), Some(&40));
        assert_eq!(usage.breakdown.len(), 2);
    }

    #[test]
    fn test_extract_usage_skips_breakdown_when_not_detailed() {
        let response = payload(
            r#"{
                "data": {"viewer": {"accounts": [{
                    "workersInvocationsAdaptive": [{"sum": {"requests": 7}}],
                    "workersInvocationsAdaptiveGroups": [
                        {"dimensions": {"scriptName": "edge-1"}, "sum": {"requests": 7}}
                    ]
                }]}}
            }"#,
        );

        let usage = extract_usage(response, false).unwrap();
        assert_eq!(usage.total, 7);
        assert!(usage.breakdown.is_empty());
    }

    #[test]
    fn test_extract_usage_surfaces_query_errors() {
        let response = payload(r#"{"data": null, "errors": [{"message": "bad token"}]}"#);
        let err = extract_usage(response, true).unwrap_err();
        assert!(err.to_string().contains("bad token"));
    }

    #[test]
    fn test_extract_usage_requires_account_data() {
        let response = payload(r#"{"data": {"viewer": {"accounts": []}}}"#);
        assert!(extract_usage(response, true).is_err());
    }
}
