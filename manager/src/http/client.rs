//! HTTP client implementation

use reqwest::Client;

use crate::errors::ManagerError;
use crate::storage::settings::EndpointSettings;

/// HTTP client shared by all external API calls.
///
/// Carries the configured endpoints; the per-API request methods live in
/// the sibling modules (`telemetry`, `source`, `sink`).
pub struct HttpClient {
    pub(crate) client: Client,
    pub(crate) sink_base_url: String,
    pub(crate) telemetry_url: String,
    pub(crate) source_api_token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client for the given endpoints.
    pub fn new(endpoints: &EndpointSettings) -> Result<Self, ManagerError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("fleetkeeper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            sink_base_url: endpoints.sink_base_url.trim_end_matches('/').to_string(),
            telemetry_url: endpoints.telemetry_url.clone(),
            source_api_token: endpoints.source_api_token.clone(),
        })
    }
}
