//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::errors::ManagerError;
use crate::logs::LogLevel;

/// Manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Local control API server
    #[serde(default)]
    pub server: ServerSettings,

    /// External API endpoints
    #[serde(default)]
    pub endpoints: EndpointSettings,

    /// Enable the local control API server
    #[serde(default = "default_true")]
    pub enable_server: bool,

    /// Enable the scheduled maintenance ticker
    #[serde(default = "default_true")]
    pub enable_scheduler: bool,

    /// Scheduler tick interval in seconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            server: ServerSettings::default(),
            endpoints: EndpointSettings::default(),
            enable_server: true,
            enable_scheduler: true,
            tick_interval_secs: default_tick_interval(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; an absent file yields defaults.
    pub async fn load(path: &Path) -> Result<Self, ManagerError> {
        match fs::read_to_string(path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Control API server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// External API endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Base URL of the deployment sink API
    #[serde(default = "default_sink_url")]
    pub sink_base_url: String,

    /// URL of the telemetry query API
    #[serde(default = "default_telemetry_url")]
    pub telemetry_url: String,

    /// Optional API token attached to version-source requests
    /// (raises rate limits on the upstream source host)
    #[serde(default)]
    pub source_api_token: Option<String>,
}

fn default_sink_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_telemetry_url() -> String {
    "https://api.cloudflare.com/client/v4/graphql".to_string()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            sink_base_url: default_sink_url(),
            telemetry_url: default_telemetry_url(),
            source_api_token: None,
        }
    }
}
