//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::storage::settings::EndpointSettings;
use crate::workers::ticker;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Storage layout paths
    pub layout: StorageLayout,

    /// External API endpoints
    pub endpoints: EndpointSettings,

    /// Enable the local control API server
    pub enable_server: bool,

    /// Enable the scheduled maintenance ticker
    pub enable_scheduler: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Ticker worker options
    pub ticker: ticker::Options,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            layout: StorageLayout::default(),
            endpoints: EndpointSettings::default(),
            enable_server: true,
            enable_scheduler: true,
            server: ServerOptions::default(),
            ticker: ticker::Options::default(),
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Local control API server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}
