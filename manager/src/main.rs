//! Fleetkeeper - Entry Point
//!
//! A maintenance manager for fleets of deployed edge worker scripts.
//! Tracks upstream versions, rotates secrets when traffic quotas are
//! breached, and pushes redeployments across all managed accounts.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use fleetkeeper::app::options::{AppOptions, ServerOptions};
use fleetkeeper::app::run::run;
use fleetkeeper::logs::{init_logging, LogOptions};
use fleetkeeper::storage::layout::StorageLayout;
use fleetkeeper::storage::settings::Settings;
use fleetkeeper::utils::version_info;
use fleetkeeper::workers::ticker;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Resolve the storage layout
    let layout = match cli_args.get("data-dir") {
        Some(dir) => StorageLayout::new(dir.clone()),
        None => StorageLayout::default(),
    };

    // Retrieve the settings file; an absent file yields defaults
    let settings = match Settings::load(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: cli_args.contains_key("json-logs"),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // Run the manager
    let options = AppOptions {
        layout,
        endpoints: settings.endpoints.clone(),
        enable_server: settings.enable_server,
        enable_scheduler: settings.enable_scheduler,
        server: ServerOptions {
            host: settings.server.host.clone(),
            port: settings.server.port,
        },
        ticker: ticker::Options {
            interval: Duration::from_secs(settings.tick_interval_secs),
            ..Default::default()
        },
        ..Default::default()
    };

    info!("Running fleetkeeper {} with options: {:?}", version.version, options);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the manager: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
