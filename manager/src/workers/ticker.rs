//! Scheduler ticker worker
//!
//! Wakes on a fixed interval and triggers one maintenance tick. Each tick
//! runs in its own task so a slow deploy never delays the schedule; the
//! per-project rate limit keeps overlapping ticks harmless.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::maintenance::orchestrator::Orchestrator;

/// Ticker worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Interval between maintenance ticks
    pub interval: Duration,

    /// Initial delay before the first tick
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            initial_delay: Duration::from_secs(10),
        }
    }
}

/// Run the ticker worker
pub async fn run<S, F>(
    options: &Options,
    orchestrator: Arc<Orchestrator>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Ticker worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Ticker worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with tick
            }
        }

        debug!("Triggering maintenance tick...");

        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run_tick().await {
                error!("Maintenance tick failed: {}", e);
            }
        });
    }
}
