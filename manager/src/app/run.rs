//! Main application run loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::app::state::AppState;
use crate::errors::ManagerError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::ticker;

/// Run the fleet manager
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ManagerError> {
    info!("Initializing fleet manager...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.max_shutdown_delay);

    if let Err(e) = init(&options, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start manager: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    // Shutdown
    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), ManagerError> {
    let app_state = Arc::new(AppState::init(&options.layout, &options.endpoints).await?);

    if options.enable_server {
        init_server(
            options,
            app_state.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    if options.enable_scheduler {
        init_ticker_worker(
            options.ticker.clone(),
            app_state.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    Ok(())
}

async fn init_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ManagerError> {
    info!("Initializing local control API server...");

    let server_state = ServerState::new(app_state.ops.clone(), app_state.orchestrator.clone());

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)?;
    Ok(())
}

fn init_ticker_worker(
    options: ticker::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ManagerError> {
    info!("Initializing ticker worker...");

    let orchestrator = app_state.orchestrator.clone();

    let ticker_handle = tokio::spawn(async move {
        ticker::run(
            &options,
            orchestrator,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_ticker_worker_handle(ticker_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    max_shutdown_delay: Duration,
    server_handle: Option<JoinHandle<Result<(), ManagerError>>>,
    ticker_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, max_shutdown_delay: Duration) -> Self {
        Self {
            shutdown_tx,
            max_shutdown_delay,
            server_handle: None,
            ticker_worker_handle: None,
        }
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), ManagerError>>,
    ) -> Result<(), ManagerError> {
        if self.server_handle.is_some() {
            return Err(ManagerError::Shutdown("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub fn with_ticker_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), ManagerError> {
        if self.ticker_worker_handle.is_some() {
            return Err(ManagerError::Shutdown("ticker_handle already set".to_string()));
        }
        self.ticker_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ManagerError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(self.max_shutdown_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ManagerError> {
        info!("Shutting down fleet manager...");

        // 1. Ticker worker
        if let Some(handle) = self.ticker_worker_handle.take() {
            handle
                .await
                .map_err(|e| ManagerError::Shutdown(e.to_string()))?;
        }

        // 2. Control API server
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| ManagerError::Shutdown(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
