//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::ManagerError;
use crate::server::handlers::{
    accounts_handler, deploy_handler, health_handler, maintenance_handler, projects_handler,
    set_accounts_handler, set_maintenance_handler, set_variables_handler, stats_handler,
    tick_handler, update_check_handler, variables_handler, version_handler,
};
use crate::server::state::ServerState;

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ManagerError>>, ManagerError> {
    let app = Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Registry and accounts
        .route("/projects", get(projects_handler))
        .route("/accounts", get(accounts_handler).post(set_accounts_handler))
        // Per-project configuration
        .route(
            "/projects/{id}/variables",
            get(variables_handler).post(set_variables_handler),
        )
        .route(
            "/projects/{id}/maintenance",
            get(maintenance_handler).post(set_maintenance_handler),
        )
        // Maintenance operations
        .route("/projects/{id}/update-check", get(update_check_handler))
        .route("/projects/{id}/deploy", post(deploy_handler))
        .route("/stats", get(stats_handler))
        .route("/maintenance/tick", post(tick_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ManagerError::Server(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ManagerError::Server(e.to_string()))
    });

    Ok(handle)
}
