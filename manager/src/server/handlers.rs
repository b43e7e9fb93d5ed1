//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::ManagerError;
use crate::models::account::{Account, Variable};
use crate::models::config::AutoMaintenanceConfig;
use crate::server::state::ServerState;
use crate::utils::version_info;

fn error_status(e: &ManagerError) -> StatusCode {
    match e {
        ManagerError::UnknownProject(_) => StatusCode::NOT_FOUND,
        ManagerError::Auth(_) => StatusCode::BAD_GATEWAY,
        ManagerError::Network(_) | ManagerError::UpstreamApi { .. } => StatusCode::BAD_GATEWAY,
        ManagerError::Json(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body returned on every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn fail(e: ManagerError) -> (StatusCode, Json<ErrorResponse>) {
    let status = error_status(&e);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "fleetkeeper".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

/// Registered project templates
pub async fn projects_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let templates: Vec<_> = state.ops.registry().iter().collect();
    Json(templates)
}

/// Account registry handler
pub async fn accounts_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let accounts = state.ops.accounts().await.map_err(fail)?;
    Ok(Json(accounts))
}

/// Replace the account registry
pub async fn set_accounts_handler(
    State(state): State<Arc<ServerState>>,
    Json(accounts): Json<Vec<Account>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    state.ops.set_accounts(&accounts).await.map_err(fail)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Project variable set handler
pub async fn variables_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let variables = state.ops.variables(&project_id).await.map_err(fail)?;
    Ok(Json(variables))
}

/// Replace a project's variable set
pub async fn set_variables_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
    Json(variables): Json<Vec<Variable>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    state
        .ops
        .set_variables(&project_id, &variables)
        .await
        .map_err(fail)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Maintenance config handler
pub async fn maintenance_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let config = state
        .ops
        .maintenance_config(&project_id)
        .await
        .map_err(fail)?;
    Ok(Json(config))
}

/// Replace a project's maintenance config
pub async fn set_maintenance_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
    Json(config): Json<AutoMaintenanceConfig>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let stored = state
        .ops
        .set_maintenance_config(&project_id, config)
        .await
        .map_err(fail)?;
    Ok(Json(stored))
}

/// Update check handler
pub async fn update_check_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let comparison = state.ops.check_update(&project_id).await.map_err(fail)?;
    Ok(Json(comparison))
}

/// Deploy request
#[derive(Debug, Default, Deserialize)]
pub struct DeployRequest {
    #[serde(default)]
    pub variables: Vec<Variable>,
}

/// Deploy response
#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub results: Vec<crate::models::deploy::TargetResult>,
}

/// On-demand deploy handler
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
    Json(request): Json<DeployRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let results = state
        .ops
        .deploy(&project_id, request.variables)
        .await
        .map_err(fail)?;
    Ok(Json(DeployResponse { results }))
}

/// Stats handler
pub async fn stats_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let snapshots = state.ops.stats().await.map_err(fail)?;
    Ok(Json(snapshots))
}

/// Tick response
#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub started: bool,
}

/// Trigger an immediate maintenance tick. Runs in the background; the
/// response only acknowledges the start.
pub async fn tick_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.run_tick().await {
            error!("Manual maintenance tick failed: {}", e);
        }
    });

    Json(TickResponse { started: true })
}
