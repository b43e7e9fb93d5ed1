//! Deploy pipeline tests against a local mock of the sink and source APIs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use fleetkeeper::http::client::HttpClient;
use fleetkeeper::maintenance::deploy::deploy_project;
use fleetkeeper::maintenance::orchestrator::{Orchestrator, TickOutcome};
use fleetkeeper::models::account::{Account, Variable};
use fleetkeeper::models::config::AutoMaintenanceConfig;
use fleetkeeper::models::version::VersionRecord;
use fleetkeeper::registry::{ProjectRegistry, ProjectTemplate};
use fleetkeeper::storage::kv::{FileKvStore, KvStore};
use fleetkeeper::storage::repo::ConfigRepo;
use fleetkeeper::storage::settings::EndpointSettings;

const REVISION: &str = "abc123def";

#[derive(Default)]
struct MockState {
    pushed: Mutex<Vec<String>>,
}

async fn bundle_handler() -> &'static str {
    "export default {};"
}

async fn commits_handler() -> impl IntoResponse {
    Json(json!({
        "sha": REVISION,
        "commit": {
            "committer": {"date": "2024-05-01T12:00:00Z"},
            "message": "upstream fix"
        }
    }))
}

async fn bindings_handler(
    Path((_account_id, _target)): Path<(String, String)>,
) -> impl IntoResponse {
    Json(json!({
        "result": [
            {"name": "PATH", "type": "plain_text", "text": "/sub"}
        ]
    }))
}

async fn push_handler(
    State(state): State<Arc<MockState>>,
    Path((_account_id, target)): Path<(String, String)>,
) -> impl IntoResponse {
    if target == "bad" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"errors": [{"message": "boom"}]})),
        );
    }

    state.pushed.lock().unwrap().push(target);
    (StatusCode::OK, Json(json!({"success": true})))
}

/// Start the mock server; returns its base URL and the recorded pushes.
async fn start_mock() -> (String, Arc<MockState>) {
    let state = Arc::new(MockState::default());

    let app = Router::new()
        .route("/bundle", get(bundle_handler))
        .route("/commits", get(commits_handler))
        .route(
            "/client/accounts/{account_id}/workers/scripts/{target}/bindings",
            get(bindings_handler),
        )
        .route(
            "/client/accounts/{account_id}/workers/scripts/{target}",
            axum::routing::put(push_handler),
        )
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn mock_client(base: &str) -> Arc<HttpClient> {
    let endpoints = EndpointSettings {
        sink_base_url: format!("{base}/client"),
        telemetry_url: format!("{base}/graphql"),
        source_api_token: None,
    };
    Arc::new(HttpClient::new(&endpoints).unwrap())
}

fn mock_template(base: &str) -> ProjectTemplate {
    ProjectTemplate {
        id: "demo".to_string(),
        name: "Demo".to_string(),
        script_url: format!("{base}/bundle"),
        version_url: format!("{base}/commits"),
        default_vars: vec!["UUID".to_string()],
        secret_field: "UUID".to_string(),
        compat_prelude: None,
    }
}

fn temp_store() -> Arc<FileKvStore> {
    let dir = std::env::temp_dir().join(format!("fleetkeeper-test-{}", uuid::Uuid::new_v4()));
    Arc::new(FileKvStore::new(dir))
}

fn temp_repo() -> ConfigRepo {
    ConfigRepo::new(temp_store())
}

fn account(alias: &str, targets: &[&str]) -> Account {
    let mut map = BTreeMap::new();
    map.insert(
        "demo".to_string(),
        targets.iter().map(|t| t.to_string()).collect(),
    );
    Account {
        alias: alias.to_string(),
        account_id: format!("id-{alias}"),
        api_token: "token".to_string(),
        targets: map,
    }
}

#[tokio::test]
async fn test_deploy_updates_all_targets_and_records_version() {
    let (base, mock) = start_mock().await;
    let http = mock_client(&base);
    let repo = temp_repo();
    let template = mock_template(&base);

    let accounts = [account("a", &["edge-1", "edge-2"])];
    let variables = [Variable {
        key: "UUID".to_string(),
        value: "secret-1".to_string(),
    }];

    let results = deploy_project(&http, &repo, &template, &variables, &accounts)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(mock.pushed.lock().unwrap().len(), 2);

    let record = repo.load_version("demo").await.unwrap().unwrap();
    assert_eq!(record.revision, REVISION);
}

#[tokio::test]
async fn test_one_failing_target_does_not_stop_the_run() {
    let (base, mock) = start_mock().await;
    let http = mock_client(&base);
    let repo = temp_repo();
    let template = mock_template(&base);

    let accounts = [account("a", &["edge-1", "bad", "edge-2"])];

    let results = deploy_project(&http, &repo, &template, &[], &accounts)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].message.contains("boom"));
    assert!(results[2].success);
    assert_eq!(mock.pushed.lock().unwrap().len(), 2);

    // At least one attempt happened and the revision is known.
    let record = repo.load_version("demo").await.unwrap().unwrap();
    assert_eq!(record.revision, REVISION);
}

#[tokio::test]
async fn test_all_failing_targets_leave_version_unchanged() {
    let (base, mock) = start_mock().await;
    let http = mock_client(&base);
    let repo = temp_repo();
    let template = mock_template(&base);

    repo.save_version(
        "demo",
        &VersionRecord {
            revision: "previous".to_string(),
            deploy_date: chrono::Utc::now(),
        },
    )
    .await
    .unwrap();

    // Every assigned target rejects the push.
    let accounts = [account("a", &["bad"])];

    let results = deploy_project(&http, &repo, &template, &[], &accounts)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(mock.pushed.lock().unwrap().is_empty());

    // The upstream revision was not deployed anywhere; the prior record
    // stays so the next check retries it.
    let record = repo.load_version("demo").await.unwrap().unwrap();
    assert_eq!(record.revision, "previous");
}

#[tokio::test]
async fn test_failed_redeploy_still_advances_last_check() {
    let (base, _mock) = start_mock().await;
    let http = mock_client(&base);
    let store = temp_store();
    let repo = ConfigRepo::new(store.clone());
    let registry: &'static ProjectRegistry =
        Box::leak(Box::new(ProjectRegistry::new(vec![mock_template(&base)])));
    let template = registry.get("demo").unwrap();

    // The variable blob is unreadable, so the redeploy errors out after
    // the version check found an update.
    store.put("vars_demo", "{not json").await.unwrap();

    let config = AutoMaintenanceConfig {
        enabled: true,
        interval: 1,
        fuse_threshold: 0,
        last_check: 0,
        ..Default::default()
    };
    repo.save_config("demo", &config).await.unwrap();

    let orchestrator = Orchestrator::new(http, repo.clone(), registry);
    let accounts = [account("a", &["edge-1"])];

    let outcome = orchestrator
        .tick_project(template, &accounts, &[])
        .await
        .unwrap();
    assert_eq!(outcome, TickOutcome::VersionStale);

    let stored = repo.load_config("demo").await.unwrap().unwrap();
    assert!(stored.last_check > 0);

    // The failed run counts as a check and is rate-limited like any other.
    let outcome = orchestrator
        .tick_project(template, &accounts, &[])
        .await
        .unwrap();
    assert_eq!(outcome, TickOutcome::RateLimited);
}

#[tokio::test]
async fn test_tick_deploys_on_stale_version() {
    let (base, mock) = start_mock().await;
    let http = mock_client(&base);
    let repo = temp_repo();
    let registry: &'static ProjectRegistry =
        Box::leak(Box::new(ProjectRegistry::new(vec![mock_template(&base)])));
    let template = registry.get("demo").unwrap();

    repo.save_version(
        "demo",
        &VersionRecord {
            revision: "stale".to_string(),
            deploy_date: chrono::Utc::now(),
        },
    )
    .await
    .unwrap();

    let config = AutoMaintenanceConfig {
        enabled: true,
        interval: 1,
        fuse_threshold: 0,
        last_check: 0,
        ..Default::default()
    };
    repo.save_config("demo", &config).await.unwrap();

    let orchestrator = Orchestrator::new(http, repo.clone(), registry);
    let accounts = [account("a", &["edge-1"])];

    let outcome = orchestrator
        .tick_project(template, &accounts, &[])
        .await
        .unwrap();
    assert_eq!(outcome, TickOutcome::VersionStale);
    assert_eq!(mock.pushed.lock().unwrap().len(), 1);

    let record = repo.load_version("demo").await.unwrap().unwrap();
    assert_eq!(record.revision, REVISION);

    // Re-arm the schedule; the revision now matches upstream.
    let mut config = repo.load_config("demo").await.unwrap().unwrap();
    config.last_check = 0;
    repo.save_config("demo", &config).await.unwrap();

    let outcome = orchestrator
        .tick_project(template, &accounts, &[])
        .await
        .unwrap();
    assert_eq!(outcome, TickOutcome::UpToDate);
    assert_eq!(mock.pushed.lock().unwrap().len(), 1);
}
