//! HTTP surface tests over the in-memory backends, with a real worker
//! runner behind the queue.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::watch;
use tower::ServiceExt;
use uuid::Uuid;

use geosync_api::{AppState, build_router};
use geosync_cache::MemoryCacheProvider;
use geosync_core::config::cache::CacheConfig;
use geosync_core::config::status::StatusConfig;
use geosync_core::config::worker::WorkerConfig;
use geosync_core::config::{AppConfig, DatabaseConfig};
use geosync_core::traits::cache::CacheProvider;
use geosync_core::traits::storage::StorageProvider;
use geosync_database::memory::{MemoryDeltaStore, MemoryJobStore};
use geosync_queue::Dispatcher;
use geosync_queue::backend::MemoryQueueBackend;
use geosync_service::{DeltaApplyCoordinator, StatusAggregator};
use geosync_storage::LocalStorageProvider;
use geosync_worker::capabilities::{
    DeltaApplyCapability, ExportCapability, PingCapability, ProcessProjectFileCapability,
    layers_path,
};
use geosync_worker::{CapabilityTable, WorkerRunner};

struct Harness {
    _dir: tempfile::TempDir,
    app: Router,
    storage: Arc<dyn StorageProvider>,
    cancel: Option<watch::Sender<bool>>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(cancel) = &self.cancel {
            let _ = cancel.send(true);
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server: Default::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_seconds: 1,
            idle_timeout_seconds: 1,
        },
        cache: Default::default(),
        storage: Default::default(),
        worker: Default::default(),
        status: Default::default(),
        logging: Default::default(),
    }
}

async fn harness(with_worker: bool) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage: Arc<dyn StorageProvider> =
        Arc::new(LocalStorageProvider::new(dir.path()).await.unwrap());
    let jobs = Arc::new(MemoryJobStore::new());
    let deltas = Arc::new(MemoryDeltaStore::new());
    let queue = Arc::new(MemoryQueueBackend::new());
    let cache: Arc<dyn CacheProvider> = Arc::new(MemoryCacheProvider::new(&CacheConfig {
        max_capacity: 100,
        time_to_live_seconds: 600,
    }));

    let dispatcher = Arc::new(Dispatcher::new(jobs.clone(), queue.clone()));
    let coordinator = Arc::new(DeltaApplyCoordinator::new(
        jobs.clone(),
        deltas.clone(),
        dispatcher.clone(),
    ));
    let status = Arc::new(StatusAggregator::new(
        dispatcher.clone(),
        jobs.clone(),
        queue.clone(),
        storage.clone(),
        cache,
        StatusConfig {
            cache_ttl_seconds: 600,
            poll_interval_ms: 20,
            max_polls: 51,
        },
    ));

    let cancel = if with_worker {
        let mut table = CapabilityTable::new();
        table.register(Arc::new(ExportCapability::new(storage.clone(), 3)));
        table.register(Arc::new(DeltaApplyCapability::new(
            deltas.clone(),
            storage.clone(),
            3,
        )));
        table.register(Arc::new(ProcessProjectFileCapability::new(
            storage.clone(),
            3,
        )));
        table.register(Arc::new(PingCapability::new()));

        let runner = Arc::new(WorkerRunner::new(
            queue.clone(),
            jobs.clone(),
            Arc::new(table),
            WorkerConfig {
                poll_interval_ms: 10,
                ..WorkerConfig::default()
            },
            "worker-api-test".to_string(),
        ));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move { runner.run(cancel_rx).await });
        Some(cancel_tx)
    } else {
        None
    };

    let state = AppState {
        config: Arc::new(test_config()),
        jobs,
        deltas,
        dispatcher,
        coordinator,
        status,
    };

    Harness {
        _dir: dir,
        app: build_router(state),
        storage,
        cancel,
    }
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn wait_for_job_status(app: &Router, job_id: &str, wanted: &str) -> Value {
    for _ in 0..500 {
        let (status, body) = request(app, "GET", &format!("/api/jobs/{job_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if body["data"]["status"] == wanted {
            return body["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached status '{wanted}'");
}

#[tokio::test]
async fn test_export_job_submission_and_polling() {
    let h = harness(true).await;
    let project_id = Uuid::new_v4();
    h.storage
        .write(
            &layers_path(project_id),
            bytes::Bytes::from(
                serde_json::to_vec(&json!({"road-1": {"version": 1, "attributes": {}}})).unwrap(),
            ),
        )
        .await
        .unwrap();

    let (status, body) = request(
        &h.app,
        "POST",
        "/api/jobs",
        Some(json!({"job_type": "export", "project_id": project_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "queued");

    let job_id = body["data"]["id"].as_str().unwrap().to_string();
    let finished = wait_for_job_status(&h.app, &job_id, "finished").await;
    assert_eq!(finished["output"]["layer_count"], 1);
}

#[tokio::test]
async fn test_unknown_job_type_is_rejected() {
    let h = harness(false).await;
    let (status, body) = request(
        &h.app,
        "POST",
        "/api/jobs",
        Some(json!({"job_type": "render_tiles", "project_id": Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UNSUPPORTED_JOB_TYPE");
}

#[tokio::test]
async fn test_internal_job_types_not_directly_submittable() {
    let h = harness(false).await;
    for job_type in ["delta_apply", "ping"] {
        let (status, _) = request(
            &h.app,
            "POST",
            "/api/jobs",
            Some(json!({"job_type": job_type, "project_id": Uuid::new_v4()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_delta_submission_and_apply_flow() {
    let h = harness(true).await;
    let project_id = Uuid::new_v4();

    let (status, body) = request(
        &h.app,
        "POST",
        &format!("/api/projects/{project_id}/deltas"),
        Some(json!({
            "changes": [{"feature_id": "well-1", "base_version": 0, "attributes": {"depth_m": 12}}],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["last_status"], "pending");

    let (status, body) = request(
        &h.app,
        "POST",
        &format!("/api/projects/{project_id}/deltas/apply"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = body["data"]["id"].as_str().unwrap().to_string();

    let finished = wait_for_job_status(&h.app, &job_id, "finished").await;
    assert_eq!(finished["output"]["applied"], 1);

    // Everything applied: a fresh apply has nothing to do.
    let (status, _) = request(
        &h.app,
        "POST",
        &format!("/api/projects/{project_id}/deltas/apply"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_apply_requests_share_one_in_flight_job() {
    // No worker: the first apply job stays queued, so the second request
    // must return the same record instead of creating another.
    let h = harness(false).await;
    let project_id = Uuid::new_v4();

    request(
        &h.app,
        "POST",
        &format!("/api/projects/{project_id}/deltas"),
        Some(json!({
            "changes": [{"feature_id": "a", "base_version": 0, "attributes": {}}],
        })),
    )
    .await;

    let (_, first) = request(
        &h.app,
        "POST",
        &format!("/api/projects/{project_id}/deltas/apply"),
        Some(json!({})),
    )
    .await;
    let (_, second) = request(
        &h.app,
        "POST",
        &format!("/api/projects/{project_id}/deltas/apply"),
        Some(json!({})),
    )
    .await;
    assert_eq!(first["data"]["id"], second["data"]["id"]);
}

#[tokio::test]
async fn test_malformed_delta_rejected() {
    let h = harness(false).await;
    let project_id = Uuid::new_v4();
    let (status, body) = request(
        &h.app,
        "POST",
        &format!("/api/projects/{project_id}/deltas"),
        Some(json!({"changes": {"not": "a list"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_cancel_queued_job() {
    let h = harness(false).await;
    let (_, body) = request(
        &h.app,
        "POST",
        "/api/jobs",
        Some(json!({"job_type": "export", "project_id": Uuid::new_v4()})),
    )
    .await;
    let job_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = request(&h.app, "POST", &format!("/api/jobs/{job_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&h.app, "GET", &format!("/api/jobs/{job_id}"), None).await;
    assert_eq!(body["data"]["status"], "stopped");

    // A stopped job cannot be stopped again.
    let (status, _) = request(&h.app, "POST", &format!("/api/jobs/{job_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_job_is_404() {
    let h = harness(false).await;
    let (status, body) = request(
        &h.app,
        "GET",
        &format!("/api/jobs/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_endpoint_healthy() {
    let h = harness(true).await;
    let (status, body) = request(&h.app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue"], "ok");
    assert_eq!(body["storage"], "ok");
}

#[tokio::test]
async fn test_project_job_listing_paginates() {
    let h = harness(false).await;
    let project_id = Uuid::new_v4();
    for _ in 0..3 {
        // Dedup does not apply to export jobs: each submission is fresh.
        request(
            &h.app,
            "POST",
            "/api/jobs",
            Some(json!({"job_type": "export", "project_id": project_id})),
        )
        .await;
    }

    let (status, body) = request(
        &h.app,
        "GET",
        &format!("/api/projects/{project_id}/jobs?page=1&page_size=2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_pages"], 2);
}
