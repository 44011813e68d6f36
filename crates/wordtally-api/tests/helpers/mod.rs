#![allow(dead_code)]

//! Test helpers: build the application against the in-memory metadata store and
//! local storage in a temp directory.
//!
//! Run from workspace root: `cargo test -p wordtally-api`.

use axum_test::{TestResponse, TestServer};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wordtally_api::constants;
use wordtally_api::setup::{routes, services};
use wordtally_api::state::{AppState, StorageState};
use wordtally_core::{
    fingerprint, BaseConfig, Config, FileStatus, MetadataBackend, ServiceConfig, StorageBackend,
};
use wordtally_db::InMemoryMetadataStore;
use wordtally_storage::{LocalStorage, Storage, UploadSigner};
use wordtally_worker::NotificationWorker;

pub const TEST_SIGNING_SECRET: &str = "test-signing-secret-0123456789abcdef";
pub const TEST_BASE_URL: &str = "http://localhost";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, shared state and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: InMemoryMetadataStore,
    pub worker: NotificationWorker,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn create_test_config(storage_path: &str, notification_token: Option<&str>) -> Config {
    Config(Box::new(ServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            log_format: "compact".to_string(),
        },
        metadata_backend: MetadataBackend::Memory,
        database_url: None,
        db_max_connections: 5,
        db_timeout_seconds: 5,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(storage_path.to_string()),
        local_storage_base_url: Some(format!("{}{}", TEST_BASE_URL, api_path("/blobs"))),
        upload_signing_secret: Some(TEST_SIGNING_SECRET.to_string()),
        upload_url_ttl_secs: 300,
        max_upload_size_bytes: 1024 * 1024,
        worker_max_concurrency: 4,
        worker_queue_capacity: 64,
        projection_max_attempts: 3,
        notification_token: notification_token.map(String::from),
    }))
}

/// Setup test app with an in-memory store and local storage.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_token(None).await
}

pub async fn setup_test_app_with_token(notification_token: Option<&str>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().to_string_lossy().to_string();
    let config = create_test_config(&storage_path, notification_token);

    let signer = UploadSigner::new(TEST_SIGNING_SECRET);
    let local = LocalStorage::new(
        temp_dir.path(),
        config
            .local_storage_base_url()
            .expect("base url configured")
            .to_string(),
        signer.clone(),
    )
    .await
    .expect("Failed to create local storage");
    let storage: Arc<dyn Storage> = Arc::new(local);

    let store = InMemoryMetadataStore::new();
    let (state, worker) = services::initialize_services(
        &config,
        Arc::new(store.clone()),
        StorageState {
            storage,
            gateway_signer: Some(signer),
        },
    );

    let app = routes::setup_routes(&config, state.clone())
        .await
        .expect("Failed to build routes");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        state,
        store,
        worker,
        _temp_dir: temp_dir,
    }
}

/// Fingerprint for a named file of `content`, as a client would compute it.
pub fn fingerprint_for(file_name: &str, content: &[u8]) -> String {
    fingerprint(file_name, content.len() as u64, 1_700_000_000_000)
}

pub async fn presign(
    app: &TestApp,
    owner_id: &str,
    file_name: &str,
    fingerprint_hash: &str,
) -> TestResponse {
    app.client()
        .post(&api_path("/uploads/presign"))
        .json(&serde_json::json!({
            "fileName": file_name,
            "contentType": "text/plain",
            "ownerId": owner_id,
            "fingerprintHash": fingerprint_hash,
        }))
        .await
}

/// PUT `content` to an issued upload URL through the in-process gateway.
pub async fn put_to_upload_url(app: &TestApp, upload_url: &str, content: &[u8]) -> TestResponse {
    let relative = upload_url
        .strip_prefix(TEST_BASE_URL)
        .expect("upload URL points at the test gateway");
    let (path, query) = relative.split_once('?').expect("signed URL has a query");

    let mut request = app
        .client()
        .put(path)
        .content_type("text/plain")
        .bytes(content.to_vec().into());
    for pair in query.split('&') {
        let (name, value) = pair.split_once('=').expect("query pair");
        request = request.add_query_param(name, value);
    }
    request.await
}

/// Register and upload a file; returns its file id.
pub async fn upload_file(app: &TestApp, owner_id: &str, file_name: &str, content: &[u8]) -> String {
    let response = presign(app, owner_id, file_name, &fingerprint_for(file_name, content)).await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let upload_url = body["data"]["uploadUrl"].as_str().unwrap().to_string();
    let file_id = body["data"]["fileId"].as_str().unwrap().to_string();

    let put = put_to_upload_url(app, &upload_url, content).await;
    assert_eq!(put.status_code(), 201);
    file_id
}

/// Poll the primary record until it reaches a terminal status.
pub async fn wait_for_terminal(app: &TestApp, file_id: &str) -> FileStatus {
    use wordtally_db::MetadataStore;

    for _ in 0..200 {
        if let Some(record) = app.store.get(file_id).await.unwrap() {
            if matches!(record.status, FileStatus::Completed | FileStatus::Failed) {
                return record.status;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("file {} never reached a terminal status", file_id);
}
