//! Notification ingest, health endpoints and the OpenAPI document.
//!
//! Run with: `cargo test -p wordtally-api --test events_test`

mod helpers;

use helpers::{api_path, fingerprint_for, presign, setup_test_app, setup_test_app_with_token, wait_for_terminal};
use wordtally_core::FileStatus;
use wordtally_db::MetadataStore;

#[tokio::test]
async fn test_s3_event_document_triggers_processing() {
    let app = setup_test_app().await;
    let content = b"red fish blue fish";
    let body: serde_json::Value = presign(&app, "owner 1", "my notes.txt", &fingerprint_for("my notes.txt", content))
        .await
        .json();
    let file_id = body["data"]["fileId"].as_str().unwrap().to_string();
    let key = body["data"]["key"].as_str().unwrap().to_string();

    // Write the blob behind the gateway's back, as an external uploader to S3 would.
    app.state
        .blobs
        .storage
        .put_if_absent(&key, content.to_vec().into(), "text/plain")
        .await
        .unwrap();

    let encoded_key = key.replace(' ', "+");
    let response = app
        .client()
        .post(&api_path("/events/blob-created"))
        .json(&serde_json::json!({
            "Records": [
                {
                    "eventName": "ObjectCreated:Put",
                    "s3": {"bucket": {"name": "local"}, "object": {"key": encoded_key}}
                },
                {
                    "eventName": "ObjectRemoved:Delete",
                    "s3": {"bucket": {"name": "local"}, "object": {"key": "uploads/x/y.txt"}}
                }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), 202);
    let accepted: serde_json::Value = response.json();
    assert_eq!(accepted["data"]["accepted"], 1);

    assert_eq!(wait_for_terminal(&app, &file_id).await, FileStatus::Completed);
    let record = app.store.get(&file_id).await.unwrap().unwrap();
    assert_eq!(record.result.unwrap().total_words, 4);
}

#[tokio::test]
async fn test_foreign_and_duplicate_events_are_accepted() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/events/blob-created"))
        .json(&serde_json::json!({"bucket": "local", "key": "not/an/upload.txt"}))
        .await;
    assert_eq!(response.status_code(), 202);

    let garbage = app
        .client()
        .post(&api_path("/events/blob-created"))
        .json(&serde_json::json!({"hello": "world"}))
        .await;
    assert_eq!(garbage.status_code(), 400);
}

#[tokio::test]
async fn test_notification_token_enforced_when_configured() {
    let app = setup_test_app_with_token(Some("hook-secret")).await;
    let event = serde_json::json!({"bucket": "local", "key": "uploads/o/x.txt"});

    let missing = app
        .client()
        .post(&api_path("/events/blob-created"))
        .json(&event)
        .await;
    assert_eq!(missing.status_code(), 401);

    let wrong = app
        .client()
        .post(&api_path("/events/blob-created"))
        .add_header("X-Notification-Token", "nope")
        .json(&event)
        .await;
    assert_eq!(wrong.status_code(), 401);

    let right = app
        .client()
        .post(&api_path("/events/blob-created"))
        .add_header("X-Notification-Token", "hook-secret")
        .json(&event)
        .await;
    assert_eq!(right.status_code(), 202);
}

#[tokio::test]
async fn test_health_and_docs() {
    let app = setup_test_app().await;

    let live = app.client().get("/health/live").await;
    assert_eq!(live.status_code(), 200);

    let ready = app.client().get("/health/ready").await;
    assert_eq!(ready.status_code(), 200);
    let body: serde_json::Value = ready.json();
    assert_eq!(body["metadata_store"], "ready");
    assert_eq!(body["storage"], "ready");

    let spec = app.client().get("/api/openapi.json").await;
    assert_eq!(spec.status_code(), 200);
    let body: serde_json::Value = spec.json();
    assert!(body["paths"]["/api/v0/events/blob-created"].is_object());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get("/health/live")
        .add_header("X-Request-ID", "trace-123")
        .await;
    assert_eq!(response.header("x-request-id"), "trace-123");
}
