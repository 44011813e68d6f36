//! Owner history, single-record reads and deletes.
//!
//! Run with: `cargo test -p wordtally-api --test analytics_test`

mod helpers;

use helpers::{api_path, setup_test_app, upload_file, wait_for_terminal};
use wordtally_core::{FileRecord, FileStatus, OwnerFileEntry, StorageLocation};
use wordtally_db::MetadataStore;

#[tokio::test]
async fn test_listing_requires_matching_owner_header() {
    let app = setup_test_app().await;

    let missing = app
        .client()
        .get(&api_path("/owners/owner-1/analytics"))
        .await;
    assert_eq!(missing.status_code(), 400);

    let other = app
        .client()
        .get(&api_path("/owners/owner-1/analytics"))
        .add_header("X-Owner-Id", "owner-2")
        .await;
    assert_eq!(other.status_code(), 403);
    let body: serde_json::Value = other.json();
    assert_eq!(body["error"]["code"], "Forbidden");

    let own = app
        .client()
        .get(&api_path("/owners/owner-1/analytics"))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(own.status_code(), 200);
    let body: serde_json::Value = own.json();
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_listing_is_newest_first_with_conditional_fields() {
    let app = setup_test_app().await;

    let good = upload_file(&app, "owner-1", "good.txt", b"alpha beta alpha").await;
    assert_eq!(wait_for_terminal(&app, &good).await, FileStatus::Completed);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let bad = upload_file(&app, "owner-1", "bad.txt", b"caf\xc3").await;
    assert_eq!(wait_for_terminal(&app, &bad).await, FileStatus::Failed);

    // Let the worker's final projection land before reading the owner view.
    for file_id in [&good, &bad] {
        for _ in 0..100 {
            let primary = app.store.get(file_id).await.unwrap().unwrap();
            let entry = app.store.get_owner_entry("owner-1", file_id).await.unwrap();
            if entry.is_some_and(|e| e.mirrors(&primary)) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    let response = app
        .client()
        .get(&api_path("/owners/owner-1/analytics"))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["fileId"], bad.as_str());
    assert_eq!(items[0]["status"], "FAILED");
    assert!(items[0]["errorMessage"]
        .as_str()
        .unwrap()
        .contains("Truncated UTF-8"));
    assert!(items[0].get("result").is_none());

    assert_eq!(items[1]["fileId"], good.as_str());
    assert_eq!(items[1]["status"], "COMPLETED");
    assert_eq!(items[1]["originalFileName"], "good.txt");
    assert_eq!(items[1]["result"]["totalWords"], 3);
    assert_eq!(items[1]["result"]["uniqueWords"], 2);
    assert_eq!(
        items[1]["result"]["top10Words"][0],
        serde_json::json!({"word": "alpha", "count": 2})
    );
    assert!(items[1].get("errorMessage").is_none());
}

#[tokio::test]
async fn test_get_single_record() {
    let app = setup_test_app().await;
    let file_id = upload_file(&app, "owner-1", "one.txt", b"one").await;
    wait_for_terminal(&app, &file_id).await;

    let own = app
        .client()
        .get(&api_path(&format!("/analytics/{}", file_id)))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(own.status_code(), 200);
    let body: serde_json::Value = own.json();
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert_eq!(body["data"]["result"]["totalWords"], 1);

    let foreign = app
        .client()
        .get(&api_path(&format!("/analytics/{}", file_id)))
        .add_header("X-Owner-Id", "owner-2")
        .await;
    assert_eq!(foreign.status_code(), 403);

    let missing = app
        .client()
        .get(&api_path(&format!("/analytics/{}", "0".repeat(64))))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(missing.status_code(), 404);
}

#[tokio::test]
async fn test_delete_checks_owner_and_removes_everything() {
    let app = setup_test_app().await;
    let file_id = upload_file(&app, "owner-1", "gone.txt", b"bye bye").await;
    wait_for_terminal(&app, &file_id).await;
    let key = app.store.get(&file_id).await.unwrap().unwrap().storage.key;

    let foreign = app
        .client()
        .delete(&api_path(&format!("/analytics/{}", file_id)))
        .add_header("X-Owner-Id", "owner-2")
        .await;
    assert_eq!(foreign.status_code(), 403);
    assert!(app.store.get(&file_id).await.unwrap().is_some());

    let own = app
        .client()
        .delete(&api_path(&format!("/analytics/{}", file_id)))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(own.status_code(), 204);

    assert!(app.store.get(&file_id).await.unwrap().is_none());
    assert!(app
        .store
        .get_owner_entry("owner-1", &file_id)
        .await
        .unwrap()
        .is_none());
    assert!(!app.state.blobs.storage.exists(&key).await.unwrap());

    let again = app
        .client()
        .delete(&api_path(&format!("/analytics/{}", file_id)))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(again.status_code(), 204);
}

fn orphaned_entry(owner_id: &str, file_id: &str) -> OwnerFileEntry {
    OwnerFileEntry {
        owner_id: owner_id.to_string(),
        file_id: file_id.to_string(),
        original_file_name: "left-behind.txt".to_string(),
        status: FileStatus::Pending,
        created_at: 1,
        updated_at: 1,
        result: None,
        error_message: None,
    }
}

#[tokio::test]
async fn test_delete_clears_entry_without_primary_record() {
    let app = setup_test_app().await;
    let file_id = "e".repeat(64);
    app.store
        .insert_orphaned_owner_entry(orphaned_entry("owner-1", &file_id))
        .await;

    let response = app
        .client()
        .delete(&api_path(&format!("/analytics/{}", file_id)))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(response.status_code(), 204);
    assert!(app.store.list_by_owner("owner-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reconcile_repairs_owner_history() {
    let app = setup_test_app().await;
    let uploaded = upload_file(&app, "owner-1", "kept.txt", b"kept words").await;
    wait_for_terminal(&app, &uploaded).await;

    // Registered without its owner entry, plus an entry whose record is gone.
    let unlisted = "c".repeat(64);
    app.store
        .create_pending(&FileRecord::pending(
            unlisted.clone(),
            "owner-1".to_string(),
            "d".repeat(64),
            StorageLocation {
                bucket: "local".to_string(),
                key: format!("uploads/owner-1/{}-unlisted.txt", unlisted),
            },
            "unlisted.txt".to_string(),
            "text/plain".to_string(),
            5,
        ))
        .await
        .unwrap();
    let orphan = "e".repeat(64);
    app.store
        .insert_orphaned_owner_entry(orphaned_entry("owner-1", &orphan))
        .await;

    let foreign = app
        .client()
        .post(&api_path("/owners/owner-1/analytics/reconcile"))
        .add_header("X-Owner-Id", "owner-2")
        .await;
    assert_eq!(foreign.status_code(), 403);

    let response = app
        .client()
        .post(&api_path("/owners/owner-1/analytics/reconcile"))
        .add_header("X-Owner-Id", "owner-1")
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["projected"], 2);
    assert_eq!(body["data"]["removed"], 1);
    assert_eq!(body["data"]["stale"], 0);

    let mut ids: Vec<String> = app
        .store
        .list_by_owner("owner-1")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.file_id)
        .collect();
    ids.sort();
    let mut expected = vec![uploaded, unlisted];
    expected.sort();
    assert_eq!(ids, expected);
}
