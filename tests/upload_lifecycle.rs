//! Upload Lifecycle Tests
//!
//! Drives the declare-then-redeem flow end to end through the API handler:
//! - Declaring a file field mints a pending record per descriptor
//! - A token redeems exactly once
//! - Access past expiry destroys the record
//! - Disallowed types are refused before anything is persisted

use std::sync::Arc;

use chrono::{Duration, Utc};
use dynbase::api::{ApiHandler, CreateSchemaRequest};
use dynbase::auth::{Identity, Role};
use dynbase::errors::ErrorKind;
use dynbase::schema::FieldDefinition;
use dynbase::store::{DocumentStore, Filter, MemoryStore, StoreUpdate, FILES_COLLECTION};
use dynbase::upload::{FileState, LocalBackend, UploadLimits, TOKEN_LENGTH};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Harness {
    tmp: TempDir,
    store: Arc<dyn DocumentStore>,
    api: ApiHandler,
}

async fn setup() -> Harness {
    let tmp = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let bytes = Arc::new(LocalBackend::new(tmp.path().join("uploads")));
    let api = ApiHandler::new(
        store.clone(),
        bytes,
        UploadLimits::default(),
        "http://localhost:3000",
    );

    api.create_schema(
        &Identity::new("admin", Role::Administrator),
        CreateSchemaRequest {
            slug: "test_2".into(),
            name: "Test 2".into(),
            fields: vec![FieldDefinition::text("field_1"), FieldDefinition::files("field_2")],
        },
    )
    .await
    .unwrap();

    Harness { tmp, store, api }
}

fn alice() -> Identity {
    Identity::new("alice", Role::Author)
}

fn declaration(content_type: &str) -> Value {
    json!({
        "field_1": "Some text",
        "field_2": [{
            "file_name": "image-1.jpg",
            "file_description": "Test image 1",
            "content-type": content_type
        }]
    })
}

async fn file_records(h: &Harness) -> usize {
    h.store
        .find_all(FILES_COLLECTION, &Filter::all())
        .await
        .unwrap()
        .len()
}

/// Declare one JPEG and return its upload token
async fn declare(h: &Harness) -> String {
    let doc = h
        .api
        .create_document(&alice(), "test_2", declaration("image/jpeg"))
        .await
        .unwrap();
    doc.get("field_2").unwrap()[0]["uid"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn expire(h: &Harness, token: &str) {
    let past = (Utc::now() - Duration::minutes(5)).to_rfc3339();
    h.store
        .update_one(
            FILES_COLLECTION,
            &Filter::by("uid", token),
            &StoreUpdate::new().set("uploadExpire", past),
        )
        .await
        .unwrap();
}

// =============================================================================
// Declare
// =============================================================================

#[tokio::test]
async fn test_declare_decorates_document_and_mints_pending() {
    let h = setup().await;
    let doc = h
        .api
        .create_document(&alice(), "test_2", declaration("image/jpeg"))
        .await
        .unwrap();

    let entry = &doc.get("field_2").unwrap()[0];
    let token = entry["uid"].as_str().unwrap();
    assert_eq!(token.len(), TOKEN_LENGTH);
    assert_eq!(
        entry["upload_link"],
        format!("http://localhost:3000/api/upload/{}", token)
    );
    assert_eq!(
        entry["permalink"],
        format!("http://localhost:3000/uploads/{}.jpg", token)
    );
    assert!(entry["upload_expire"].is_string());
    assert_eq!(entry["file_description"], "Test image 1");

    let status = h.api.upload_status(&alice(), token).await.unwrap();
    assert_eq!(status.state(Utc::now()), FileState::Pending);
    assert_eq!(status.file_owner, "alice");
    assert!(status.saved_path.is_none());
}

/// Two descriptors mint two independent tokens.
#[tokio::test]
async fn test_declare_many_descriptors() {
    let h = setup().await;
    let body = json!({
        "field_1": "x",
        "field_2": [
            {"file_name": "a.jpg", "content-type": "image/jpeg"},
            {"file_name": "b.ogg", "content-type": "audio/ogg"}
        ]
    });

    let doc = h.api.create_document(&alice(), "test_2", body).await.unwrap();
    let entries = doc.get("field_2").unwrap().as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_ne!(entries[0]["uid"], entries[1]["uid"]);
    assert_eq!(file_records(&h).await, 2);
}

/// Scenario: a JSON file against the default allow-list.
#[tokio::test]
async fn test_disallowed_type_rejected_without_side_effects() {
    let h = setup().await;

    let err = h
        .api
        .create_document(&alice(), "test_2", declaration("application/json"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMime);
    assert_eq!(err.status_code(), 415);

    assert_eq!(file_records(&h).await, 0);
    assert!(h.api.list_documents("test_2").await.unwrap().is_empty());
}

/// One bad descriptor aborts the whole batch.
#[tokio::test]
async fn test_batch_mint_all_or_nothing() {
    let h = setup().await;
    let body = json!({
        "field_1": "x",
        "field_2": [
            {"file_name": "a.jpg", "content-type": "image/jpeg"},
            {"file_name": "b.json", "content-type": "application/json"}
        ]
    });

    assert!(h.api.create_document(&alice(), "test_2", body).await.is_err());
    assert_eq!(file_records(&h).await, 0);
}

#[tokio::test]
async fn test_declared_size_over_ceiling_rejected() {
    let h = setup().await;
    let body = json!({
        "field_1": "x",
        "field_2": [{"file_name": "a.jpg", "content-type": "image/jpeg", "file_size": 2_000_000}]
    });

    let err = h.api.create_document(&alice(), "test_2", body).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileTooLarge);
    assert_eq!(err.status_code(), 413);
    assert_eq!(file_records(&h).await, 0);
}

// =============================================================================
// Redeem
// =============================================================================

#[tokio::test]
async fn test_redeem_once() {
    let h = setup().await;
    let token = declare(&h).await;
    let bytes = b"\xff\xd8\xff\xe0 fake jpeg";

    let redemption = h
        .api
        .redeem_upload(&alice(), &token, "image/jpeg", bytes)
        .await
        .unwrap();
    assert_eq!(
        redemption.resource_path,
        format!("http://localhost:3000/uploads/{}.jpg", token)
    );

    let stored = std::fs::read(h.tmp.path().join("uploads").join(format!("{}.jpg", token))).unwrap();
    assert_eq!(stored, bytes);

    let status = h.api.upload_status(&alice(), &token).await.unwrap();
    assert_eq!(status.state(Utc::now()), FileState::Finalized);
    assert_eq!(status.saved_path.as_deref(), Some(format!("uploads/{}.jpg", token).as_str()));
    assert_eq!(status.file_size, bytes.len() as u64);
    assert!(status.upload_expire.is_none());
    assert!(status.checksum.is_some());

    let err = h
        .api
        .redeem_upload(&alice(), &token, "image/jpeg", b"again")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUploadUrl);

    // The first write is untouched
    let stored = std::fs::read(h.tmp.path().join("uploads").join(format!("{}.jpg", token))).unwrap();
    assert_eq!(stored, bytes);
}

#[tokio::test]
async fn test_redeem_unknown_token() {
    let h = setup().await;
    let err = h
        .api
        .redeem_upload(&alice(), "doesnotexist", "image/jpeg", b"x")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUploadUrl);
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_redeem_type_mismatch() {
    let h = setup().await;
    let token = declare(&h).await;

    let err = h
        .api
        .redeem_upload(&alice(), &token, "audio/ogg", b"x")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MimeMismatch);
    assert_eq!(err.status_code(), 400);

    // Still redeemable with the declared type
    assert!(h
        .api
        .redeem_upload(&alice(), &token, "image/jpeg", b"x")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_redeem_checks_allow_list_and_ceiling() {
    let h = setup().await;
    let token = declare(&h).await;

    let err = h
        .api
        .redeem_upload(&alice(), &token, "text/plain", b"x")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMime);

    let big = vec![0u8; 1_000_001];
    let err = h
        .api
        .redeem_upload(&alice(), &token, "image/jpeg", &big)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileTooLarge);
}

// =============================================================================
// Expiry
// =============================================================================

/// Expired access deletes the record; the next access finds nothing.
#[tokio::test]
async fn test_expired_link_destroyed() {
    let h = setup().await;
    let token = declare(&h).await;
    expire(&h, &token).await;

    let err = h
        .api
        .redeem_upload(&alice(), &token, "image/jpeg", b"x")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UploadLinkExpired);
    assert_eq!(file_records(&h).await, 0);

    let err = h
        .api
        .redeem_upload(&alice(), &token, "image/jpeg", b"x")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUploadUrl);
}

#[tokio::test]
async fn test_status_applies_expiry() {
    let h = setup().await;
    let token = declare(&h).await;
    expire(&h, &token).await;

    let err = h.api.upload_status(&alice(), &token).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UploadLinkExpired);
    let err = h.api.upload_status(&alice(), &token).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUploadUrl);
}

/// The sweep removes expired pending records and nothing else.
#[tokio::test]
async fn test_purge_spares_live_and_finalized() {
    let h = setup().await;
    let stale = declare(&h).await;
    let live = declare(&h).await;
    let done = declare(&h).await;
    h.api
        .redeem_upload(&alice(), &done, "image/jpeg", b"x")
        .await
        .unwrap();
    expire(&h, &stale).await;

    assert_eq!(h.api.uploads().purge_expired().await.unwrap(), 1);
    assert_eq!(file_records(&h).await, 2);
    assert!(h.api.upload_status(&alice(), &live).await.is_ok());
    assert!(h.api.upload_status(&alice(), &done).await.is_ok());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeem_single_winner() {
    let h = setup().await;
    let token = declare(&h).await;

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let api = h.api.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            api.redeem_upload(&alice(), &token, "image/jpeg", &[i])
                .await
                .is_ok()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
