//! Store Persistence Tests
//!
//! Schemas, documents, counters and upload metadata written through a
//! `FileStore` must survive reopening the same directory.

use std::sync::Arc;

use dynbase::api::{ApiHandler, CreateSchemaRequest};
use dynbase::auth::{AccessSettings, Identity, Role};
use dynbase::schema::FieldDefinition;
use dynbase::store::{DocumentStore, FileStore, Filter, FILES_COLLECTION};
use dynbase::upload::{LocalBackend, UploadLimits};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

async fn open(dir: &TempDir) -> (Arc<dyn DocumentStore>, ApiHandler) {
    let store: Arc<dyn DocumentStore> = Arc::new(FileStore::open(dir.path()).await.unwrap());
    let bytes = Arc::new(LocalBackend::new(dir.path().join("uploads")));
    let api = ApiHandler::new(store.clone(), bytes, UploadLimits::default(), "http://localhost");
    (store, api)
}

fn editor() -> Identity {
    Identity::new("ed", Role::Editor)
}

// =============================================================================
// Reopen
// =============================================================================

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    assert!(!FileStore::exists(dir.path()));

    {
        let (store, api) = open(&dir).await;
        assert!(FileStore::exists(dir.path()));

        api.create_schema(
            &editor(),
            CreateSchemaRequest {
                slug: "test_2".into(),
                name: "Test 2".into(),
                fields: vec![FieldDefinition::text("field_1"), FieldDefinition::files("field_2")],
            },
        )
        .await
        .unwrap();

        for _ in 0..2 {
            api.create_document(
                &editor(),
                "test_2",
                json!({
                    "field_1": "x",
                    "field_2": [{"file_name": "a.jpg", "content-type": "image/jpeg"}]
                }),
            )
            .await
            .unwrap();
        }
        api.delete_document(&editor(), "test_2", 2).await.unwrap();
        AccessSettings::new(store).set_allow_unauthorised(true).await.unwrap();
    }

    let (store, api) = open(&dir).await;

    let schema = api.registry().read("test_2").await.unwrap();
    assert_eq!(schema.collection_name, "Test 2");

    let docs = api.list_documents("test_2").await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].uid, 1);

    // Counter persisted: the deleted id is not reissued
    let next = api
        .create_document(
            &editor(),
            "test_2",
            json!({"field_1": "y", "field_2": []}),
        )
        .await
        .unwrap();
    assert_eq!(next.uid, 3);

    let files = store
        .find_all(FILES_COLLECTION, &Filter::all())
        .await
        .unwrap();
    assert_eq!(files.len(), 2);

    assert!(AccessSettings::new(store).allow_unauthorised().await.unwrap());
}

/// A redeemed upload stays finalized across a reopen.
#[tokio::test]
async fn test_redemption_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let token = {
        let (_, api) = open(&dir).await;
        api.create_schema(
            &editor(),
            CreateSchemaRequest {
                slug: "media".into(),
                name: "Media".into(),
                fields: vec![FieldDefinition::files("clip")],
            },
        )
        .await
        .unwrap();

        let doc = api
            .create_document(
                &editor(),
                "media",
                json!({"clip": [{"file_name": "take.ogg", "content-type": "audio/ogg"}]}),
            )
            .await
            .unwrap();
        let token = doc.get("clip").unwrap()[0]["uid"].as_str().unwrap().to_string();
        api.redeem_upload(&editor(), &token, "audio/ogg", b"OggS")
            .await
            .unwrap();
        token
    };

    let (_, api) = open(&dir).await;
    let status = api.upload_status(&editor(), &token).await.unwrap();
    assert_eq!(status.saved_path, Some(format!("uploads/{}.ogg", token)));
    assert!(dir.path().join("uploads").join(format!("{}.ogg", token)).is_file());

    let err = api
        .redeem_upload(&editor(), &token, "audio/ogg", b"OggS")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}
