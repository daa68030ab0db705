//! Generic CRUD over named collections
//!
//! Schema-agnostic: callers validate before writing. Documents are addressed
//! by their `_uid` within a collection.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::errors::{EngineError, EngineResult};
use crate::observability::Event;
use crate::schema::{METADATA_KEY, UID_KEY};
use crate::sequence::SequenceAllocator;
use crate::store::{decode, encode, DocumentStore, Filter, Record, StoreUpdate};

use super::document::{Document, DocumentMetadata, DocumentPatch};

/// Document CRUD over a shared store
#[derive(Clone)]
pub struct CollectionStore {
    store: Arc<dyn DocumentStore>,
    allocator: SequenceAllocator,
}

impl CollectionStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let allocator = SequenceAllocator::new(store.clone());
        Self { store, allocator }
    }

    /// Allocate an id, stamp metadata, and persist a new document
    pub async fn create(
        &self,
        slug: &str,
        fields: Record,
        created_by: &str,
    ) -> EngineResult<Document> {
        let uid = self.allocator.next_id(slug).await?;
        let document = Document::new(uid, DocumentMetadata::new(created_by, Utc::now()), fields);

        self.store.insert(slug, encode(&document)?).await?;

        tracing::info!(
            event = %Event::DocumentCreated,
            collection = slug,
            id = uid,
            user = created_by,
            "document created"
        );
        Ok(document)
    }

    /// Fetch a document by id
    pub async fn get(&self, slug: &str, id: u64) -> EngineResult<Document> {
        let record = self
            .store
            .find_one(slug, &id_filter(id))
            .await?
            .ok_or_else(|| not_found(slug, id))?;
        Ok(decode(record)?)
    }

    /// Every document in a collection, in no particular order
    pub async fn list(&self, slug: &str) -> EngineResult<Vec<Document>> {
        let records = self.store.find_all(slug, &Filter::all()).await?;
        records
            .into_iter()
            .map(|r| decode(r).map_err(EngineError::from))
            .collect()
    }

    /// Shallow-merge a patch over a stored document.
    ///
    /// The merge and the modification stamp land in one `update_one`.
    pub async fn update(
        &self,
        slug: &str,
        id: u64,
        patch: DocumentPatch,
    ) -> EngineResult<Document> {
        let current = self.get(slug, id).await?;
        let metadata = current.metadata.touched(Utc::now());

        let update = StoreUpdate::new()
            .set_all(patch.into_record())
            .set(METADATA_KEY, serde_json::to_value(&metadata).map_err(internal)?);
        let matched = self.store.update_one(slug, &id_filter(id), &update).await?;
        if !matched {
            return Err(not_found(slug, id));
        }

        let updated = self.get(slug, id).await?;
        tracing::info!(event = %Event::DocumentUpdated, collection = slug, id, "document updated");
        Ok(updated)
    }

    /// Delete a document, returning its last stored state
    pub async fn delete(&self, slug: &str, id: u64) -> EngineResult<Document> {
        let record = self
            .store
            .delete_one(slug, &id_filter(id))
            .await?
            .ok_or_else(|| not_found(slug, id))?;

        tracing::info!(event = %Event::DocumentDeleted, collection = slug, id, "document deleted");
        Ok(decode(record)?)
    }
}

fn id_filter(id: u64) -> Filter {
    Filter::by(UID_KEY, Value::from(id))
}

fn not_found(slug: &str, id: u64) -> EngineError {
    EngineError::DocumentNotFound {
        slug: slug.to_string(),
        id,
    }
}

fn internal(err: serde_json::Error) -> EngineError {
    EngineError::Internal(err.to_string())
}
