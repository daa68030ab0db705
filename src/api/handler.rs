//! API Handler for dynbase
//!
//! Orchestrates the schema registry, validator, collection store,
//! authorization guard and upload broker. Holds no state of its own beyond
//! shared handles, so it is cheap to clone into every request.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::{AuthorizationGuard, Identity};
use crate::collections::{CollectionStore, Document, DocumentPatch};
use crate::errors::EngineResult;
use crate::schema::{DescribedSchema, DisplayMetadata, Schema, SchemaRegistry, SchemaValidator};
use crate::store::DocumentStore;
use crate::upload::{ByteStorage, FileMetadata, Redemption, UploadBroker, UploadLimits};

use super::request::{CreateSchemaRequest, DisplayRequest, UpdateSchemaRequest};
use super::response::StatusResponse;

/// Request orchestration over shared subsystems
#[derive(Clone)]
pub struct ApiHandler {
    registry: SchemaRegistry,
    collections: CollectionStore,
    guard: AuthorizationGuard,
    uploads: UploadBroker,
}

impl ApiHandler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        bytes: Arc<dyn ByteStorage>,
        limits: UploadLimits,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            registry: SchemaRegistry::new(store.clone()),
            collections: CollectionStore::new(store.clone()),
            guard: AuthorizationGuard::new(store.clone()),
            uploads: UploadBroker::new(store, bytes, limits, base_url),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn uploads(&self) -> &UploadBroker {
        &self.uploads
    }

    // ==================
    // Documents
    // ==================

    /// Every document of a registered collection
    pub async fn list_documents(&self, slug: &str) -> EngineResult<Vec<Document>> {
        self.registry.read(slug).await?;
        self.collections.list(slug).await
    }

    pub async fn get_document(&self, slug: &str, id: u64) -> EngineResult<Document> {
        self.registry.read(slug).await?;
        self.collections.get(slug, id).await
    }

    /// Create a document from a full field set.
    ///
    /// If the document insert or the ownership record fails, the document and
    /// its minted upload metadata are removed again.
    pub async fn create_document(
        &self,
        identity: &Identity,
        slug: &str,
        body: Value,
    ) -> EngineResult<Document> {
        self.guard.to_author(identity)?;

        let schema = self.registry.read(slug).await?;
        let validator = SchemaValidator::new(&schema);
        let fields = validator.as_document(&body)?.clone();
        validator.validate_create(&fields)?;

        let pending = self.uploads.prepare(&schema, fields, &identity.username)?;
        self.uploads.commit(&pending).await?;

        let tokens = pending.tokens();
        let document = match self
            .collections
            .create(slug, pending.fields, &identity.username)
            .await
        {
            Ok(document) => document,
            Err(err) => {
                self.uploads.rollback(&tokens).await;
                return Err(err);
            }
        };

        if let Err(err) = self
            .guard
            .record_ownership(&identity.username, slug, document.uid)
            .await
        {
            if let Err(e) = self.collections.delete(slug, document.uid).await {
                tracing::error!(collection = slug, id = document.uid, error = %e, "document rollback failed");
            }
            self.uploads.rollback(&tokens).await;
            return Err(err);
        }
        Ok(document)
    }

    /// Merge a partial field set over an existing document
    pub async fn update_document(
        &self,
        identity: &Identity,
        slug: &str,
        id: u64,
        body: Value,
    ) -> EngineResult<Document> {
        self.guard.to_author(identity)?;
        self.guard.check_ownership(identity, slug, id).await?;

        let schema = self.registry.read(slug).await?;
        let validator = SchemaValidator::new(&schema);
        let patch = DocumentPatch::from_record(validator.as_document(&body)?.clone());
        validator.validate_edit(&patch)?;

        self.collections.update(slug, id, patch).await
    }

    /// Delete a document, returning its last state
    pub async fn delete_document(
        &self,
        identity: &Identity,
        slug: &str,
        id: u64,
    ) -> EngineResult<Document> {
        self.guard.to_author(identity)?;
        self.registry.read(slug).await?;
        self.guard.check_ownership(identity, slug, id).await?;
        self.collections.delete(slug, id).await
    }

    // ==================
    // Schemas
    // ==================

    pub async fn list_schemas(&self, identity: &Identity) -> EngineResult<Vec<DescribedSchema>> {
        self.guard.to_editor(identity)?;
        self.registry.list().await
    }

    pub async fn read_schema(
        &self,
        identity: &Identity,
        slug: &str,
    ) -> EngineResult<DescribedSchema> {
        self.guard.to_editor(identity)?;
        self.registry.read_described(slug).await
    }

    pub async fn create_schema(
        &self,
        identity: &Identity,
        request: CreateSchemaRequest,
    ) -> EngineResult<Schema> {
        self.guard.to_editor(identity)?;
        self.registry
            .create(&request.slug, &request.name, request.fields)
            .await
    }

    pub async fn update_schema(
        &self,
        identity: &Identity,
        slug: &str,
        request: UpdateSchemaRequest,
    ) -> EngineResult<Schema> {
        self.guard.to_editor(identity)?;

        let mut schema = match request.fields {
            Some(fields) => self.registry.update(slug, fields).await?,
            None => self.registry.read(slug).await?,
        };
        if let Some(name) = request.name {
            schema = self.registry.rename(slug, &name).await?;
        }
        Ok(schema)
    }

    /// Delete a schema and its counter. Documents are left in place.
    pub async fn delete_schema(
        &self,
        identity: &Identity,
        slug: &str,
    ) -> EngineResult<StatusResponse> {
        self.guard.to_editor(identity)?;
        let removed = self.registry.delete(slug).await?;
        Ok(StatusResponse::success(format!(
            "Schema \"{}\" deleted.",
            removed.collection_name
        )))
    }

    pub async fn set_display(
        &self,
        identity: &Identity,
        slug: &str,
        request: DisplayRequest,
    ) -> EngineResult<DisplayMetadata> {
        self.guard.to_editor(identity)?;
        self.registry.set_display(slug, request.fields).await
    }

    // ==================
    // Uploads
    // ==================

    pub async fn redeem_upload(
        &self,
        identity: &Identity,
        token: &str,
        content_type: &str,
        data: &[u8],
    ) -> EngineResult<Redemption> {
        self.guard.to_author(identity)?;
        self.uploads.redeem(token, content_type, data).await
    }

    pub async fn upload_status(
        &self,
        identity: &Identity,
        token: &str,
    ) -> EngineResult<FileMetadata> {
        self.guard.to_author(identity)?;
        self.uploads.status(token).await
    }
}
