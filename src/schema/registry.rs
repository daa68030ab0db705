//! Schema registry
//!
//! Schemas live in the `_schema` collection keyed by `collectionSlug`; display
//! metadata lives separately in `_app_collections`. Nothing is cached: every
//! call re-reads the store.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{EngineError, EngineResult};
use crate::observability::Event;
use crate::sequence::SequenceAllocator;
use crate::store::{
    decode, encode, DocumentStore, Filter, StoreUpdate, DISPLAY_COLLECTION, SCHEMA_COLLECTION,
};

use super::types::{DescribedSchema, DisplayMetadata, FieldDefinition, Schema};

const SLUG_KEY: &str = "collectionSlug";

/// Runtime registry of collection schemas
#[derive(Clone)]
pub struct SchemaRegistry {
    store: Arc<dyn DocumentStore>,
    allocator: SequenceAllocator,
}

impl SchemaRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let allocator = SequenceAllocator::new(store.clone());
        Self { store, allocator }
    }

    /// Register a new collection schema and start its counter at 0.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` for a malformed definition, `DuplicateSlug` if the slug
    /// is already registered.
    pub async fn create(
        &self,
        slug: &str,
        name: &str,
        fields: Vec<FieldDefinition>,
    ) -> EngineResult<Schema> {
        let schema = Schema::new(slug, name, fields);
        schema
            .validate_structure()
            .map_err(EngineError::MalformedSchema)?;

        let inserted = self
            .store
            .insert_if_absent(SCHEMA_COLLECTION, &slug_filter(slug), encode(&schema)?)
            .await?;
        if !inserted {
            return Err(EngineError::DuplicateSlug(slug.to_string()));
        }

        self.allocator.initialize(slug).await?;

        tracing::info!(
            event = %Event::SchemaCreated,
            collection = slug,
            fields = schema.fields.len(),
            "schema created"
        );
        Ok(schema)
    }

    /// Fetch a schema by slug
    pub async fn read(&self, slug: &str) -> EngineResult<Schema> {
        let record = self
            .store
            .find_one(SCHEMA_COLLECTION, &slug_filter(slug))
            .await?
            .ok_or_else(|| EngineError::SchemaNotFound(slug.to_string()))?;
        Ok(decode(record)?)
    }

    /// Replace a schema's field list. The slug and name are preserved.
    pub async fn update(&self, slug: &str, fields: Vec<FieldDefinition>) -> EngineResult<Schema> {
        let mut schema = self.read(slug).await?;
        schema.fields = fields;
        schema
            .validate_structure()
            .map_err(EngineError::MalformedSchema)?;

        self.replace(&schema).await?;
        tracing::info!(
            event = %Event::SchemaUpdated,
            collection = slug,
            fields = schema.fields.len(),
            "schema updated"
        );
        Ok(schema)
    }

    /// Change a schema's display name
    pub async fn rename(&self, slug: &str, name: &str) -> EngineResult<Schema> {
        let mut schema = self.read(slug).await?;
        schema.collection_name = name.to_string();
        self.replace(&schema).await?;
        tracing::info!(event = %Event::SchemaUpdated, collection = slug, "schema renamed");
        Ok(schema)
    }

    /// Remove a schema and its counter, returning the removed schema.
    ///
    /// Documents and display metadata are left in place. Recreating the slug
    /// restarts ids at 1.
    pub async fn delete(&self, slug: &str) -> EngineResult<Schema> {
        let record = self
            .store
            .delete_one(SCHEMA_COLLECTION, &slug_filter(slug))
            .await?
            .ok_or_else(|| EngineError::SchemaNotFound(slug.to_string()))?;
        self.allocator.remove(slug).await?;

        tracing::info!(event = %Event::SchemaDeleted, collection = slug, "schema deleted");
        Ok(decode(record)?)
    }

    /// Every registered schema merged with its display metadata
    pub async fn list(&self) -> EngineResult<Vec<DescribedSchema>> {
        let schemas = self.store.find_all(SCHEMA_COLLECTION, &Filter::all()).await?;
        let displays = self
            .store
            .find_all(DISPLAY_COLLECTION, &Filter::all())
            .await?
            .into_iter()
            .map(decode::<DisplayMetadata>)
            .collect::<Result<Vec<_>, _>>()?;

        schemas
            .into_iter()
            .map(|record| {
                let schema: Schema = decode(record)?;
                let display = displays
                    .iter()
                    .find(|d| d.collection_slug == schema.collection_slug);
                Ok(DescribedSchema::join(schema, display))
            })
            .collect()
    }

    /// One schema merged with its display metadata
    pub async fn read_described(&self, slug: &str) -> EngineResult<DescribedSchema> {
        let schema = self.read(slug).await?;
        let display = self.read_display(slug).await?;
        Ok(DescribedSchema::join(schema, display.as_ref()))
    }

    /// Upsert display metadata for a registered collection
    pub async fn set_display(
        &self,
        slug: &str,
        fields: Map<String, Value>,
    ) -> EngineResult<DisplayMetadata> {
        self.read(slug).await?;

        let display = DisplayMetadata {
            collection_slug: slug.to_string(),
            fields,
        };
        let filter = slug_filter(slug);
        let inserted = self
            .store
            .insert_if_absent(DISPLAY_COLLECTION, &filter, encode(&display)?)
            .await?;
        if !inserted {
            let update = StoreUpdate::new().set("fields", Value::Object(display.fields.clone()));
            self.store
                .update_one(DISPLAY_COLLECTION, &filter, &update)
                .await?;
        }

        tracing::info!(event = %Event::DisplayUpdated, collection = slug, "display metadata set");
        Ok(display)
    }

    async fn read_display(&self, slug: &str) -> EngineResult<Option<DisplayMetadata>> {
        match self
            .store
            .find_one(DISPLAY_COLLECTION, &slug_filter(slug))
            .await?
        {
            Some(record) => Ok(Some(decode(record)?)),
            None => Ok(None),
        }
    }

    async fn replace(&self, schema: &Schema) -> EngineResult<()> {
        let update = StoreUpdate::new().set_all(encode(schema)?);
        let matched = self
            .store
            .update_one(
                SCHEMA_COLLECTION,
                &slug_filter(&schema.collection_slug),
                &update,
            )
            .await?;
        if !matched {
            return Err(EngineError::SchemaNotFound(schema.collection_slug.clone()));
        }
        Ok(())
    }
}

fn slug_filter(slug: &str) -> Filter {
    Filter::by(SLUG_KEY, slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn registry() -> (Arc<dyn DocumentStore>, SchemaRegistry) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        (store.clone(), SchemaRegistry::new(store))
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![FieldDefinition::text("a"), FieldDefinition::text("b")]
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let (_, registry) = registry();
        registry.create("test_1", "Test 1", fields()).await.unwrap();

        let schema = registry.read("test_1").await.unwrap();
        assert_eq!(schema.collection_name, "Test 1");
        assert_eq!(schema.field_slugs().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (_, registry) = registry();
        registry.create("test_1", "Test 1", fields()).await.unwrap();

        let err = registry.create("test_1", "Other", vec![]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSlug);
        assert_eq!(registry.read("test_1").await.unwrap().collection_name, "Test 1");
    }

    #[tokio::test]
    async fn test_malformed_schema_rejected() {
        let (store, registry) = registry();
        let err = registry
            .create("test_1", "Test 1", vec![FieldDefinition::text("a"), FieldDefinition::text("a")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
        assert!(store.find_all(SCHEMA_COLLECTION, &Filter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_, registry) = registry();
        let err = registry.read("nope").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.title(), "Schema does not exist");
    }

    #[tokio::test]
    async fn test_update_preserves_slug_and_name() {
        let (_, registry) = registry();
        registry.create("test_1", "Test 1", fields()).await.unwrap();

        let updated = registry
            .update("test_1", vec![FieldDefinition::text("c")])
            .await
            .unwrap();
        assert_eq!(updated.collection_slug, "test_1");
        assert_eq!(updated.collection_name, "Test 1");
        assert_eq!(registry.read("test_1").await.unwrap().fields.len(), 1);

        let renamed = registry.rename("test_1", "Renamed").await.unwrap();
        assert_eq!(renamed.fields, updated.fields);
    }

    #[tokio::test]
    async fn test_delete_removes_schema_and_counter() {
        let (store, registry) = registry();
        registry.create("test_1", "Test 1", fields()).await.unwrap();
        store.get_and_increment("test_1").await.unwrap();
        store.get_and_increment("test_1").await.unwrap();

        let removed = registry.delete("test_1").await.unwrap();
        assert_eq!(removed.collection_slug, "test_1");
        assert_eq!(registry.read("test_1").await.unwrap_err().status_code(), 404);
        assert_eq!(registry.delete("test_1").await.unwrap_err().status_code(), 404);

        registry.create("test_1", "Test 1", fields()).await.unwrap();
        assert_eq!(store.get_and_increment("test_1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_joins_display_metadata() {
        let (_, registry) = registry();
        registry.create("test_1", "Test 1", fields()).await.unwrap();
        registry.create("test_2", "Test 2", fields()).await.unwrap();

        let display = json!({"a": {"label": "Field A"}}).as_object().cloned().unwrap();
        registry.set_display("test_1", display).await.unwrap();

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        let first = listed.iter().find(|s| s.collection_slug == "test_1").unwrap();
        assert_eq!(first.fields[0].display["label"], "Field A");
        assert!(first.fields[1].display.is_empty());

        let second = registry.read_described("test_2").await.unwrap();
        assert!(second.fields.iter().all(|f| f.display.is_empty()));
    }

    #[tokio::test]
    async fn test_set_display_upserts() {
        let (store, registry) = registry();
        registry.create("test_1", "Test 1", fields()).await.unwrap();

        registry
            .set_display("test_1", json!({"a": {"label": "One"}}).as_object().cloned().unwrap())
            .await
            .unwrap();
        registry
            .set_display("test_1", json!({"a": {"label": "Two"}}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let entries = store.find_all(DISPLAY_COLLECTION, &Filter::all()).await.unwrap();
        assert_eq!(entries.len(), 1);
        let described = registry.read_described("test_1").await.unwrap();
        assert_eq!(described.fields[0].display["label"], "Two");

        let err = registry.set_display("nope", Map::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
