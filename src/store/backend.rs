//! # Store Backend Trait

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::errors::StoreResult;
use super::filter::Filter;

/// A stored record: a key-ordered JSON object
pub type Record = Map<String, Value>;

/// Partial update applied atomically by [`DocumentStore::update_one`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreUpdate {
    /// Fields to overwrite
    pub set: Record,
    /// Fields to remove
    pub unset: Vec<String>,
    /// Array fields to append to, skipping values already present
    pub add_to_set: Vec<(String, Value)>,
}

impl StoreUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a field
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Overwrite every field of a record
    pub fn set_all(mut self, fields: Record) -> Self {
        self.set.extend(fields);
        self
    }

    /// Remove a field
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    /// Append a value to an array field unless already present
    pub fn add_to_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_to_set.push((field.into(), value.into()));
        self
    }

    /// Apply this update to a record in place
    pub fn apply(&self, record: &mut Record) {
        for (key, value) in &self.set {
            record.insert(key.clone(), value.clone());
        }
        for key in &self.unset {
            record.remove(key);
        }
        for (key, value) in &self.add_to_set {
            let entry = record
                .entry(key.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !entry.is_array() {
                *entry = Value::Array(Vec::new());
            }
            if let Value::Array(items) = entry {
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
        }
    }
}

/// Backend trait for document persistence.
///
/// Every method is a single atomic step against the backing store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record into a collection
    async fn insert(&self, collection: &str, record: Record) -> StoreResult<()>;

    /// Insert a record only if no record matches `filter`.
    ///
    /// Returns `false` without writing when a match exists.
    async fn insert_if_absent(
        &self,
        collection: &str,
        filter: &Filter,
        record: Record,
    ) -> StoreResult<bool>;

    /// Find the first record matching `filter`
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Record>>;

    /// Find every record matching `filter`
    async fn find_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Apply `update` to the first record matching `filter`.
    ///
    /// Matching and applying happen under one lock, so a filter on a field's
    /// current value acts as compare-and-set. Returns whether a record matched.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &StoreUpdate,
    ) -> StoreResult<bool>;

    /// Delete the first record matching `filter`, returning it
    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Record>>;

    /// Atomically increment a named counter and return the new value.
    ///
    /// Absent counters start at 0, so the first call returns 1.
    async fn get_and_increment(&self, counter: &str) -> StoreResult<u64>;

    /// Set a named counter to 0
    async fn init_counter(&self, counter: &str) -> StoreResult<()>;

    /// Remove a named counter
    async fn remove_counter(&self, counter: &str) -> StoreResult<()>;
}
