//! # In-Memory Store
//!
//! Process-wide backend for tests and ephemeral servers. Collections and
//! counters live behind separate locks; every trait method takes its lock
//! once, which is what makes the counter increment and `update_one` atomic.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use super::backend::{DocumentStore, Record, StoreUpdate};
use super::errors::{StoreError, StoreResult};
use super::filter::Filter;

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    counters: Mutex<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously persisted state
    pub(crate) fn from_parts(
        collections: HashMap<String, Vec<Record>>,
        counters: HashMap<String, u64>,
    ) -> Self {
        Self {
            collections: RwLock::new(collections),
            counters: Mutex::new(counters),
        }
    }

    /// Snapshot one collection
    pub(crate) fn snapshot_collection(&self, collection: &str) -> StoreResult<Vec<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    /// Snapshot every counter
    pub(crate) fn snapshot_counters(&self) -> StoreResult<HashMap<String, u64>> {
        let counters = self.counters.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(counters.clone())
    }

    /// Replace one collection with an earlier snapshot
    pub(crate) fn restore_collection(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> StoreResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        collections.insert(collection.to_string(), records);
        Ok(())
    }

    /// Replace every counter with an earlier snapshot
    pub(crate) fn restore_counters(&self, snapshot: HashMap<String, u64>) -> StoreResult<()> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::LockPoisoned)?;
        *counters = snapshot;
        Ok(())
    }

    pub(crate) fn insert_sync(&self, collection: &str, record: Record) -> StoreResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    pub(crate) fn insert_if_absent_sync(
        &self,
        collection: &str,
        filter: &Filter,
        record: Record,
    ) -> StoreResult<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let records = collections.entry(collection.to_string()).or_default();
        if records.iter().any(|r| filter.matches(r)) {
            return Ok(false);
        }
        records.push(record);
        Ok(true)
    }

    pub(crate) fn update_one_sync(
        &self,
        collection: &str,
        filter: &Filter,
        update: &StoreUpdate,
    ) -> StoreResult<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let target = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| filter.matches(r)));
        match target {
            Some(record) => {
                update.apply(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn delete_one_sync(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Option<Record>> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(records
            .iter()
            .position(|r| filter.matches(r))
            .map(|index| records.remove(index)))
    }

    pub(crate) fn increment_sync(&self, counter: &str) -> StoreResult<u64> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::LockPoisoned)?;
        let value = counters.entry(counter.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    pub(crate) fn set_counter_sync(&self, counter: &str, value: Option<u64>) -> StoreResult<()> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::LockPoisoned)?;
        match value {
            Some(v) => {
                counters.insert(counter.to_string(), v);
            }
            None => {
                counters.remove(counter);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, record: Record) -> StoreResult<()> {
        self.insert_sync(collection, record)
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        filter: &Filter,
        record: Record,
    ) -> StoreResult<bool> {
        self.insert_if_absent_sync(collection, filter, record)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| filter.matches(r)))
            .cloned())
    }

    async fn find_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &StoreUpdate,
    ) -> StoreResult<bool> {
        self.update_one_sync(collection, filter, update)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Record>> {
        self.delete_one_sync(collection, filter)
    }

    async fn get_and_increment(&self, counter: &str) -> StoreResult<u64> {
        self.increment_sync(counter)
    }

    async fn init_counter(&self, counter: &str) -> StoreResult<()> {
        self.set_counter_sync(counter, Some(0))
    }

    async fn remove_counter(&self, counter: &str) -> StoreResult<()> {
        self.set_counter_sync(counter, None)
    }
}
