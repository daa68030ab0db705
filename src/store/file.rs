//! # Durable JSON Store
//!
//! Layout under the data directory:
//! - `collections/<name>.json`: one JSON array per collection
//! - `counters.json`: every sequence counter
//!
//! State is held in a [`MemoryStore`] and the touched file is rewritten after
//! every mutation (temp file + rename). Mutations are serialized by a single
//! writer lock so snapshots land on disk in the order they were taken. If the
//! rewrite fails, the in-memory state is restored to what is on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::backend::{DocumentStore, Record, StoreUpdate};
use super::errors::{StoreError, StoreResult};
use super::filter::Filter;
use super::memory::MemoryStore;

const COLLECTIONS_DIR: &str = "collections";
const COUNTERS_FILE: &str = "counters.json";

/// File-backed document store
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    state: MemoryStore,
    writer: Mutex<()>,
}

impl FileStore {
    /// Open (or create) a store rooted at `root`, loading any existing state
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let collections_dir = root.join(COLLECTIONS_DIR);
        fs::create_dir_all(&collections_dir).await?;

        let mut collections = HashMap::new();
        let mut entries = fs::read_dir(&collections_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let records: Vec<Record> = read_json(&path).await?;
            collections.insert(name.to_string(), records);
        }

        let counters_path = root.join(COUNTERS_FILE);
        let counters: HashMap<String, u64> = if fs::try_exists(&counters_path).await? {
            read_json(&counters_path).await?
        } else {
            HashMap::new()
        };

        tracing::debug!(
            root = %root.display(),
            collections = collections.len(),
            counters = counters.len(),
            "store opened"
        );

        Ok(Self {
            root,
            state: MemoryStore::from_parts(collections, counters),
            writer: Mutex::new(()),
        })
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a store has already been laid out under `root`
    pub fn exists(root: &Path) -> bool {
        root.join(COLLECTIONS_DIR).is_dir()
    }

    /// Write a mutated collection, restoring `before` if the write fails
    async fn persist_collection(&self, collection: &str, before: Vec<Record>) -> StoreResult<()> {
        let records = self.state.snapshot_collection(collection)?;
        let path = self
            .root
            .join(COLLECTIONS_DIR)
            .join(format!("{}.json", collection));
        if let Err(e) = write_json(&path, &records).await {
            tracing::error!(collection, error = %e, "collection write failed");
            self.state.restore_collection(collection, before)?;
            return Err(e);
        }
        Ok(())
    }

    /// Write mutated counters, restoring `before` if the write fails
    async fn persist_counters(&self, before: HashMap<String, u64>) -> StoreResult<()> {
        let counters = self.state.snapshot_counters()?;
        if let Err(e) = write_json(&self.root.join(COUNTERS_FILE), &counters).await {
            tracing::error!(error = %e, "counter write failed");
            self.state.restore_counters(before)?;
            return Err(e);
        }
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn insert(&self, collection: &str, record: Record) -> StoreResult<()> {
        let _guard = self.writer.lock().await;
        let before = self.state.snapshot_collection(collection)?;
        self.state.insert_sync(collection, record)?;
        self.persist_collection(collection, before).await
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        filter: &Filter,
        record: Record,
    ) -> StoreResult<bool> {
        let _guard = self.writer.lock().await;
        let before = self.state.snapshot_collection(collection)?;
        let inserted = self.state.insert_if_absent_sync(collection, filter, record)?;
        if inserted {
            self.persist_collection(collection, before).await?;
        }
        Ok(inserted)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Record>> {
        self.state.find_one(collection, filter).await
    }

    async fn find_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        self.state.find_all(collection, filter).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &StoreUpdate,
    ) -> StoreResult<bool> {
        let _guard = self.writer.lock().await;
        let before = self.state.snapshot_collection(collection)?;
        let matched = self.state.update_one_sync(collection, filter, update)?;
        if matched {
            self.persist_collection(collection, before).await?;
        }
        Ok(matched)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Record>> {
        let _guard = self.writer.lock().await;
        let before = self.state.snapshot_collection(collection)?;
        let deleted = self.state.delete_one_sync(collection, filter)?;
        if deleted.is_some() {
            self.persist_collection(collection, before).await?;
        }
        Ok(deleted)
    }

    async fn get_and_increment(&self, counter: &str) -> StoreResult<u64> {
        let _guard = self.writer.lock().await;
        let before = self.state.snapshot_counters()?;
        let value = self.state.increment_sync(counter)?;
        self.persist_counters(before).await?;
        Ok(value)
    }

    async fn init_counter(&self, counter: &str) -> StoreResult<()> {
        let _guard = self.writer.lock().await;
        let before = self.state.snapshot_counters()?;
        self.state.set_counter_sync(counter, Some(0))?;
        self.persist_counters(before).await
    }

    async fn remove_counter(&self, counter: &str) -> StoreResult<()> {
        let _guard = self.writer.lock().await;
        let before = self.state.snapshot_counters()?;
        self.state.set_counter_sync(counter, None)?;
        self.persist_counters(before).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileStore::open(temp.path()).await.unwrap();
            store.insert("posts", record(json!({"_uid": 1, "a": 1}))).await.unwrap();
            store.get_and_increment("posts").await.unwrap();
            store.get_and_increment("posts").await.unwrap();
        }

        let store = FileStore::open(temp.path()).await.unwrap();
        let found = store.find_one("posts", &Filter::by("_uid", 1)).await.unwrap();
        assert_eq!(found.unwrap()["a"], 1);
        assert_eq!(store.get_and_increment("posts").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_is_persisted() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileStore::open(temp.path()).await.unwrap();
            store.insert("posts", record(json!({"_uid": 1}))).await.unwrap();
            store.delete_one("posts", &Filter::by("_uid", 1)).await.unwrap();
        }

        let store = FileStore::open(temp.path()).await.unwrap();
        assert!(store.find_all("posts", &Filter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_trace() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).await.unwrap();

        // A directory where the collection file belongs makes the rename fail
        let blocked = temp.path().join(COLLECTIONS_DIR).join("posts.json");
        std::fs::create_dir_all(blocked.join("keep")).unwrap();
        assert!(store.insert("posts", record(json!({"_uid": 1}))).await.is_err());
        assert!(store.find_all("posts", &Filter::all()).await.unwrap().is_empty());

        let counters = temp.path().join(COUNTERS_FILE);
        std::fs::create_dir_all(counters.join("keep")).unwrap();
        assert!(store.get_and_increment("posts").await.is_err());

        std::fs::remove_dir_all(&blocked).unwrap();
        std::fs::remove_dir_all(&counters).unwrap();
        store.insert("posts", record(json!({"_uid": 2}))).await.unwrap();
        assert_eq!(store.get_and_increment("posts").await.unwrap(), 1);

        let reopened = FileStore::open(temp.path()).await.unwrap();
        let records = reopened.find_all("posts", &Filter::all()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["_uid"], 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(COLLECTIONS_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("posts.json"), b"not json").unwrap();

        let result = FileStore::open(temp.path()).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }
}
