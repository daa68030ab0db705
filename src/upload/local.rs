//! # Local Filesystem Backend
//!
//! Files live flat under one directory (`<data_dir>/uploads`). Paths are
//! single file names; separators and dot-prefixed names are rejected.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::backend::ByteStorage;
use super::errors::{StorageError, StorageResult};

/// Local filesystem byte storage
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
        if path.is_empty() || path.starts_with('.') || path.contains(['/', '\\']) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(path))
    }
}

fn map_io(path: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::ObjectNotFound(path.to_string()),
        ErrorKind::AlreadyExists => StorageError::ObjectAlreadyExists(path.to_string()),
        _ => StorageError::IoError(e.to_string()),
    }
}

#[async_trait]
impl ByteStorage for LocalBackend {
    async fn write_new(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let full_path = self.full_path(path)?;
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(|e| map_io(path, e))?;

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // Leave no half-written file claiming the name
            let _ = fs::remove_file(&full_path).await;
            return Err(StorageError::IoError(e.to_string()));
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.full_path(path)?;
        fs::read(&full_path).await.map_err(|e| map_io(path, e))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let full_path = self.full_path(path)?;
        fs::remove_file(&full_path)
            .await
            .map_err(|e| map_io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_read() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().join("uploads"));

        backend.write_new("abc.jpg", b"hello").await.unwrap();
        assert_eq!(backend.read("abc.jpg").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_write_is_once_only() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path());

        backend.write_new("abc.jpg", b"first").await.unwrap();
        let result = backend.write_new("abc.jpg", b"second").await;
        assert!(matches!(result, Err(StorageError::ObjectAlreadyExists(_))));
        assert_eq!(backend.read("abc.jpg").await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_delete() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path());

        backend.write_new("bye.ogg", b"bye").await.unwrap();
        backend.delete("bye.ogg").await.unwrap();
        assert!(matches!(
            backend.read("bye.ogg").await,
            Err(StorageError::ObjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path());

        for bad in ["../x", "a/b", "", ".hidden"] {
            assert!(matches!(
                backend.write_new(bad, b"x").await,
                Err(StorageError::InvalidPath(_))
            ));
        }
    }
}
