//! # Byte Storage Trait

use async_trait::async_trait;

use super::errors::StorageResult;

/// Path-addressable sink for uploaded bytes
#[async_trait]
pub trait ByteStorage: Send + Sync + std::fmt::Debug {
    /// Create `path` with `data`.
    ///
    /// Fails with `ObjectAlreadyExists` if the path exists; never overwrites.
    async fn write_new(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Read data from path
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Delete file at path
    async fn delete(&self, path: &str) -> StorageResult<()>;
}
