use std::sync::Arc;

use crate::errors::EngineResult;
use crate::store::DocumentStore;

/// Per-collection monotonic id allocator
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn DocumentStore>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Allocate the next id for `slug`.
    ///
    /// Never read-then-write: the store performs the increment and returns
    /// the new value in one step, so concurrent creates cannot collide.
    pub async fn next_id(&self, slug: &str) -> EngineResult<u64> {
        let id = self.store.get_and_increment(slug).await?;
        tracing::trace!(collection = slug, id, "id allocated");
        Ok(id)
    }

    /// Start a collection's counter at 0
    pub async fn initialize(&self, slug: &str) -> EngineResult<()> {
        self.store.init_counter(slug).await?;
        Ok(())
    }

    /// Drop a collection's counter
    pub async fn remove(&self, slug: &str) -> EngineResult<()> {
        self.store.remove_counter(slug).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashSet;

    fn allocator() -> SequenceAllocator {
        SequenceAllocator::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_lazy_initialization() {
        let allocator = allocator();
        assert_eq!(allocator.next_id("posts").await.unwrap(), 1);
        assert_eq!(allocator.next_id("posts").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_counters_are_per_collection() {
        let allocator = allocator();
        assert_eq!(allocator.next_id("posts").await.unwrap(), 1);
        assert_eq!(allocator.next_id("pages").await.unwrap(), 1);
        assert_eq!(allocator.next_id("posts").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_remove_resets_sequence() {
        let allocator = allocator();
        allocator.initialize("posts").await.unwrap();
        allocator.next_id("posts").await.unwrap();
        allocator.next_id("posts").await.unwrap();

        allocator.remove("posts").await.unwrap();
        assert_eq!(allocator.next_id("posts").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_allocation_has_no_duplicates() {
        let allocator = allocator();
        let mut handles = Vec::new();
        for _ in 0..64 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                allocator.next_id("posts").await.unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 64);
        assert_eq!(seen.iter().max(), Some(&64));
    }
}
