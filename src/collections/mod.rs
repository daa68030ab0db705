//! Collection documents
//!
//! A document is `{ _uid, _metadata, ...fields }`. Ids come from the
//! sequence allocator and are scoped to one collection.

mod document;
mod store;

pub use document::{ownership_ref, Document, DocumentMetadata, DocumentPatch};
pub use store::CollectionStore;
