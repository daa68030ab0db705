//! # Document Store
//!
//! The persistence seam consumed by every other subsystem. Collections are
//! named groups of JSON records; counters are named integers.
//!
//! No caching happens above this layer: every read re-fetches.

mod backend;
mod errors;
mod file;
mod filter;
mod memory;

pub use backend::{DocumentStore, Record, StoreUpdate};
pub use errors::{StoreError, StoreResult};
pub use file::FileStore;
pub use filter::Filter;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Collection holding schema definitions
pub const SCHEMA_COLLECTION: &str = "_schema";
/// Collection holding display metadata per schema
pub const DISPLAY_COLLECTION: &str = "_app_collections";
/// Collection holding per-user ownership lists
pub const USERS_COLLECTION: &str = "_users_auth";
/// Collection holding process-wide flags
pub const CONFIG_COLLECTION: &str = "_configurations";
/// Collection holding upload metadata
pub const FILES_COLLECTION: &str = "files_upload";

/// Returns whether a collection name is reserved for internal use
pub fn is_reserved_collection(name: &str) -> bool {
    matches!(
        name,
        SCHEMA_COLLECTION
            | DISPLAY_COLLECTION
            | USERS_COLLECTION
            | CONFIG_COLLECTION
            | FILES_COLLECTION
    )
}

/// Encode a typed value as a record
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Decode a record into a typed value
pub fn decode<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}
