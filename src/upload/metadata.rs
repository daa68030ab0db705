//! File metadata records
//!
//! One record per declared file in `files_upload`, keyed by its token
//! (`uid`). Lifecycle:
//!
//! ```text
//! PENDING (saved_path = null, uploadExpire set)
//!    |-- redeem --> FINALIZED (saved_path set, uploadExpire stripped)
//!    `-- accessed past uploadExpire --> record deleted
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EngineError, EngineResult, ValidationDetails};
use crate::schema::{METADATA_KEY, UID_KEY};
use crate::store::Record;

/// Wire key of the declared MIME type
pub const CONTENT_TYPE_KEY: &str = "content-type";

/// Keys owned by the metadata record; stripped from carried descriptor props
const OWNED_KEYS: &[&str] = &[
    UID_KEY,
    METADATA_KEY,
    "uid",
    "file_name",
    CONTENT_TYPE_KEY,
    "file_size",
    "file_owner",
    "created_at",
    "modified_at",
    "file_permalink",
    "saved_path",
    "uploadExpire",
    "uploadLocation",
    "checksum",
    "permalink",
    "upload_link",
    "upload_expire",
];

/// Observable lifecycle state of a metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Awaiting redemption
    Pending,
    /// Bytes stored
    Finalized,
    /// Pending past its expiry; destroyed on next access
    Expired,
}

/// Client declaration of one file inside a document's `files` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileDescriptor {
    #[serde(default)]
    pub file_name: String,
    #[serde(rename = "content-type", default)]
    pub content_type: String,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl FileDescriptor {
    /// Parse one descriptor object
    pub fn parse(field: &str, value: &Value) -> EngineResult<Self> {
        if !value.is_object() {
            return Err(EngineError::invalid_schema(
                field,
                ValidationDetails::new(field, "file descriptor object", "non-object entry"),
            ));
        }
        serde_json::from_value(value.clone()).map_err(|e| {
            EngineError::invalid_schema(
                field,
                ValidationDetails::new(field, "file descriptor", e.to_string()),
            )
        })
    }

    /// Dotted extension of the declared name, or empty.
    ///
    /// Only plain alphanumeric extensions are kept so a crafted name cannot
    /// escape the upload directory.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }
}

/// Stored metadata for one declared file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Redemption token
    pub uid: String,
    pub file_name: String,
    #[serde(rename = "content-type")]
    pub content_type: String,
    /// Declared size while pending; actual byte length once finalized
    pub file_size: u64,
    pub file_owner: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub file_permalink: String,
    /// Set exactly once, on redemption
    pub saved_path: Option<String>,
    #[serde(rename = "uploadExpire", default, skip_serializing_if = "Option::is_none")]
    pub upload_expire: Option<DateTime<Utc>>,
    /// Hex SHA-256 of the stored bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Remaining descriptor props (e.g. `file_description`)
    #[serde(flatten)]
    pub extra: Record,
}

impl FileMetadata {
    /// Lifecycle state as of `now`
    pub fn state(&self, now: DateTime<Utc>) -> FileState {
        if self.saved_path.is_some() {
            return FileState::Finalized;
        }
        match self.upload_expire {
            Some(expire) if expire < now => FileState::Expired,
            _ => FileState::Pending,
        }
    }

    /// Stored file name: token plus the declared extension
    pub fn saved_name(&self) -> String {
        let descriptor = FileDescriptor {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            file_size: None,
        };
        format!("{}{}", self.uid, descriptor.extension())
    }
}

/// Copy a descriptor's props minus the keys the record owns
pub(crate) fn carried_props(descriptor: &Value) -> Record {
    descriptor
        .as_object()
        .map(|props| {
            props
                .iter()
                .filter(|(key, _)| !OWNED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}
