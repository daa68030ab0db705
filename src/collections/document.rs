//! Document and patch types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{METADATA_KEY, UID_KEY};
use crate::store::Record;

/// Creation and modification stamps carried by every document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Username of the creator
    pub created_by: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl DocumentMetadata {
    /// Fresh metadata stamped at `now`
    pub fn new(created_by: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            created_by: created_by.into(),
            date_created: now,
            date_modified: now,
        }
    }

    /// Copy with a refreshed modification stamp
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            date_modified: now,
            ..self.clone()
        }
    }
}

/// A stored document: allocated id, metadata, and the client's fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_uid")]
    pub uid: u64,
    #[serde(rename = "_metadata")]
    pub metadata: DocumentMetadata,
    #[serde(flatten)]
    pub fields: Record,
}

impl Document {
    pub fn new(uid: u64, metadata: DocumentMetadata, fields: Record) -> Self {
        Self {
            uid,
            metadata,
            fields,
        }
    }

    /// Ownership reference for this document, `"<slug>.<id>"`
    pub fn reference(&self, slug: &str) -> String {
        ownership_ref(slug, self.uid)
    }

    /// Field value by slug
    pub fn get(&self, slug: &str) -> Option<&Value> {
        self.fields.get(slug)
    }
}

/// Ownership reference `"<slug>.<id>"`
pub fn ownership_ref(slug: &str, id: u64) -> String {
    format!("{}.{}", slug, id)
}

/// Partial update for an existing document.
///
/// Keys present overwrite stored fields; absent keys are left alone. The
/// reserved `_uid` and `_metadata` keys are dropped on construction, so a
/// patch can never rewrite them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    fields: Record,
}

impl DocumentPatch {
    pub fn from_record(mut record: Record) -> Self {
        record.remove(UID_KEY);
        record.remove(METADATA_KEY);
        Self { fields: record }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_record(self) -> Record {
        self.fields
    }
}
