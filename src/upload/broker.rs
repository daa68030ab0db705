//! # Upload Broker
//!
//! Two-step hand-off for `files` fields:
//!
//! 1. **Mint** at document create: each declared file gets a pending metadata
//!    record and a one-time redemption token. Every descriptor is checked
//!    before anything is persisted.
//! 2. **Redeem** at `POST /api/upload/<token>`: the bytes are written once and
//!    the record is finalized.
//!
//! Redemption is gated twice. The byte write uses create-new semantics on a
//! token-derived name, and the metadata update only matches while
//! `saved_path` is still null.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{EngineError, EngineResult, ValidationDetails};
use crate::observability::Event;
use crate::schema::Schema;
use crate::store::{decode, encode, DocumentStore, Filter, Record, StoreUpdate, FILES_COLLECTION};

use super::backend::ByteStorage;
use super::limits::UploadLimits;
use super::metadata::{carried_props, FileDescriptor, FileMetadata, FileState};

/// Length of generated upload tokens
pub const TOKEN_LENGTH: usize = 20;

/// Directory segment of stored files in permalinks and `saved_path`
const UPLOADS_SEGMENT: &str = "uploads";

/// Minted but not yet persisted uploads for one document
#[derive(Debug, Clone, Default)]
pub struct PendingUploads {
    /// Document fields with each file entry decorated
    pub fields: Record,
    /// Metadata records to persist
    pub records: Vec<FileMetadata>,
}

impl PendingUploads {
    pub fn tokens(&self) -> Vec<String> {
        self.records.iter().map(|r| r.uid.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of a successful redemption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Redemption {
    /// Public permalink of the stored file
    pub resource_path: String,
}

/// Issues and redeems one-time upload tokens
#[derive(Clone)]
pub struct UploadBroker {
    store: Arc<dyn DocumentStore>,
    bytes: Arc<dyn ByteStorage>,
    limits: UploadLimits,
    base_url: String,
}

impl UploadBroker {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        bytes: Arc<dyn ByteStorage>,
        limits: UploadLimits,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            store,
            bytes,
            limits,
            base_url,
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Mint pending metadata for every `files` field of a new document.
    ///
    /// Nothing is persisted; pass the result to [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// `InvalidMime` or `FileTooLarge` for the first offending descriptor,
    /// `InvalidSchema` for a malformed one.
    pub fn prepare(
        &self,
        schema: &Schema,
        fields: Record,
        owner: &str,
    ) -> EngineResult<PendingUploads> {
        let now = Utc::now();
        let mut pending = PendingUploads {
            fields,
            records: Vec::new(),
        };

        for field in schema.file_fields() {
            let Some(value) = pending.fields.get_mut(&field.slug) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if let Value::Array(entries) = value {
                for entry in entries.iter_mut() {
                    pending.records.push(self.mint(&field.slug, entry, owner, now)?);
                }
                continue;
            }
            if !value.is_object() {
                return Err(EngineError::invalid_schema(
                    &schema.collection_slug,
                    ValidationDetails::new(
                        field.slug.as_str(),
                        "file descriptor list",
                        "scalar value",
                    ),
                ));
            }
            pending.records.push(self.mint(&field.slug, value, owner, now)?);
        }

        Ok(pending)
    }

    /// Persist minted records, all or nothing
    pub async fn commit(&self, pending: &PendingUploads) -> EngineResult<()> {
        for (index, record) in pending.records.iter().enumerate() {
            let persisted = match encode(record) {
                Ok(encoded) => self.store.insert(FILES_COLLECTION, encoded).await,
                Err(e) => Err(e),
            };
            if let Err(err) = persisted {
                let written: Vec<String> =
                    pending.records[..index].iter().map(|r| r.uid.clone()).collect();
                self.rollback(&written).await;
                return Err(err.into());
            }
            tracing::info!(
                event = %Event::UploadMinted,
                token = %record.uid,
                owner = %record.file_owner,
                content_type = %record.content_type,
                "upload minted"
            );
        }
        Ok(())
    }

    /// Remove pending records minted for a create that did not complete.
    ///
    /// Best-effort: failures are logged, not returned.
    pub async fn rollback(&self, tokens: &[String]) {
        for token in tokens {
            let token = token.as_str();
            let filter = Filter::by("uid", token).and_null("saved_path");
            match self.store.delete_one(FILES_COLLECTION, &filter).await {
                Ok(_) => tracing::info!(event = %Event::UploadRolledBack, token, "upload rolled back"),
                Err(e) => tracing::error!(token, error = %e, "upload rollback failed"),
            }
        }
    }

    /// Redeem a token with the uploaded bytes.
    ///
    /// # Errors
    ///
    /// In order: `InvalidMime`, `FileTooLarge`, `InvalidUploadUrl` (unknown
    /// token), `MimeMismatch`, `UploadLinkExpired` (record deleted), and
    /// `InvalidUploadUrl` (already redeemed).
    pub async fn redeem(
        &self,
        token: &str,
        content_type: &str,
        data: &[u8],
    ) -> EngineResult<Redemption> {
        self.limits.check_mime(content_type)?;
        self.limits.check_size(data.len() as u64)?;

        let metadata = self.find(token).await?.ok_or(EngineError::InvalidUploadUrl)?;
        if metadata.content_type != content_type {
            return Err(EngineError::MimeMismatch {
                declared: metadata.content_type,
                actual: content_type.to_string(),
            });
        }

        let now = Utc::now();
        match metadata.state(now) {
            FileState::Expired => return Err(self.destroy_expired(token).await),
            FileState::Finalized => return Err(EngineError::InvalidUploadUrl),
            FileState::Pending => {}
        }

        let saved_name = metadata.saved_name();
        self.bytes.write_new(&saved_name, data).await?;

        let permalink = self.permalink(&saved_name);
        let update = StoreUpdate::new()
            .set("saved_path", format!("{}/{}", UPLOADS_SEGMENT, saved_name))
            .set("file_size", data.len() as u64)
            .set("modified_at", now.to_rfc3339())
            .set("file_permalink", permalink.clone())
            .set("checksum", format!("{:x}", Sha256::digest(data)))
            .unset("uploadExpire")
            .unset("uploadLocation");

        let gate = Filter::by("uid", token).and_null("saved_path");
        let finalized = self.store.update_one(FILES_COLLECTION, &gate, &update).await;
        match finalized {
            Ok(true) => {}
            Ok(false) => {
                // Record vanished under us (swept or expired elsewhere)
                let _ = self.bytes.delete(&saved_name).await;
                return Err(EngineError::InvalidUploadUrl);
            }
            Err(e) => {
                let _ = self.bytes.delete(&saved_name).await;
                return Err(e.into());
            }
        }

        tracing::info!(
            event = %Event::UploadRedeemed,
            token,
            size = data.len(),
            "upload redeemed"
        );
        Ok(Redemption {
            resource_path: permalink,
        })
    }

    /// Read a token's metadata, applying lazy expiry
    pub async fn status(&self, token: &str) -> EngineResult<FileMetadata> {
        let metadata = self.find(token).await?.ok_or(EngineError::InvalidUploadUrl)?;
        if metadata.state(Utc::now()) == FileState::Expired {
            return Err(self.destroy_expired(token).await);
        }
        Ok(metadata)
    }

    /// Delete every pending record past its expiry. Returns how many were removed.
    pub async fn purge_expired(&self) -> EngineResult<usize> {
        let now = Utc::now();
        let records = self
            .store
            .find_all(FILES_COLLECTION, &Filter::all().and_null("saved_path"))
            .await?;

        let mut purged = 0;
        for record in records {
            let metadata: FileMetadata = decode(record)?;
            if metadata.state(now) != FileState::Expired {
                continue;
            }
            let filter = Filter::by("uid", metadata.uid.as_str()).and_null("saved_path");
            if self.store.delete_one(FILES_COLLECTION, &filter).await?.is_some() {
                purged += 1;
            }
        }

        tracing::info!(event = %Event::UploadPurged, purged, "expired uploads purged");
        Ok(purged)
    }

    fn mint(
        &self,
        field: &str,
        entry: &mut Value,
        owner: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<FileMetadata> {
        let descriptor = FileDescriptor::parse(field, entry)?;
        self.limits.check_mime(&descriptor.content_type)?;
        let file_size = descriptor.file_size.unwrap_or(self.limits.max_file_size);
        self.limits.check_size(file_size)?;

        let uid = generate_token();
        let expire = now + self.limits.link_ttl;
        let permalink = self.permalink(&format!("{}{}", uid, descriptor.extension()));

        if let Value::Object(props) = entry {
            props.insert("uid".into(), Value::from(uid.clone()));
            props.insert("permalink".into(), Value::from(permalink.clone()));
            props.insert("upload_link".into(), Value::from(self.upload_link(&uid)));
            props.insert("upload_expire".into(), Value::from(expire.to_rfc3339()));
        }

        Ok(FileMetadata {
            uid,
            extra: carried_props(entry),
            file_name: descriptor.file_name,
            content_type: descriptor.content_type,
            file_size,
            file_owner: owner.to_string(),
            created_at: now,
            modified_at: now,
            file_permalink: permalink,
            saved_path: None,
            upload_expire: Some(expire),
            checksum: None,
        })
    }

    async fn find(&self, token: &str) -> EngineResult<Option<FileMetadata>> {
        match self
            .store
            .find_one(FILES_COLLECTION, &Filter::by("uid", token))
            .await?
        {
            Some(record) => Ok(Some(decode(record)?)),
            None => Ok(None),
        }
    }

    /// Delete an expired pending record and produce the error to report
    async fn destroy_expired(&self, token: &str) -> EngineError {
        let filter = Filter::by("uid", token).and_null("saved_path");
        if let Err(e) = self.store.delete_one(FILES_COLLECTION, &filter).await {
            return e.into();
        }
        tracing::info!(event = %Event::UploadExpired, token, "upload link expired");
        EngineError::UploadLinkExpired
    }

    fn permalink(&self, saved_name: &str) -> String {
        format!("{}/{}/{}", self.base_url, UPLOADS_SEGMENT, saved_name)
    }

    fn upload_link(&self, token: &str) -> String {
        format!("{}/api/upload/{}", self.base_url, token)
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
