//! # Upload Broker
//!
//! Expiring one-time upload tokens for `files` fields, plus the byte
//! storage they redeem into.

mod backend;
mod broker;
mod errors;
mod limits;
mod local;
mod metadata;

pub use backend::ByteStorage;
pub use broker::{PendingUploads, Redemption, UploadBroker, TOKEN_LENGTH};
pub use errors::{StorageError, StorageResult};
pub use limits::{UploadLimits, DEFAULT_LINK_TTL_SECS, DEFAULT_MAX_FILE_SIZE};
pub use local::LocalBackend;
pub use metadata::{FileDescriptor, FileMetadata, FileState, CONTENT_TYPE_KEY};
