//! Observable events
//!
//! Every state transition in the engine logs one of these names as the
//! `event` field of a `tracing` record. Names are stable upper-snake strings.

use std::fmt;

/// Observable events in dynbase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Data directory initialized
    DataDirInitialized,
    /// Server bound and serving
    Serving,
    /// Server shut down
    ShutdownComplete,

    // Schema registry
    SchemaCreated,
    SchemaUpdated,
    SchemaDeleted,
    DisplayUpdated,

    // Documents
    DocumentCreated,
    DocumentUpdated,
    DocumentDeleted,

    // Uploads
    /// Pending file metadata persisted for a declared file
    UploadMinted,
    /// Bytes written and metadata finalized
    UploadRedeemed,
    /// Pending record deleted after its link expired
    UploadExpired,
    /// Minted metadata removed after a failed create
    UploadRolledBack,
    /// Explicit sweep of expired pending records
    UploadPurged,

    // Access control
    /// Bearer credential rejected
    AuthenticationFailed,
    /// Role or ownership gate refused a request
    AuthorizationDenied,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DataDirInitialized => "DATA_DIR_INITIALIZED",
            Event::Serving => "DYNBASE_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::SchemaCreated => "SCHEMA_CREATED",
            Event::SchemaUpdated => "SCHEMA_UPDATED",
            Event::SchemaDeleted => "SCHEMA_DELETED",
            Event::DisplayUpdated => "DISPLAY_UPDATED",

            Event::DocumentCreated => "DOCUMENT_CREATED",
            Event::DocumentUpdated => "DOCUMENT_UPDATED",
            Event::DocumentDeleted => "DOCUMENT_DELETED",

            Event::UploadMinted => "UPLOAD_MINTED",
            Event::UploadRedeemed => "UPLOAD_REDEEMED",
            Event::UploadExpired => "UPLOAD_EXPIRED",
            Event::UploadRolledBack => "UPLOAD_ROLLED_BACK",
            Event::UploadPurged => "UPLOAD_PURGED",

            Event::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Event::AuthorizationDenied => "AUTHORIZATION_DENIED",
        }
    }

    /// Returns true for events that report a refused request
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Event::AuthenticationFailed | Event::AuthorizationDenied
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
