//! # Engine Errors
//!
//! Every core operation returns a typed failure. The HTTP boundary renders
//! each one as `{title, message, status}` using the accessors below.

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Stable error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidSchema,
    Forbidden,
    AuthTokenInvalid,
    InvalidMime,
    MimeMismatch,
    FileTooLarge,
    UploadLinkExpired,
    InvalidUploadUrl,
    DuplicateSlug,
    Internal,
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Offending field slug (`$root` for the document itself)
    pub field: String,
    /// Expected condition
    pub expected: String,
    /// What was found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared fields", "extra field present")
    }

    pub fn not_an_object(actual: impl Into<String>) -> Self {
        Self::new("$root", "object", actual)
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Engine error
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Schema \"{0}\" does not exist")]
    SchemaNotFound(String),

    #[error("Model with ID {id} does not exist in the collection {slug}")]
    DocumentNotFound { slug: String, id: u64 },

    #[error("The provided fields do not match the schema of {slug}: {details}")]
    InvalidSchema {
        slug: String,
        details: ValidationDetails,
    },

    #[error("Malformed schema definition: {0}")]
    MalformedSchema(String),

    #[error("A collection with slug \"{0}\" already exists")]
    DuplicateSlug(String),

    #[error("User not allowed this resource")]
    Forbidden,

    #[error("User not allowed to modify {0}")]
    NotOwner(String),

    #[error("{0}")]
    AuthTokenInvalid(String),

    #[error("File type \"{0}\" is not supported")]
    InvalidMime(String),

    #[error("File type \"{actual}\" does not match metadata entry \"{declared}\"")]
    MimeMismatch { declared: String, actual: String },

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    #[error("This upload link has expired")]
    UploadLinkExpired,

    #[error("Upload URL is invalid")]
    InvalidUploadUrl,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns the taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::SchemaNotFound(_) | EngineError::DocumentNotFound { .. } => {
                ErrorKind::NotFound
            }
            EngineError::InvalidSchema { .. } | EngineError::MalformedSchema(_) => {
                ErrorKind::InvalidSchema
            }
            EngineError::DuplicateSlug(_) => ErrorKind::DuplicateSlug,
            EngineError::Forbidden | EngineError::NotOwner(_) => ErrorKind::Forbidden,
            EngineError::AuthTokenInvalid(_) => ErrorKind::AuthTokenInvalid,
            EngineError::InvalidMime(_) => ErrorKind::InvalidMime,
            EngineError::MimeMismatch { .. } => ErrorKind::MimeMismatch,
            EngineError::FileTooLarge(_, _) => ErrorKind::FileTooLarge,
            EngineError::UploadLinkExpired => ErrorKind::UploadLinkExpired,
            EngineError::InvalidUploadUrl => ErrorKind::InvalidUploadUrl,
            EngineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidSchema => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::AuthTokenInvalid => 403,
            ErrorKind::InvalidMime => 415,
            ErrorKind::MimeMismatch => 400,
            ErrorKind::FileTooLarge => 413,
            ErrorKind::UploadLinkExpired => 400,
            ErrorKind::InvalidUploadUrl => 400,
            ErrorKind::DuplicateSlug => 409,
            ErrorKind::Internal => 500,
        }
    }

    /// Short human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            EngineError::SchemaNotFound(_) => "Schema does not exist",
            EngineError::DocumentNotFound { .. } => "Model does not exist",
            EngineError::InvalidSchema { .. } | EngineError::MalformedSchema(_) => "Invalid Schema",
            EngineError::DuplicateSlug(_) => "Duplicate Slug",
            EngineError::Forbidden | EngineError::NotOwner(_) => "Forbidden",
            EngineError::AuthTokenInvalid(_) => "Auth Token Invalid",
            EngineError::InvalidMime(_) => "Invalid MIME type",
            EngineError::MimeMismatch { .. } => "MIME Type Mismatch",
            EngineError::FileTooLarge(_, _) => "File Too Large",
            EngineError::UploadLinkExpired => "Upload Link Expired",
            EngineError::InvalidUploadUrl => "Invalid upload URL",
            EngineError::Internal(_) => "Internal Server Error",
        }
    }

    /// Returns whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Validation details, if this is a schema mismatch
    pub fn details(&self) -> Option<&ValidationDetails> {
        match self {
            EngineError::InvalidSchema { details, .. } => Some(details),
            _ => None,
        }
    }

    pub(crate) fn invalid_schema(slug: impl Into<String>, details: ValidationDetails) -> Self {
        EngineError::InvalidSchema {
            slug: slug.into(),
            details,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Internal(err.to_string())
    }
}
