//! Upload ceilings

use chrono::Duration;

use crate::errors::{EngineError, EngineResult};

/// Default byte ceiling per file
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;
/// Default lifetime of an upload link, in seconds
pub const DEFAULT_LINK_TTL_SECS: i64 = 60 * 60;

/// Size and type limits applied at mint and again at redeem
#[derive(Debug, Clone, PartialEq)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub accepted_mime: Vec<String>,
    pub link_ttl: Duration,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accepted_mime: vec!["audio/ogg".to_string(), "image/jpeg".to_string()],
            link_ttl: Duration::seconds(DEFAULT_LINK_TTL_SECS),
        }
    }
}

impl UploadLimits {
    pub fn accepts(&self, content_type: &str) -> bool {
        self.accepted_mime.iter().any(|m| m == content_type)
    }

    /// # Errors
    ///
    /// `InvalidMime` (415) if the type is not on the allow-list.
    pub fn check_mime(&self, content_type: &str) -> EngineResult<()> {
        if self.accepts(content_type) {
            Ok(())
        } else {
            Err(EngineError::InvalidMime(content_type.to_string()))
        }
    }

    /// # Errors
    ///
    /// `FileTooLarge` (413) above the byte ceiling.
    pub fn check_size(&self, size: u64) -> EngineResult<()> {
        if size > self.max_file_size {
            Err(EngineError::FileTooLarge(size, self.max_file_size))
        } else {
            Ok(())
        }
    }
}
