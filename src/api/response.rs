//! API response types

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Error body: `{title, message, status}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub title: String,
    pub message: String,
    pub status: u16,
}

impl ErrorResponse {
    pub fn from_error(err: &EngineError) -> Self {
        Self {
            title: err.title().to_string(),
            message: err.to_string(),
            status: err.status_code(),
        }
    }

    /// Body for an unmatched route
    pub fn not_found(path: &str) -> Self {
        Self {
            title: "Not Found".to_string(),
            message: format!("Invalid route {}", path),
            status: 404,
        }
    }
}

/// Acknowledgement for operations without a resource to return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let resp = ErrorResponse::from_error(&EngineError::SchemaNotFound("x".into()));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["title"], "Schema does not exist");
        assert_eq!(json["status"], 404);
        assert!(json["message"].as_str().unwrap().contains("x"));
    }
}
