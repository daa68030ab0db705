//! HTTP error rendering
//!
//! Every failure leaves the server as `{title, message, status}` with the
//! matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::ErrorResponse;
use crate::errors::EngineError;

/// Handler error
#[derive(Debug)]
pub enum HttpError {
    /// Engine failure
    Engine(EngineError),
    /// Request could not be parsed before reaching the engine
    BadRequest(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::Engine(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            HttpError::Engine(e) => ErrorResponse::from_error(e),
            HttpError::BadRequest(message) => ErrorResponse {
                title: "Bad Request".to_string(),
                message: message.clone(),
                status: 400,
            },
        }
    }
}

impl From<EngineError> for HttpError {
    fn from(err: EngineError) -> Self {
        HttpError::Engine(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if let HttpError::Engine(e) = &self {
            if !e.is_client_error() {
                tracing::error!(error = %e, "request failed");
            }
        }
        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type for route handlers
pub type HttpResult<T> = Result<T, HttpError>;
