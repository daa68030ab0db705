//! Upload HTTP Routes
//!
//! `POST /api/upload/:token` takes the raw file body with its MIME type in
//! `Content-Type`. `GET /api/upload/:token` reports the token's metadata.
//!
//! The request body limit follows the configured byte ceiling, and a body
//! over it is reported as `FileTooLarge` like any other oversized file.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};

use crate::errors::EngineError;
use crate::upload::{FileMetadata, Redemption};

use super::error::{HttpError, HttpResult};
use super::extract::identify;
use super::server::AppState;

pub fn upload_routes(max_file_size: u64) -> Router<AppState> {
    let limit = usize::try_from(max_file_size).unwrap_or(usize::MAX);
    Router::new()
        .route("/:token", get(status_handler).post(redeem_handler))
        .layer(DefaultBodyLimit::max(limit))
}

/// MIME type of the body, without parameters
fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

async fn redeem_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> HttpResult<Json<Redemption>> {
    let identity = identify(&state, &headers).await?;
    let body = body.map_err(|rejection| body_error(&state, &headers, rejection))?;
    let redemption = state
        .api
        .redeem_upload(&identity, &token, &content_type(&headers), &body)
        .await?;
    Ok(Json(redemption))
}

/// Map a body that failed to buffer onto the engine's error shape
fn body_error(state: &AppState, headers: &HeaderMap, rejection: BytesRejection) -> HttpError {
    if rejection.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return HttpError::BadRequest(rejection.body_text());
    }
    let max = state.api.uploads().limits().max_file_size;
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(max.saturating_add(1));
    HttpError::Engine(EngineError::FileTooLarge(declared, max))
}

async fn status_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> HttpResult<Json<FileMetadata>> {
    let identity = identify(&state, &headers).await?;
    Ok(Json(state.api.upload_status(&identity, &token).await?))
}
