//! Collection HTTP Routes
//!
//! `/api/collections/:slug[/:id]`. Reads need any authenticated identity;
//! writes are gated by the engine.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::collections::Document;

use super::error::{HttpError, HttpResult};
use super::extract::identify;
use super::server::AppState;

pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/:slug", get(list_handler).post(create_handler))
        .route(
            "/:slug/:id",
            get(get_handler)
                .post(update_handler)
                .patch(update_handler)
                .delete(delete_handler),
        )
}

/// Parse a document id path segment
fn parse_id(raw: &str) -> HttpResult<u64> {
    raw.parse()
        .map_err(|_| HttpError::BadRequest(format!("Invalid document ID \"{}\"", raw)))
}

/// Unwrap a JSON body or report why it was rejected
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> HttpResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| HttpError::BadRequest(rejection.body_text()))
}

async fn list_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> HttpResult<Json<Vec<Document>>> {
    identify(&state, &headers).await?;
    Ok(Json(state.api.list_documents(&slug).await?))
}

async fn get_handler(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> HttpResult<Json<Document>> {
    identify(&state, &headers).await?;
    let id = parse_id(&id)?;
    Ok(Json(state.api.get_document(&slug, id).await?))
}

async fn create_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> HttpResult<Json<Document>> {
    let identity = identify(&state, &headers).await?;
    let body = json_body(payload)?;
    Ok(Json(state.api.create_document(&identity, &slug, body).await?))
}

async fn update_handler(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> HttpResult<Json<Document>> {
    let identity = identify(&state, &headers).await?;
    let id = parse_id(&id)?;
    let body = json_body(payload)?;
    Ok(Json(state.api.update_document(&identity, &slug, id, body).await?))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> HttpResult<Json<Document>> {
    let identity = identify(&state, &headers).await?;
    let id = parse_id(&id)?;
    Ok(Json(state.api.delete_document(&identity, &slug, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("-1").is_err());
    }
}
