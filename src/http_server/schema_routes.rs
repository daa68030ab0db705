//! Schema HTTP Routes
//!
//! `/api/schema[/:slug[/display]]`. Editor role and above.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};

use crate::api::{CreateSchemaRequest, DisplayRequest, StatusResponse, UpdateSchemaRequest};
use crate::schema::{DescribedSchema, DisplayMetadata, Schema};

use super::collection_routes::json_body;
use super::error::HttpResult;
use super::extract::identify;
use super::server::AppState;

pub fn schema_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route(
            "/:slug",
            get(read_handler).put(update_handler).delete(delete_handler),
        )
        .route("/:slug/display", put(display_handler))
}

async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HttpResult<Json<Vec<DescribedSchema>>> {
    let identity = identify(&state, &headers).await?;
    Ok(Json(state.api.list_schemas(&identity).await?))
}

async fn read_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> HttpResult<Json<DescribedSchema>> {
    let identity = identify(&state, &headers).await?;
    Ok(Json(state.api.read_schema(&identity, &slug).await?))
}

async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateSchemaRequest>, JsonRejection>,
) -> HttpResult<Json<Schema>> {
    let identity = identify(&state, &headers).await?;
    let request = json_body(payload)?;
    Ok(Json(state.api.create_schema(&identity, request).await?))
}

async fn update_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<UpdateSchemaRequest>, JsonRejection>,
) -> HttpResult<Json<Schema>> {
    let identity = identify(&state, &headers).await?;
    let request = json_body(payload)?;
    Ok(Json(state.api.update_schema(&identity, &slug, request).await?))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> HttpResult<Json<StatusResponse>> {
    let identity = identify(&state, &headers).await?;
    Ok(Json(state.api.delete_schema(&identity, &slug).await?))
}

async fn display_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<DisplayRequest>, JsonRejection>,
) -> HttpResult<Json<DisplayMetadata>> {
    let identity = identify(&state, &headers).await?;
    let request = json_body(payload)?;
    Ok(Json(state.api.set_display(&identity, &slug, request).await?))
}
