//! # HTTP Server
//!
//! Combines the collection, schema and upload routers under `/api`, plus
//! `/health`. Every request is traced and CORS is applied from config.

use std::net::SocketAddr;

use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{ApiHandler, ErrorResponse};
use crate::auth::Authenticator;
use crate::observability::Event;

use super::collection_routes::collection_routes;
use super::config::HttpServerConfig;
use super::schema_routes::schema_routes;
use super::upload_routes::upload_routes;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub api: ApiHandler,
    pub authenticator: Authenticator,
}

impl AppState {
    pub fn new(api: ApiHandler, authenticator: Authenticator) -> Self {
        Self { api, authenticator }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}

async fn fallback_handler(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found(uri.path())),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the full router over shared state
pub fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
    let max_file_size = state.api.uploads().limits().max_file_size;
    let api = Router::new()
        .nest("/collections", collection_routes())
        .nest("/schema", schema_routes())
        .nest("/upload", upload_routes(max_file_size));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .fallback(fallback_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
}

/// HTTP server for dynbase
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            event = %Event::Serving,
            addr = %addr,
            base_url = %self.config.base_url(),
            "dynbase serving"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!(event = %Event::ShutdownComplete, "server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
