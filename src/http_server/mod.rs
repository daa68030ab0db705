//! # dynbase HTTP Server Module
//!
//! Reference wiring of the engine onto `axum`.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/collections/:slug[/:id]` - Document CRUD
//! - `/api/schema[/:slug[/display]]` - Schema management
//! - `/api/upload/:token` - Upload redemption and status

mod collection_routes;
mod config;
mod error;
mod extract;
mod schema_routes;
mod server;
mod upload_routes;

pub use config::HttpServerConfig;
pub use error::{HttpError, HttpResult};
pub use extract::bearer_token;
pub use server::{build_router, AppState, HttpServer};
