//! dynbase - schema-driven dynamic collections with one-time upload links
//!
//! Collections are defined at runtime by schemas; documents are validated
//! structurally against them on every write. File fields are declared at
//! document create and redeemed later through expiring one-time tokens.

pub mod api;
pub mod auth;
pub mod cli;
pub mod collections;
pub mod errors;
pub mod http_server;
pub mod observability;
pub mod schema;
pub mod sequence;
pub mod store;
pub mod upload;
