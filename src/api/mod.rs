//! API layer for dynbase
//!
//! Transport-free orchestration. Every mutating operation runs in the same
//! order:
//!
//! 1. Authorization gate (role, then ownership where it applies)
//! 2. Schema lookup and structural validation
//! 3. Upload minting for `files` fields (create only)
//! 4. Store write
//!
//! Nothing is written before steps 1-3 pass.

mod handler;
mod request;
mod response;

pub use handler::ApiHandler;
pub use request::{CreateSchemaRequest, DisplayRequest, UpdateSchemaRequest};
pub use response::{ErrorResponse, StatusResponse};
