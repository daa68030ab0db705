//! Observability for dynbase
//!
//! Structured logging through `tracing`. Every engine state transition
//! emits one record whose `event` field is an [`Event`] name, e.g.
//!
//! ```ignore
//! tracing::info!(event = %Event::SchemaCreated, collection = slug, "schema created");
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{env_filter, init_logging, DEFAULT_LEVEL};
