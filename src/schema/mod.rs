//! Schema subsystem for dynbase
//!
//! Schemas are runtime data, not code: each collection is described by an
//! ordered list of field definitions stored in the document store.
//!
//! # Rules
//!
//! - Collection slugs are unique registry-wide
//! - Field slugs are unique within a schema
//! - Create requires the exact field set; edit accepts any subset
//! - Deleting a schema never cascades to documents

mod registry;
mod types;
mod validator;

pub use registry::SchemaRegistry;
pub use types::{
    validate_collection_slug, DescribedField, DescribedSchema, DisplayMetadata, FieldDefinition,
    FieldType, Schema, FILES_TYPE, METADATA_KEY, UID_KEY,
};
pub use validator::SchemaValidator;
