//! API request bodies

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::schema::FieldDefinition;

/// Body of a schema create
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSchemaRequest {
    #[serde(rename = "collectionSlug")]
    pub slug: String,
    #[serde(rename = "collectionName")]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Body of a schema update; absent parts are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSchemaRequest {
    #[serde(rename = "collectionName", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldDefinition>>,
}

/// Body of a display-metadata upsert: field slug to display props
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayRequest {
    #[serde(default)]
    pub fields: Map<String, Value>,
}
