//! Schema type definitions
//!
//! Field types are runtime-defined strings. Only `files` has engine-level
//! meaning (it routes through the upload broker); every other type name is
//! carried opaquely for clients.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::is_reserved_collection;

/// Document key holding the allocated id
pub const UID_KEY: &str = "_uid";
/// Document key holding creation/modification metadata
pub const METADATA_KEY: &str = "_metadata";

/// Type name of file upload fields
pub const FILES_TYPE: &str = "files";

/// Field type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// File upload field, minted through the upload broker
    Files,
    /// Any other client-defined type (text, wysiwyg, email, checkbox, ...)
    Named(String),
}

impl FieldType {
    /// Returns the type name
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Files => FILES_TYPE,
            FieldType::Named(name) => name,
        }
    }

    pub fn is_files(&self) -> bool {
        matches!(self, FieldType::Files)
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        if name == FILES_TYPE {
            FieldType::Files
        } else {
            FieldType::Named(name)
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.type_name().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One field of a collection schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field slug, unique within the schema
    pub slug: String,
    /// Field type tag
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Client-defined constraints, carried opaquely
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub constraints: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(slug: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            slug: slug.into(),
            field_type: field_type.into(),
            constraints: Map::new(),
        }
    }

    /// Plain text field
    pub fn text(slug: impl Into<String>) -> Self {
        Self::new(slug, "text")
    }

    /// File upload field
    pub fn files(slug: impl Into<String>) -> Self {
        Self::new(slug, FieldType::Files)
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }
}

/// Collection schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Registry-wide unique collection slug
    #[serde(rename = "collectionSlug")]
    pub collection_slug: String,
    /// Human-readable collection name
    #[serde(rename = "collectionName")]
    pub collection_name: String,
    /// Ordered field definitions
    pub fields: Vec<FieldDefinition>,
}

impl Schema {
    pub fn new(
        collection_slug: impl Into<String>,
        collection_name: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            collection_slug: collection_slug.into(),
            collection_name: collection_name.into(),
            fields,
        }
    }

    /// Field slugs in declaration order
    pub fn field_slugs(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.slug.as_str())
    }

    /// Look up a field by slug
    pub fn field(&self, slug: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.slug == slug)
    }

    /// Fields declared with type `files`
    pub fn file_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.field_type.is_files())
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        validate_collection_slug(&self.collection_slug)?;

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.slug.is_empty() {
                return Err("Field slugs must not be empty".into());
            }
            if field.slug == UID_KEY || field.slug == METADATA_KEY {
                return Err(format!("Field slug '{}' is reserved", field.slug));
            }
            if !seen.insert(field.slug.as_str()) {
                return Err(format!("Duplicate field slug '{}'", field.slug));
            }
        }

        Ok(())
    }
}

/// Checks a collection slug is usable as a collection name
pub fn validate_collection_slug(slug: &str) -> Result<(), String> {
    static SLUG_PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let pattern = SLUG_PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$"))
        .as_ref()
        .map_err(|e| e.to_string())?;
    if !pattern.is_match(slug) {
        return Err(format!(
            "Collection slug '{}' must be lowercase alphanumeric, '_' or '-'",
            slug
        ));
    }
    if is_reserved_collection(slug) {
        return Err(format!("Collection slug '{}' is reserved", slug));
    }
    Ok(())
}

/// Display metadata for one collection, keyed by field slug
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    #[serde(rename = "collectionSlug")]
    pub collection_slug: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// A field definition merged with its display metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribedField {
    #[serde(flatten)]
    pub definition: FieldDefinition,
    #[serde(flatten)]
    pub display: Map<String, Value>,
}

/// A schema merged with its display metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribedSchema {
    #[serde(rename = "collectionSlug")]
    pub collection_slug: String,
    #[serde(rename = "collectionName")]
    pub collection_name: String,
    pub fields: Vec<DescribedField>,
}

impl DescribedSchema {
    /// Join a schema with its display metadata field by field.
    ///
    /// Missing display entries leave a field undecorated. Display keys that
    /// collide with definition keys are skipped.
    pub fn join(schema: Schema, display: Option<&DisplayMetadata>) -> Self {
        let fields = schema
            .fields
            .into_iter()
            .map(|definition| {
                let display = display
                    .and_then(|d| d.fields.get(&definition.slug))
                    .and_then(Value::as_object)
                    .map(|props| {
                        props
                            .iter()
                            .filter(|(key, _)| !matches!(key.as_str(), "slug" | "type" | "constraints"))
                            .map(|(key, value)| (key.clone(), value.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                DescribedField {
                    definition,
                    display,
                }
            })
            .collect();

        Self {
            collection_slug: schema.collection_slug,
            collection_name: schema.collection_name,
            fields,
        }
    }
}
