//! Schema validator for inbound documents
//!
//! Validation semantics:
//! - Create: the document's key set must equal the schema's field slugs
//! - Edit: every key must be a declared field slug; absent keys are kept
//!
//! Validation compares slug sets only. Values are not type-checked, and
//! `files` fields are shape-checked later by the upload broker.
//! Validation never mutates its input.

use std::collections::HashSet;

use serde_json::Value;

use crate::collections::DocumentPatch;
use crate::errors::{EngineError, EngineResult, ValidationDetails};
use crate::store::Record;

use super::types::Schema;

/// Validates documents against one schema
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Interpret a request body as a document object
    pub fn as_document<'v>(&self, value: &'v Value) -> EngineResult<&'v Record> {
        value.as_object().ok_or_else(|| {
            EngineError::invalid_schema(
                &self.schema.collection_slug,
                ValidationDetails::not_an_object(json_type_name(value)),
            )
        })
    }

    /// Validates a full document for create.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` naming the first missing field (in declaration order)
    /// or, failing that, the first undeclared key.
    pub fn validate_create(&self, document: &Record) -> EngineResult<()> {
        for slug in self.schema.field_slugs() {
            if !document.contains_key(slug) {
                return Err(self.fail(ValidationDetails::missing_field(slug)));
            }
        }

        let declared: HashSet<&str> = self.schema.field_slugs().collect();
        if let Some(extra) = document.keys().find(|k| !declared.contains(k.as_str())) {
            return Err(self.fail(ValidationDetails::extra_field(extra.as_str())));
        }

        Ok(())
    }

    /// Validates a partial document for edit.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` naming the first undeclared key.
    pub fn validate_edit(&self, patch: &DocumentPatch) -> EngineResult<()> {
        let declared: HashSet<&str> = self.schema.field_slugs().collect();
        if let Some(extra) = patch.keys().find(|k| !declared.contains(k.as_str())) {
            return Err(self.fail(ValidationDetails::extra_field(extra.as_str())));
        }
        Ok(())
    }

    fn fail(&self, details: ValidationDetails) -> EngineError {
        EngineError::invalid_schema(&self.schema.collection_slug, details)
    }
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::schema::FieldDefinition;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(
            "test_1",
            "Test 1",
            vec![FieldDefinition::text("a"), FieldDefinition::text("b")],
        )
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_exact_key_set_passes() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);
        assert!(validator.validate_create(&record(json!({"a": 1, "b": 2}))).is_ok());
    }

    #[test]
    fn test_missing_field_fails() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);

        let err = validator.validate_create(&record(json!({"a": 1}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
        assert_eq!(err.details().unwrap().field, "b");
        assert_eq!(err.details().unwrap().actual, "missing");
    }

    #[test]
    fn test_extra_field_fails() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);

        let err = validator
            .validate_create(&record(json!({"a": 1, "b": 2, "c": 3})))
            .unwrap_err();
        assert_eq!(err.details().unwrap().field, "c");
    }

    #[test]
    fn test_same_cardinality_wrong_slugs_fails() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);
        assert!(validator.validate_create(&record(json!({"a": 1, "z": 2}))).is_err());
    }

    #[test]
    fn test_values_are_not_type_checked() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);
        let doc = record(json!({"a": null, "b": [1, {"x": true}]}));
        assert!(validator.validate_create(&doc).is_ok());
    }

    #[test]
    fn test_edit_subset_passes() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);

        assert!(validator.validate_edit(&DocumentPatch::from_record(record(json!({"b": 5})))).is_ok());
        assert!(validator.validate_edit(&DocumentPatch::default()).is_ok());
    }

    #[test]
    fn test_edit_unknown_key_fails() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);

        let patch = DocumentPatch::from_record(record(json!({"a": 1, "nope": 2})));
        let err = validator.validate_edit(&patch).unwrap_err();
        assert_eq!(err.details().unwrap().field, "nope");
    }

    #[test]
    fn test_non_object_body_rejected() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);

        let err = validator.as_document(&json!([1, 2])).unwrap_err();
        assert_eq!(err.details().unwrap().field, "$root");
        assert_eq!(err.details().unwrap().actual, "array");
    }
}
