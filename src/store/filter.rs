//! # Record Filters
//!
//! A filter is a conjunction of field-equality clauses. A `null` clause
//! matches both an explicit JSON null and an absent field.

use serde_json::Value;

use super::backend::Record;

/// Equality filter over top-level record fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter on a single field
    pub fn by(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Add an equality clause
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// Add a clause requiring the field to be null or absent
    pub fn and_null(self, field: impl Into<String>) -> Self {
        self.and(field, Value::Null)
    }

    /// Test a record against every clause
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|(field, expected)| match record.get(field) {
            Some(actual) => actual == expected,
            None => expected.is_null(),
        })
    }
}
