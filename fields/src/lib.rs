//! # Fields Crate
//!
//! Field schema and validation rules for the declarative form engine.
//!
//! - **Field kinds**: text, select (single or multiple), switch, date,
//!   date-time and custom, each with its own kind configuration
//! - **Validation rules**: `required`, `email`, `match`, `gte-zero` and
//!   `gt-zero`, evaluated in order with the first failure winning
//! - **Schema registration**: rule names and field names are checked once,
//!   when a [`FieldSchema`] is built, never while values are edited
//!
//! ## Usage
//!
//! ```rust
//! use fields::{FieldDefinition, FieldSchema, ValidationRule};
//! use serde_json::json;
//!
//! let schema = FieldSchema::new(vec![
//!     FieldDefinition::text("email", "Email")
//!         .required()
//!         .with_validation(ValidationRule::email()),
//! ])
//! .unwrap();
//!
//! let values = json!({ "email": "" }).as_object().cloned().unwrap();
//! let errors = schema.validate_all(&values);
//! assert_eq!(errors.get("email"), "Email is required");
//! ```

use std::collections::HashSet;

pub mod error;
pub mod field_types;
pub mod record;
pub mod validation;

pub use error::{FieldsError, Result};
pub use field_types::{
    ChangeHook, FieldDefinition, FieldKind, SelectConfig, SelectOption, DEFAULT_DATE_FORMAT,
    DEFAULT_DATE_TIME_FORMAT,
};
pub use record::{ErrorRecord, Record};
pub use validation::{FieldValidator, Rule, ValidationRule};

/// Registered field schema of one form
///
/// Field names are unique and every validation rule has been resolved, so
/// evaluating the schema cannot fail on configuration.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<FieldDefinition>,
    rules: Vec<Vec<Rule>>,
}

impl FieldSchema {
    /// Register a list of field definitions
    pub fn new(fields: Vec<FieldDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(fields.len());

        for field in &fields {
            field.validate()?;

            if !seen.insert(field.name.as_str()) {
                return Err(FieldsError::DuplicateField(field.name.clone()));
            }

            let field_rules = field
                .validations
                .iter()
                .map(|rule| Rule::parse(&field.name, rule))
                .collect::<Result<Vec<_>>>()?;
            rules.push(field_rules);
        }

        tracing::debug!("Registered field schema with {} fields", fields.len());

        Ok(Self { fields, rules })
    }

    /// Get all fields in declaration order
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Get field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the resolved rules of a field
    pub fn rules(&self, name: &str) -> Option<&[Rule]> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|index| self.rules[index].as_slice())
    }

    pub(crate) fn compiled(&self) -> impl Iterator<Item = (&FieldDefinition, &[Rule])> {
        self.fields
            .iter()
            .zip(self.rules.iter().map(Vec::as_slice))
    }

    /// Validate one field against the record
    pub fn validate_field(&self, name: &str, values: &Record) -> Result<Option<String>> {
        let (field, rules) = self
            .compiled()
            .find(|(field, _)| field.name == name)
            .ok_or_else(|| FieldsError::NotFound(name.to_string()))?;

        Ok(FieldValidator::validate_field(field, rules, values))
    }

    /// Validate every field, one entry per field
    pub fn validate_all(&self, values: &Record) -> ErrorRecord {
        FieldValidator::validate_all(self, values)
    }

    /// Error record with every field valid
    pub fn empty_errors(&self) -> ErrorRecord {
        ErrorRecord::for_fields(self.names())
    }

    /// Record holding each field's empty value
    pub fn default_values(&self) -> Record {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.kind.empty_value()))
            .collect()
    }
}

impl TryFrom<Vec<FieldDefinition>> for FieldSchema {
    type Error = FieldsError;

    fn try_from(fields: Vec<FieldDefinition>) -> Result<Self> {
        Self::new(fields)
    }
}
