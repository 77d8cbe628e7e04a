use crate::record::{ErrorRecord, Record};
use crate::{FieldDefinition, FieldSchema, FieldsError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

static NULL: Value = Value::Null;

/// A named, parameterized validation rule as written in a form definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

impl ValidationRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn required() -> Self {
        Self::new("required")
    }

    pub fn email() -> Self {
        Self::new("email")
    }

    /// Cross-field equality against `matcher_field`
    pub fn matches(matcher_field: impl Into<String>, matcher_label: impl Into<String>) -> Self {
        Self::new("match")
            .with_parameter("matcherField", matcher_field.into())
            .with_parameter("matcherLabel", matcher_label.into())
    }

    pub fn gte_zero() -> Self {
        Self::new("gte-zero")
    }

    pub fn gt_zero() -> Self {
        Self::new("gt-zero")
    }

    fn string_parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// A validation rule resolved at schema registration
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Email,
    Match {
        matcher_field: String,
        matcher_label: String,
    },
    GteZero,
    GtZero,
}

impl Rule {
    /// Resolve a rule of `field`; unknown names are a configuration error
    pub fn parse(field: &str, rule: &ValidationRule) -> Result<Self> {
        match rule.name.as_str() {
            "required" => Ok(Rule::Required),
            "email" => Ok(Rule::Email),
            "gte-zero" => Ok(Rule::GteZero),
            "gt-zero" => Ok(Rule::GtZero),
            "match" => {
                let matcher_field = rule
                    .string_parameter("matcherField")
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| FieldsError::InvalidRule {
                        field: field.to_string(),
                        message: "match requires a 'matcherField' parameter".to_string(),
                    })?;
                let matcher_label = rule
                    .string_parameter("matcherLabel")
                    .unwrap_or(matcher_field);

                Ok(Rule::Match {
                    matcher_field: matcher_field.to_string(),
                    matcher_label: matcher_label.to_string(),
                })
            }
            other => Err(FieldsError::UnknownRule {
                field: field.to_string(),
                rule: other.to_string(),
            }),
        }
    }

    /// Evaluate the rule against a field value and the full record
    ///
    /// On number fields a value that does not coerce to a number counts as
    /// absent.
    pub fn evaluate(
        &self,
        field: &FieldDefinition,
        value: &Value,
        record: &Record,
    ) -> Option<String> {
        let label = &field.label;
        match self {
            Rule::Required => {
                let absent =
                    is_blank(value) || (field.kind.is_numeric() && as_number(value).is_none());
                absent.then(|| format!("{} is required", label))
            }
            Rule::Email => {
                if is_blank(value) {
                    return None;
                }
                let valid = value
                    .as_str()
                    .map(|email| EMAIL_PATTERN.is_match(email))
                    .unwrap_or(false);
                (!valid).then(|| format!("{} must be a valid email address", label))
            }
            Rule::Match {
                matcher_field,
                matcher_label,
            } => {
                let expected = record.get(matcher_field).unwrap_or(&NULL);
                (value != expected).then(|| format!("{} must match {}", label, matcher_label))
            }
            Rule::GteZero => as_number(value)
                .filter(|n| *n < 0.0)
                .map(|_| format!("{} must be zero or greater", label)),
            Rule::GtZero => as_number(value)
                .filter(|n| *n <= 0.0)
                .map(|_| format!("{} must be greater than zero", label)),
        }
    }
}

/// Field validator for running rules over form values
pub struct FieldValidator;

impl FieldValidator {
    /// Run rules in order and stop at the first failure
    pub fn validate_field(field: &FieldDefinition, rules: &[Rule], record: &Record) -> Option<String> {
        let value = record.get(&field.name).unwrap_or(&NULL);

        let message = rules
            .iter()
            .find_map(|rule| rule.evaluate(field, value, record));

        if let Some(message) = &message {
            debug!("Field '{}' failed validation: {}", field.name, message);
        }

        message
    }

    /// Validate every field in declaration order
    pub fn validate_all(schema: &FieldSchema, values: &Record) -> ErrorRecord {
        schema
            .compiled()
            .map(|(field, rules)| {
                let message = Self::validate_field(field, rules, values).unwrap_or_default();
                (field.name.clone(), message)
            })
            .collect()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
