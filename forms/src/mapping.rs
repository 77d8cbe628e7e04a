//! Reconciles backend-reported field errors onto UI fields.
//!
//! Backends name fields with their own identifiers (`studentId` for the UI's
//! `student`), so each form carries an [`ErrorResponseMapping`] from UI field
//! name to a backend identifier substring. A backend error is assigned to the
//! first mapping entry whose substring occurs in the backend key, and its
//! message is trimmed to start at that substring.

use crate::ordered::OrderedMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Marker stripped from mapped messages
const ID_MARKER: &str = "Id";

/// UI field name to backend identifier substring, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorResponseMapping(OrderedMap);

impl ErrorResponseMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, field: impl Into<String>, backend: impl Into<String>) -> Self {
        self.0.insert(field, backend);
        self
    }

    /// First entry whose backend substring occurs in `backend_key`
    pub fn resolve(&self, backend_key: &str) -> Option<(&str, &str)> {
        self.0
            .iter()
            .find(|(_, backend)| backend_key.contains(backend))
    }

    /// Entries as `(field, backend substring)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }

    /// UI field names this mapping targets
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ErrorResponseMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Failure payload returned by a submit handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    /// Backend field identifier to message, in payload order
    #[serde(default)]
    pub errors: OrderedMap,
}

impl FailureResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, backend_key: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.insert(backend_key, message);
        self
    }
}

/// A backend error assigned to a UI field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedError {
    pub field: String,
    pub backend_key: String,
    pub message: String,
}

/// Result of mapping one failure response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingReport {
    /// Mapped errors in payload order; later entries win for the same field
    pub mapped: Vec<MappedError>,
    /// Backend keys no mapping entry matched
    pub dropped: Vec<String>,
}

impl MappingReport {
    /// Final message per field after last-write-wins
    pub fn field_errors(&self) -> OrderedMap {
        self.mapped
            .iter()
            .map(|error| (error.field.as_str(), error.message.as_str()))
            .collect()
    }
}

/// Error response mapper
pub struct ErrorResponseMapper<'a> {
    mapping: &'a ErrorResponseMapping,
}

impl<'a> ErrorResponseMapper<'a> {
    pub fn new(mapping: &'a ErrorResponseMapping) -> Self {
        Self { mapping }
    }

    /// Map every backend error of a failure response
    pub fn map(&self, response: &FailureResponse) -> MappingReport {
        let mut report = MappingReport::default();

        for (backend_key, raw_message) in response.errors.iter() {
            match self.mapping.resolve(backend_key) {
                Some((field, needle)) => report.mapped.push(MappedError {
                    field: field.to_string(),
                    backend_key: backend_key.to_string(),
                    message: format_backend_message(raw_message, needle),
                }),
                None => {
                    debug!("Dropping backend error '{}': no mapping entry matches", backend_key);
                    report.dropped.push(backend_key.to_string());
                }
            }
        }

        report
    }
}

/// Trim a backend message to start at `needle`, capitalize it and strip
/// every `"Id"`
///
/// Only the first character is uppercased; the rest of the string is left
/// untouched, so `"studentId field"` becomes `"Student field"`.
///
/// When `needle` does not occur in the message the whole message is used.
pub fn format_backend_message(raw_message: &str, needle: &str) -> String {
    let sliced = match raw_message.find(needle) {
        Some(index) => &raw_message[index..],
        None => raw_message,
    };

    capitalize_first(sliced).replace(ID_MARKER, "")
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
