use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Value record managed by a form, keyed by field name
pub type Record = Map<String, Value>;

/// Per-field error messages; an empty message means the field is valid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorRecord(BTreeMap<String, String>);

impl ErrorRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record holding an empty message for every name
    pub fn for_fields<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            names
                .into_iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
        )
    }

    /// Message for a field, empty when valid or unknown
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.0.insert(name.into(), message.into());
    }

    /// Mark a field as valid
    pub fn clear(&mut self, name: &str) {
        if let Some(message) = self.0.get_mut(name) {
            message.clear();
        }
    }

    /// Check if any field carries a message
    pub fn has_errors(&self) -> bool {
        self.0.values().any(|message| !message.is_empty())
    }

    /// Fields with a non-empty message, in name order
    pub fn invalid_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(_, message)| !message.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, message)| (name.as_str(), message.as_str()))
    }

    /// Number of entries, valid ones included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ErrorRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, message)| (name.into(), message.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record() {
        let mut errors = ErrorRecord::for_fields(["email", "name"]);
        assert_eq!(errors.len(), 2);
        assert!(!errors.has_errors());
        assert_eq!(errors.get("email"), "");
        assert_eq!(errors.get("unknown"), "");

        errors.set("email", "Email is required");
        assert!(errors.has_errors());
        assert_eq!(
            errors.invalid_fields().collect::<Vec<_>>(),
            vec![("email", "Email is required")]
        );

        errors.clear("email");
        assert!(!errors.has_errors());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_error_record_serializes_as_map() {
        let errors: ErrorRecord = [("email", "Email is required"), ("name", "")]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "email": "Email is required", "name": "" })
        );
    }
}
