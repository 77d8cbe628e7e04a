use crate::record::Record;
use crate::validation::ValidationRule;
use crate::{FieldsError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Format used by date fields that do not configure one
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used by date-time fields when the value is not RFC 3339
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Side-effect hook of a select field.
///
/// Receives the newly selected value and the record (already holding that
/// value) and returns a patch that is merged into the record. Used to
/// auto-populate dependent fields when an entity is picked from a dropdown.
#[derive(Clone)]
pub struct ChangeHook(Arc<dyn Fn(&Value, &Record) -> Record + Send + Sync>);

impl ChangeHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&Value, &Record) -> Record + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    /// Compute the patch for a new value
    pub fn apply(&self, value: &Value, record: &Record) -> Record {
        (self.0)(value, record)
    }
}

impl fmt::Debug for ChangeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangeHook(..)")
    }
}

/// One entry of a select field's option list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Kind configuration of single- and multi-select fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectConfig {
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(skip)]
    pub on_change: Option<ChangeHook>,
}

/// Field kinds supported by the form engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    Text {
        #[serde(
            default,
            rename = "inputType",
            skip_serializing_if = "Option::is_none"
        )]
        input_type: Option<String>,
    },
    Select(SelectConfig),
    Switch,
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    DateTime {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Custom {
        renderer: String,
    },
}

impl FieldKind {
    /// Name of the kind as it appears in form definitions
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Select(_) => "select",
            FieldKind::Switch => "switch",
            FieldKind::Date { .. } => "date",
            FieldKind::DateTime { .. } => "date-time",
            FieldKind::Custom { .. } => "custom",
        }
    }

    /// Value a field of this kind holds before the user touches it
    pub fn empty_value(&self) -> Value {
        match self {
            FieldKind::Text { .. } => Value::String(String::new()),
            FieldKind::Select(config) if config.multiple => Value::Array(Vec::new()),
            FieldKind::Switch => Value::Bool(false),
            _ => Value::Null,
        }
    }

    /// Check if this kind holds a list of values
    pub fn is_multi_value(&self) -> bool {
        matches!(self, FieldKind::Select(config) if config.multiple)
    }

    /// Check if this is a text field hinted to hold a number
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Text { input_type: Some(hint) } if hint == "number")
    }
}

/// Field definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,
}

impl FieldDefinition {
    /// Create a new field with no validation rules
    pub fn new(name: impl Into<String>, kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            validations: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text { input_type: None }, label)
    }

    pub fn select(
        name: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        let config = SelectConfig {
            options,
            ..SelectConfig::default()
        };
        Self::new(name, FieldKind::Select(config), label)
    }

    pub fn multi_select(
        name: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        let config = SelectConfig {
            options,
            multiple: true,
            on_change: None,
        };
        Self::new(name, FieldKind::Select(config), label)
    }

    pub fn switch(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Switch, label)
    }

    pub fn date(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date { format: None }, label)
    }

    pub fn date_time(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime { format: None }, label)
    }

    pub fn custom(
        name: impl Into<String>,
        label: impl Into<String>,
        renderer: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Custom {
                renderer: renderer.into(),
            },
            label,
        )
    }

    /// Append a validation rule
    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validations.push(rule);
        self
    }

    /// Append the `required` rule
    pub fn required(self) -> Self {
        self.with_validation(ValidationRule::required())
    }

    /// Set the input type hint of a text field
    pub fn with_input_type(mut self, hint: impl Into<String>) -> Self {
        if let FieldKind::Text { input_type } = &mut self.kind {
            *input_type = Some(hint.into());
        }
        self
    }

    /// Set the parse format of a date or date-time field
    pub fn with_format(mut self, pattern: impl Into<String>) -> Self {
        match &mut self.kind {
            FieldKind::Date { format } | FieldKind::DateTime { format } => {
                *format = Some(pattern.into());
            }
            _ => {}
        }
        self
    }

    /// Attach the change hook of a select field
    pub fn on_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &Record) -> Record + Send + Sync + 'static,
    {
        match &mut self.kind {
            FieldKind::Select(config) => config.on_change = Some(ChangeHook::new(hook)),
            other => tracing::warn!(
                "Ignoring change hook on field '{}': {} fields do not support one",
                self.name,
                other.name()
            ),
        }
        self
    }

    /// Get the change hook, if this is a select field with one attached
    pub fn change_hook(&self) -> Option<&ChangeHook> {
        match &self.kind {
            FieldKind::Select(config) => config.on_change.as_ref(),
            _ => None,
        }
    }

    /// Check if this field holds a list of values
    pub fn is_multi_value(&self) -> bool {
        self.kind.is_multi_value()
    }

    /// Validate the field configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(FieldsError::InvalidField(
                "Field name cannot be empty".to_string(),
            ));
        }

        if self.label.is_empty() {
            return Err(FieldsError::InvalidField(format!(
                "Field '{}' label cannot be empty",
                self.name
            )));
        }

        if let FieldKind::Custom { renderer } = &self.kind {
            if renderer.is_empty() {
                return Err(FieldsError::InvalidField(format!(
                    "Field '{}' is custom but has no renderer",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// Parse the value of a date field
    pub fn parse_date(&self, value: &Value) -> Result<Option<NaiveDate>> {
        let format = match &self.kind {
            FieldKind::Date { format } => format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT),
            other => {
                return Err(FieldsError::TypeConversion(format!(
                    "Field '{}' is a {} field, not a date field",
                    self.name,
                    other.name()
                )))
            }
        };

        let Some(raw) = self.temporal_str(value)? else {
            return Ok(None);
        };

        NaiveDate::parse_from_str(raw, format)
            .map(Some)
            .map_err(|e| {
                FieldsError::TypeConversion(format!(
                    "Field '{}' expects a date in format '{}': {}",
                    self.name, format, e
                ))
            })
    }

    /// Parse the value of a date-time field
    ///
    /// Without a configured format, RFC 3339 is tried first and
    /// [`DEFAULT_DATE_TIME_FORMAT`] second.
    pub fn parse_date_time(&self, value: &Value) -> Result<Option<NaiveDateTime>> {
        let format = match &self.kind {
            FieldKind::DateTime { format } => format.as_deref(),
            other => {
                return Err(FieldsError::TypeConversion(format!(
                    "Field '{}' is a {} field, not a date-time field",
                    self.name,
                    other.name()
                )))
            }
        };

        let Some(raw) = self.temporal_str(value)? else {
            return Ok(None);
        };

        if format.is_none() {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Ok(Some(parsed.naive_local()));
            }
        }

        let format = format.unwrap_or(DEFAULT_DATE_TIME_FORMAT);
        NaiveDateTime::parse_from_str(raw, format)
            .map(Some)
            .map_err(|e| {
                FieldsError::TypeConversion(format!(
                    "Field '{}' expects a date-time in format '{}': {}",
                    self.name, format, e
                ))
            })
    }

    fn temporal_str<'v>(&self, value: &'v Value) -> Result<Option<&'v str>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s.as_str())),
            _ => Err(FieldsError::TypeConversion(format!(
                "Field '{}' expects a date string",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_kind_properties() {
        assert_eq!(FieldKind::Switch.name(), "switch");
        assert_eq!(FieldKind::DateTime { format: None }.name(), "date-time");

        assert_eq!(FieldKind::Text { input_type: None }.empty_value(), json!(""));
        assert_eq!(FieldKind::Switch.empty_value(), json!(false));
        assert_eq!(FieldKind::Date { format: None }.empty_value(), json!(null));

        let multi = FieldDefinition::multi_select("tags", "Tags", vec![]);
        assert!(multi.is_multi_value());
        assert_eq!(multi.kind.empty_value(), json!([]));
        assert!(!FieldDefinition::select("room", "Room", vec![]).is_multi_value());

        assert!(FieldDefinition::text("fee", "Fee").with_input_type("number").kind.is_numeric());
        assert!(!FieldDefinition::text("fee", "Fee").kind.is_numeric());
    }

    #[test]
    fn test_field_builder() {
        let field = FieldDefinition::text("password", "Password")
            .with_input_type("password")
            .required();

        assert_eq!(field.name, "password");
        assert_eq!(field.label, "Password");
        assert_eq!(field.validations, vec![ValidationRule::required()]);
        match &field.kind {
            FieldKind::Text { input_type } => assert_eq!(input_type.as_deref(), Some("password")),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_change_hook_only_on_select() {
        let select = FieldDefinition::select("student", "Student", vec![])
            .on_change(|_, _| Record::new());
        assert!(select.change_hook().is_some());

        let text = FieldDefinition::text("name", "Name").on_change(|_, _| Record::new());
        assert!(text.change_hook().is_none());
    }

    #[test]
    fn test_field_validation() {
        assert!(FieldDefinition::text("name", "Name").validate().is_ok());
        assert!(FieldDefinition::text("", "Name").validate().is_err());
        assert!(FieldDefinition::text("name", "").validate().is_err());
        assert!(FieldDefinition::custom("avatar", "Avatar", "").validate().is_err());
        assert!(FieldDefinition::custom("avatar", "Avatar", "image-upload")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_parse_date() {
        let field = FieldDefinition::date("start", "Start date");
        assert_eq!(
            field.parse_date(&json!("2024-09-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 1)
        );
        assert_eq!(field.parse_date(&json!("")).unwrap(), None);
        assert_eq!(field.parse_date(&json!(null)).unwrap(), None);
        assert!(field.parse_date(&json!("01/09/2024")).is_err());
        assert!(field.parse_date(&json!(20240901)).is_err());

        let european = FieldDefinition::date("start", "Start date").with_format("%d/%m/%Y");
        assert_eq!(
            european.parse_date(&json!("01/09/2024")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 1)
        );

        let text = FieldDefinition::text("name", "Name");
        assert!(text.parse_date(&json!("2024-09-01")).is_err());
    }

    #[test]
    fn test_parse_date_time() {
        let field = FieldDefinition::date_time("lesson", "Lesson");
        let expected = NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(17, 30, 0);

        assert_eq!(field.parse_date_time(&json!("2024-09-01T17:30")).unwrap(), expected);
        assert_eq!(
            field.parse_date_time(&json!("2024-09-01T17:30:00+02:00")).unwrap(),
            expected
        );
        assert!(field.parse_date_time(&json!("tomorrow")).is_err());
    }

    #[test]
    fn test_field_definition_from_yaml() {
        let yaml = r#"
name: student
label: Student
kind: select
multiple: false
options:
  - value: 7
    label: Ana Lima
validations:
  - name: required
"#;
        let field: FieldDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(field.kind.name(), "select");
        assert_eq!(field.validations.len(), 1);
        match &field.kind {
            FieldKind::Select(config) => {
                assert_eq!(config.options, vec![SelectOption::new(7, "Ana Lima")]);
                assert!(config.on_change.is_none());
            }
            other => panic!("unexpected kind {:?}", other),
        }

        let date: FieldDefinition =
            serde_yaml::from_str("name: day\nlabel: Day\nkind: date-time\n").unwrap();
        assert!(matches!(date.kind, FieldKind::DateTime { format: None }));
    }
}
