use crate::config::FormConfig;
use crate::store::{FormSnapshot, FormStore};
use crate::submission::{SubmissionPhase, SubmitOutcome};
use crate::Result;
use chrono::{NaiveDate, NaiveDateTime};
use fields::{ErrorRecord, FieldDefinition, FieldSchema, FieldsError, Record};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// One form instance: configuration, initial snapshot and live state
///
/// Created when the UI mounts a form and dropped when it unmounts. The
/// instance owns its store exclusively.
#[derive(Debug)]
pub struct Form {
    pub(crate) config: FormConfig,
    pub(crate) initial: FormSnapshot,
    pub(crate) store: FormStore,
    pub(crate) phase: SubmissionPhase,
    pub(crate) in_flight: bool,
    pub(crate) submission: u64,
    pub(crate) last_outcome: Option<SubmitOutcome>,
}

impl Form {
    /// Create a form over caller-supplied initial values
    pub fn new(config: FormConfig, initial_values: Record) -> Self {
        let initial = FormSnapshot::new(initial_values, config.schema.empty_errors());
        let store = FormStore::new(config.schema.clone(), initial.clone());

        debug!("Mounted form with {} fields", config.schema.len());

        Self {
            config,
            initial,
            store,
            phase: SubmissionPhase::Idle,
            in_flight: false,
            submission: 0,
            last_outcome: None,
        }
    }

    /// Create a form whose fields start at their kind's empty value
    pub fn with_defaults(config: FormConfig) -> Self {
        let values = config.schema.default_values();
        Self::new(config, values)
    }

    /// Create a form from a typed record
    pub fn from_typed<T: Serialize>(config: FormConfig, initial: &T) -> Result<Self> {
        match serde_json::to_value(initial)? {
            Value::Object(values) => Ok(Self::new(config, values)),
            other => Err(FieldsError::TypeConversion(format!(
                "Initial form values must serialize to an object, got {}",
                other
            ))
            .into()),
        }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.config.schema
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    /// Snapshot the form was created with
    pub fn initial(&self) -> &FormSnapshot {
        &self.initial
    }

    pub fn values(&self) -> &Record {
        self.store.get()
    }

    /// Deserialize the current values into a typed record
    pub fn values_as<T: DeserializeOwned>(&self) -> Result<T> {
        let values = Value::Object(self.store.get().clone());
        Ok(serde_json::from_value(values)?)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.store.value(name)
    }

    /// Field change event from the UI
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.store.set(name, value.into());
    }

    pub fn error(&self, name: &str) -> &str {
        self.store.error(name)
    }

    pub fn errors(&self) -> &ErrorRecord {
        self.store.errors()
    }

    pub fn set_error(&mut self, name: &str, message: impl Into<String>) {
        self.store.set_error(name, message);
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Whether the UI should show a loading state
    pub fn is_submitting(&self) -> bool {
        self.in_flight && !self.config.loading_disabled
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn last_outcome(&self) -> Option<&SubmitOutcome> {
        self.last_outcome.as_ref()
    }

    /// Validate one field and store its message
    pub fn validate_field(&mut self, name: &str) -> Result<Option<String>> {
        let message = self.config.schema.validate_field(name, self.store.get())?;
        self.store
            .set_error(name, message.clone().unwrap_or_default());
        Ok(message)
    }

    /// Validate every field and store the messages; true when all pass
    pub fn validate(&mut self) -> bool {
        let errors = self.config.schema.validate_all(self.store.get());
        let valid = !errors.has_errors();
        self.store.set_errors(errors);
        valid
    }

    /// Restore the initial snapshot and clear dirty
    ///
    /// A submission still in flight is abandoned.
    pub fn reset(&mut self) {
        self.abandon_submit();
        self.store.reset(&self.initial);
    }

    /// Current value of a date field
    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>> {
        let field = self.field(name)?;
        Ok(field.parse_date(self.value(name).unwrap_or(&Value::Null))?)
    }

    /// Current value of a date-time field
    pub fn date_time(&self, name: &str) -> Result<Option<NaiveDateTime>> {
        let field = self.field(name)?;
        Ok(field.parse_date_time(self.value(name).unwrap_or(&Value::Null))?)
    }

    fn field(&self, name: &str) -> Result<&FieldDefinition> {
        self.config
            .schema
            .field(name)
            .ok_or_else(|| FieldsError::NotFound(name.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::SubmitResponse;
    use fields::ValidationRule;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Instructor {
        name: String,
        email: String,
        hourly_rate: f64,
        active: bool,
        hired_on: String,
    }

    fn instructor_config() -> FormConfig {
        let schema = FieldSchema::new(vec![
            FieldDefinition::text("name", "Name").required(),
            FieldDefinition::text("email", "Email")
                .required()
                .with_validation(ValidationRule::email()),
            FieldDefinition::text("hourly_rate", "Hourly rate")
                .with_input_type("number")
                .with_validation(ValidationRule::gt_zero()),
            FieldDefinition::switch("active", "Active"),
            FieldDefinition::date("hired_on", "Hired on"),
        ])
        .unwrap();

        FormConfig::new(schema, |_values: Record, _errors: ErrorRecord| async {
            anyhow::Ok(SubmitResponse::Success)
        })
    }

    fn instructor() -> Instructor {
        Instructor {
            name: "Clara Sousa".to_string(),
            email: "clara@school.org".to_string(),
            hourly_rate: 35.0,
            active: true,
            hired_on: "2021-02-15".to_string(),
        }
    }

    #[test]
    fn test_typed_round_trip() {
        let mut form = Form::from_typed(instructor_config(), &instructor()).unwrap();
        assert_eq!(form.values_as::<Instructor>().unwrap(), instructor());

        form.set("hourly_rate", 40.0);
        assert_eq!(form.values_as::<Instructor>().unwrap().hourly_rate, 40.0);
    }

    #[test]
    fn test_from_typed_requires_object() {
        assert!(Form::from_typed(instructor_config(), &vec![1, 2]).is_err());
    }

    #[test]
    fn test_validate_field_stores_message() {
        let mut form = Form::with_defaults(instructor_config());
        assert_eq!(
            form.validate_field("email").unwrap(),
            Some("Email is required".to_string())
        );
        assert_eq!(form.error("email"), "Email is required");
        // Other fields are not evaluated
        assert_eq!(form.error("name"), "");

        form.set("email", "clara@school.org");
        assert_eq!(form.validate_field("email").unwrap(), None);
        assert_eq!(form.error("email"), "");

        assert!(form.validate_field("phone").is_err());
    }

    #[test]
    fn test_validate_whole_form() {
        let mut form = Form::with_defaults(instructor_config());
        assert!(!form.validate());
        assert_eq!(form.error("name"), "Name is required");
        assert_eq!(form.error("hourly_rate"), "");

        form.set("hourly_rate", "0");
        form.validate();
        assert_eq!(form.error("hourly_rate"), "Hourly rate must be greater than zero");
    }

    #[test]
    fn test_date_accessor() {
        let form = Form::from_typed(instructor_config(), &instructor()).unwrap();
        assert_eq!(
            form.date("hired_on").unwrap(),
            NaiveDate::from_ymd_opt(2021, 2, 15)
        );
        assert!(form.date("name").is_err());
        assert!(form.date("missing").is_err());
    }

    #[test]
    fn test_reset_returns_to_initial() {
        let mut form = Form::from_typed(instructor_config(), &instructor()).unwrap();
        form.set("name", "");
        form.validate();
        assert!(form.is_dirty());

        form.reset();
        assert_eq!(form.values(), &form.initial().values);
        assert_eq!(form.errors(), &form.initial().errors);
        assert!(!form.is_dirty());
    }
}
