use async_trait::async_trait;
use fields::{ErrorRecord, FieldKind, Record, SelectOption};
use forms::{
    CancelOutcome, ConfirmationDialog, FailureResponse, Form, FormConfig, FormDefinition,
    SubmitHandler, SubmitOutcome, SubmitResponse, SubmitResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const ENROLLMENT_FORM: &str = r#"
id: enrollment
name: Enroll student
fields:
  - name: student
    label: Student
    kind: select
    validations:
      - name: required
  - name: email
    label: Contact email
    kind: text
    inputType: email
    validations:
      - name: required
      - name: email
  - name: class
    label: Class
    kind: select
    validations:
      - name: required
  - name: fee
    label: Monthly fee
    kind: text
    inputType: number
    validations:
      - name: required
      - name: gt-zero
  - name: discount
    label: Discount
    kind: text
    inputType: number
    validations:
      - name: gte-zero
  - name: startDate
    label: Start date
    kind: date
errorResponseMapping:
  student: studentId
  class: classId
  startDate: date
"#;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Enrollment {
    student: Option<u32>,
    email: String,
    class: Option<u32>,
    fee: String,
    discount: String,
    start_date: String,
}

impl Default for Enrollment {
    fn default() -> Self {
        Self {
            student: None,
            email: String::new(),
            class: None,
            fee: String::new(),
            discount: "0".to_string(),
            start_date: String::new(),
        }
    }
}

/// Backend stand-in replaying queued responses
#[derive(Clone, Default)]
struct FakeBackend {
    responses: Arc<Mutex<VecDeque<SubmitResult>>>,
    received: Arc<Mutex<Vec<Record>>>,
}

impl FakeBackend {
    fn queue(&self, response: SubmitResult) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn received(&self) -> Vec<Record> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmitHandler for FakeBackend {
    async fn submit(&self, values: &Record, errors: &ErrorRecord) -> SubmitResult {
        assert!(!errors.has_errors());
        self.received.lock().unwrap().push(values.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SubmitResponse::Success))
    }
}

struct AlwaysConfirm;

#[async_trait]
impl ConfirmationDialog for AlwaysConfirm {
    async fn request_confirmation(&self, _message: &str) -> bool {
        true
    }
}

fn students() -> Vec<SelectOption> {
    vec![
        SelectOption::new(11, "Ana Lima"),
        SelectOption::new(12, "Bruno Reis"),
    ]
}

fn enrollment_form(backend: FakeBackend) -> Form {
    let mut definition = FormDefinition::from_yaml(ENROLLMENT_FORM).unwrap();

    // Options come from the students endpoint; picking one fills the email
    let student = definition
        .fields
        .iter_mut()
        .find(|f| f.name == "student")
        .unwrap();
    if let FieldKind::Select(config) = &mut student.kind {
        config.options = students();
    }
    *student = student.clone().on_change(|value, _record| {
        let email = match value.as_u64() {
            Some(11) => json!("ana.guardian@mail.com"),
            Some(12) => json!("reis.family@mail.com"),
            _ => json!(""),
        };
        let mut patch = Record::new();
        patch.insert("email".to_string(), email);
        patch
    });

    let config = FormConfig::from_definition(definition, backend).unwrap();
    Form::from_typed(config, &Enrollment::default()).unwrap()
}

#[tokio::test]
async fn test_enrollment_lifecycle() {
    let backend = FakeBackend::default();
    let mut form = enrollment_form(backend.clone());

    // Nothing filled in: local errors only
    assert_eq!(form.submit().await, SubmitOutcome::Invalid);
    assert!(backend.received().is_empty());
    assert_eq!(form.error("student"), "Student is required");
    assert_eq!(form.error("fee"), "Monthly fee is required");
    assert_eq!(form.error("discount"), "");

    // Picking a student auto-populates the contact email
    form.set("student", 11);
    assert_eq!(form.value("email"), Some(&json!("ana.guardian@mail.com")));

    form.set("class", 4);
    form.set("fee", "-20");
    form.set("discount", "-5");
    assert_eq!(form.submit().await, SubmitOutcome::Invalid);
    assert_eq!(form.error("fee"), "Monthly fee must be greater than zero");
    assert_eq!(form.error("discount"), "Discount must be zero or greater");

    // Valid locally; the backend rejects two fields and one unmapped key
    form.set("fee", "120");
    form.set("discount", "0");
    backend.queue(Ok(SubmitResponse::Failure(
        FailureResponse::new()
            .with_error("classId", "The selected classId is full.")
            .with_error("date", "The date must be a weekday.")
            .with_error("invoiceNumber", "Could not allocate invoice."),
    )));

    assert_eq!(
        form.submit().await,
        SubmitOutcome::Rejected {
            mapped: 2,
            dropped: 1
        }
    );
    assert_eq!(backend.received().len(), 1);
    assert_eq!(form.error("class"), "Class is full.");
    assert_eq!(form.error("startDate"), "Date must be a weekday.");
    assert_eq!(form.errors().invalid_fields().count(), 2);
    assert_eq!(form.value("fee"), Some(&json!("120")));

    // Revalidation clears stale backend errors before the request goes out
    backend.queue(Err(anyhow::anyhow!("502 Bad Gateway")));
    assert!(matches!(
        form.submit().await,
        SubmitOutcome::TransportFailed(_)
    ));
    assert_eq!(form.error("class"), "");
    assert!(form.is_dirty());

    // Fix and submit; success resets to the initial snapshot
    form.set("class", 5);
    form.set("startDate", "2024-09-02");
    assert_eq!(form.submit().await, SubmitOutcome::Succeeded);

    let sent = backend.received();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].get("class"), Some(&json!(5)));
    assert_eq!(sent[2].get("startDate"), Some(&json!("2024-09-02")));

    assert_eq!(form.values_as::<Enrollment>().unwrap(), Enrollment::default());
    assert!(!form.errors().has_errors());
    assert!(!form.is_dirty());
}

#[tokio::test]
async fn test_cancel_after_editing() {
    let mut form = enrollment_form(FakeBackend::default());
    form.set("student", 12);
    assert!(form.needs_cancel_confirmation());

    assert_eq!(form.cancel(&AlwaysConfirm).await, CancelOutcome::Discarded);
    assert_eq!(form.value("student"), Some(&Value::Null));
    assert_eq!(form.value("email"), Some(&json!("")));
}

#[test]
fn test_subscribers_observe_changes() {
    let mut form = enrollment_form(FakeBackend::default());
    let mut receiver = form.store().subscribe();

    form.set("fee", "90");
    assert!(receiver.has_changed().unwrap());
    let seen = *receiver.borrow_and_update();

    form.validate();
    assert!(*receiver.borrow_and_update() > seen);
}
