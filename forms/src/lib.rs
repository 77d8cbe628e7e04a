//! # Forms Crate
//!
//! Headless form engine behind the school administration screens. A form is
//! a [`FieldSchema`](fields::FieldSchema) plus a submit handler; the engine
//! keeps the values and per-field errors, validates before submitting and
//! reconciles backend field errors back onto the form.
//!
//! ## Key Features
//!
//! - **Store**: values, errors and a dirty flag, mutated synchronously
//! - **Submission**: validate, call the handler, map errors or reset, with at
//!   most one submission in flight
//! - **Error mapping**: backend error keys are matched to UI fields by
//!   substring through an [`ErrorResponseMapping`]
//! - **Cancel guard**: unsaved changes need confirmation before discarding
//! - **Definitions**: forms can be described in `*.form.yaml` files
//!
//! ## Usage
//!
//! ```rust
//! use fields::{ErrorRecord, FieldDefinition, FieldSchema, Record};
//! use forms::{
//!     ErrorResponseMapping, FailureResponse, Form, FormConfig, SubmitOutcome, SubmitResponse,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let schema = FieldSchema::new(vec![
//!     FieldDefinition::select("student", "Student", vec![]).required(),
//! ])
//! .unwrap();
//!
//! let config = FormConfig::new(schema, |_values: Record, _errors: ErrorRecord| async {
//!     anyhow::Ok(SubmitResponse::Failure(
//!         FailureResponse::new().with_error("studentId", "The studentId field is required."),
//!     ))
//! })
//! .with_error_response_mapping(ErrorResponseMapping::new().with_entry("student", "studentId"));
//!
//! let mut form = Form::with_defaults(config);
//! form.set("student", 42);
//!
//! let outcome = form.submit().await;
//! assert_eq!(outcome, SubmitOutcome::Rejected { mapped: 1, dropped: 0 });
//! assert_eq!(form.error("student"), "Student field is required.");
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod definition;
pub mod dirty;
pub mod error;
pub mod form;
pub mod mapping;
pub mod ordered;
pub mod store;
pub mod submission;

pub use cancel::{CancelOutcome, ConfirmationDialog, DISCARD_CHANGES_MESSAGE};
pub use config::{CloseHook, FormConfig};
pub use definition::{FormDefinition, FormDefinitionLoader};
pub use dirty::DirtyTracker;
pub use error::{FormError, Result};
pub use form::Form;
pub use mapping::{
    format_backend_message, ErrorResponseMapper, ErrorResponseMapping, FailureResponse,
    MappedError, MappingReport,
};
pub use ordered::OrderedMap;
pub use store::{FormSnapshot, FormStore};
pub use submission::{
    SubmissionPhase, SubmissionTicket, SubmitHandler, SubmitOutcome, SubmitReply,
    SubmitResponse, SubmitResult, SubmitStart,
};
