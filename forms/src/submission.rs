//! Submission controller.
//!
//! `Idle -> Validating -> Submitting -> (Success | Failed) -> Idle`. Local
//! validation failures never reach the handler, backend field errors go
//! through the error response mapper, and transport failures are logged
//! without touching field errors. At most one submission is in flight per
//! form.

use crate::form::Form;
use crate::mapping::{ErrorResponseMapper, FailureResponse};
use async_trait::async_trait;
use fields::{ErrorRecord, Record};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a submit handler reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResponse {
    Success,
    Failure(FailureResponse),
}

impl From<FailureResponse> for SubmitResponse {
    fn from(response: FailureResponse) -> Self {
        SubmitResponse::Failure(response)
    }
}

/// Result of one handler call; `Err` is a transport failure
pub type SubmitResult = anyhow::Result<SubmitResponse>;

/// Transport collaborator that sends form values to the backend
///
/// Retries, authentication and timeouts are the handler's concern.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: &Record, errors: &ErrorRecord) -> SubmitResult;
}

#[async_trait]
impl<F, Fut> SubmitHandler for F
where
    F: Fn(Record, ErrorRecord) -> Fut + Send + Sync,
    Fut: Future<Output = SubmitResult> + Send + 'static,
{
    async fn submit(&self, values: &Record, errors: &ErrorRecord) -> SubmitResult {
        (self)(values.clone(), errors.clone()).await
    }
}

/// Phase of the submission state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

/// How a submit attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was already in flight
    Ignored,
    /// Local validation failed; the handler was not called
    Invalid,
    /// The handler succeeded and the form was reset
    Succeeded,
    /// The backend rejected the values; `mapped` errors reached fields
    Rejected { mapped: usize, dropped: usize },
    /// The handler failed before the backend answered
    TransportFailed(String),
    /// The submission was given up before its handler answered
    Abandoned,
}

/// First half of a submission: either a ticket to dispatch or a final outcome
#[derive(Debug)]
pub enum SubmitStart {
    Dispatch(SubmissionTicket),
    Finished(SubmitOutcome),
}

/// A validated submission waiting for its handler call
///
/// Holds its own copy of the values, so the form does not need to stay
/// borrowed while the handler runs. Dropping a ticket without finishing it
/// leaves the form in flight until [`Form::abandon_submit`] is called.
pub struct SubmissionTicket {
    id: u64,
    handler: Arc<dyn SubmitHandler>,
    values: Record,
    errors: ErrorRecord,
}

impl SubmissionTicket {
    pub fn values(&self) -> &Record {
        &self.values
    }

    /// Call the submit handler
    pub async fn dispatch(self) -> SubmitReply {
        let result = self.handler.submit(&self.values, &self.errors).await;
        SubmitReply {
            id: self.id,
            result,
        }
    }
}

/// Handler answer for one dispatched ticket
#[derive(Debug)]
pub struct SubmitReply {
    id: u64,
    result: SubmitResult,
}

impl SubmitReply {
    pub fn result(&self) -> &SubmitResult {
        &self.result
    }
}

/// Abandons the in-flight submission if `submit()` is dropped mid-await
struct PendingSubmission<'a> {
    form: &'a mut Form,
    armed: bool,
}

impl PendingSubmission<'_> {
    fn finish(mut self, reply: SubmitReply) -> SubmitOutcome {
        self.armed = false;
        self.form.finish_submit(reply)
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.form.abandon_submit();
        }
    }
}

impl std::fmt::Debug for SubmissionTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionTicket")
            .field("values", &self.values)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Validate, submit, and map errors or reset on success
    pub async fn submit(&mut self) -> SubmitOutcome {
        match self.begin_submit() {
            SubmitStart::Finished(outcome) => outcome,
            SubmitStart::Dispatch(ticket) => {
                let pending = PendingSubmission {
                    form: self,
                    armed: true,
                };
                let reply = ticket.dispatch().await;
                pending.finish(reply)
            }
        }
    }

    /// Run local validation and, when it passes, mark a submission in flight
    pub fn begin_submit(&mut self) -> SubmitStart {
        if self.in_flight {
            warn!("Submit ignored: a submission is already in flight");
            return SubmitStart::Finished(SubmitOutcome::Ignored);
        }

        self.transition(SubmissionPhase::Validating);
        let errors = self.config.schema.validate_all(self.store.get());
        self.store.set_errors(errors.clone());

        if errors.has_errors() {
            debug!(
                "Submit blocked by {} invalid fields",
                errors.invalid_fields().count()
            );
            self.transition(SubmissionPhase::Failed);
            return SubmitStart::Finished(self.settle(SubmitOutcome::Invalid));
        }

        self.transition(SubmissionPhase::Submitting);
        self.in_flight = true;
        self.submission += 1;

        SubmitStart::Dispatch(SubmissionTicket {
            id: self.submission,
            handler: self.config.submit_handler.clone(),
            values: self.store.get().clone(),
            errors,
        })
    }

    /// Apply the handler reply of the in-flight submission
    ///
    /// Replies of abandoned or already finished submissions are ignored.
    pub fn finish_submit(&mut self, reply: SubmitReply) -> SubmitOutcome {
        if !self.in_flight || reply.id != self.submission {
            warn!("Submit result ignored: submission #{} is not in flight", reply.id);
            return SubmitOutcome::Ignored;
        }
        self.in_flight = false;

        let outcome = match reply.result {
            Ok(SubmitResponse::Success) => {
                self.transition(SubmissionPhase::Success);
                if let Some(on_close) = &self.config.on_close {
                    on_close();
                }
                self.store.reset(&self.initial);
                SubmitOutcome::Succeeded
            }
            Ok(SubmitResponse::Failure(response)) => {
                self.transition(SubmissionPhase::Failed);
                match &self.config.error_response_mapping {
                    Some(mapping) => {
                        let report = ErrorResponseMapper::new(mapping).map(&response);
                        for mapped in &report.mapped {
                            self.store.set_error(&mapped.field, mapped.message.as_str());
                        }
                        SubmitOutcome::Rejected {
                            mapped: report.mapped.len(),
                            dropped: report.dropped.len(),
                        }
                    }
                    None => SubmitOutcome::Rejected {
                        mapped: 0,
                        dropped: response.errors.len(),
                    },
                }
            }
            Err(e) => {
                error!("Form submission failed: {:#}", e);
                self.transition(SubmissionPhase::Failed);
                SubmitOutcome::TransportFailed(e.to_string())
            }
        };

        self.settle(outcome)
    }

    /// Give up on the in-flight submission
    ///
    /// Values and errors are kept. A late reply for it is ignored, and the
    /// form accepts a new submit right away.
    pub fn abandon_submit(&mut self) -> bool {
        if !self.in_flight {
            return false;
        }
        warn!("Submission #{} abandoned before its handler answered", self.submission);
        self.in_flight = false;
        self.transition(SubmissionPhase::Failed);
        self.settle(SubmitOutcome::Abandoned);
        true
    }

    fn transition(&mut self, phase: SubmissionPhase) {
        debug!("Submission phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn settle(&mut self, outcome: SubmitOutcome) -> SubmitOutcome {
        info!("Form submission finished: {:?}", outcome);
        self.transition(SubmissionPhase::Idle);
        self.last_outcome = Some(outcome.clone());
        outcome
    }
}
