use crate::form::Form;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Message shown when discarding a dirty form
pub const DISCARD_CHANGES_MESSAGE: &str =
    "You have unsaved changes. Are you sure you want to discard them?";

/// Confirmation dialog collaborator of the cancel guard
#[async_trait]
pub trait ConfirmationDialog: Send + Sync {
    /// Ask the user to confirm; true means go ahead
    async fn request_confirmation(&self, message: &str) -> bool;
}

/// How a cancel request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The form was reset and closed
    Discarded,
    /// The user kept editing; nothing changed
    Declined,
    /// A submission is in flight; nothing changed
    Refused,
}

impl Form {
    /// Whether cancelling now would ask for confirmation
    pub fn needs_cancel_confirmation(&self) -> bool {
        !self.config.cancel_confirmation_disabled && self.store.is_dirty()
    }

    /// Discard the form, asking for confirmation when it has unsaved changes
    pub async fn cancel(&mut self, dialog: &dyn ConfirmationDialog) -> CancelOutcome {
        if self.in_flight {
            warn!("Cancel refused: a submission is in flight");
            return CancelOutcome::Refused;
        }

        if self.needs_cancel_confirmation()
            && !dialog.request_confirmation(DISCARD_CHANGES_MESSAGE).await
        {
            debug!("Cancel declined by user");
            return CancelOutcome::Declined;
        }

        self.discard();
        CancelOutcome::Discarded
    }

    fn discard(&mut self) {
        self.store.reset(&self.initial);
        if let Some(on_close) = &self.config.on_close {
            on_close();
        }
        debug!("Form discarded");
    }
}
