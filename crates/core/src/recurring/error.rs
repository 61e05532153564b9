//! Recurring engine error types.

use ledgerkit_shared::RecurringTemplateId;
use thiserror::Error;

/// Errors raised by template management and runs.
#[derive(Debug, Error)]
pub enum RecurringError {
    /// No template with this id.
    #[error("Recurring template not found: {0}")]
    TemplateNotFound(RecurringTemplateId),

    /// Template is paused, completed, or cancelled.
    #[error("Recurring template {0} is not active")]
    TemplateNotActive(RecurringTemplateId),

    /// A fixed-amount template line has no amount.
    #[error("Template line {0} has no amount")]
    MissingAmount(usize),

    /// A parameterized run supplied the wrong number of amounts.
    #[error("Expected {expected} amounts for parameterized run, got {supplied}")]
    AmountCountMismatch {
        /// Lines in the template.
        expected: usize,
        /// Amounts supplied by the caller.
        supplied: usize,
    },

    /// Parameterized templates only run with caller-supplied amounts.
    #[error("Template {0} is parameterized and cannot run from the scheduler")]
    ParameterizedTemplate(RecurringTemplateId),

    /// Fixed templates run from the scheduler, not with supplied
    /// amounts.
    #[error("Template {0} has fixed amounts; the scheduler runs it")]
    FixedTemplate(RecurringTemplateId),
}

impl RecurringError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Self::TemplateNotActive(_) => "TEMPLATE_NOT_ACTIVE",
            Self::MissingAmount(_) => "MISSING_AMOUNT",
            Self::AmountCountMismatch { .. } => "AMOUNT_COUNT_MISMATCH",
            Self::ParameterizedTemplate(_) => "PARAMETERIZED_TEMPLATE",
            Self::FixedTemplate(_) => "FIXED_TEMPLATE",
        }
    }
}
