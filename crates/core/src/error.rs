//! Errors a run can end with.

use crate::outcome::SlotSelectionOutcome;
use crate::state::RunState;
use thiserror::Error;

/// Hard failures of a reservation run.
///
/// Soft failures (a candidate taken by someone else between observation and
/// click) never show up here; they are recorded as
/// [`SkipReason::TransientUnavailable`](crate::SkipReason) and absorbed by
/// the step that saw them.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Credential form missing, or sign-in did not clear.
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// An expected page landmark never became visible.
    #[error("Page landmark not visible in time: {0}")]
    PageLoadTimeout(String),

    /// Every slot label was missing, disabled or taken.
    #[error("No available time slots ({} selected, {} skipped)", .outcome.selected_count(), .outcome.skipped.len())]
    NoSlotsAvailable {
        /// What the selection pass saw
        outcome: SlotSelectionOutcome,
    },

    /// Every court candidate was missing, disabled or taken.
    #[error("No available court (tried {})", .tried.join(", "))]
    NoCourtAvailable {
        /// Candidates in the order they were tried
        tried: Vec<String>,
    },

    /// Submit/confirm controls missing, or the final check did not hold.
    #[error("Confirmation failed: {0}")]
    ConfirmationFailure(String),

    /// The driver raised on a required interaction.
    #[error("Interaction failed on {target}: {message}")]
    Interaction {
        /// What was being acted on
        target: String,
        /// Driver error text
        message: String,
    },
}

impl ReservationError {
    /// Short stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ReservationError::AuthenticationFailure(_) => "authentication_failure",
            ReservationError::PageLoadTimeout(_) => "page_load_timeout",
            ReservationError::NoSlotsAvailable { .. } => "no_slots_available",
            ReservationError::NoCourtAvailable { .. } => "no_court_available",
            ReservationError::ConfirmationFailure(_) => "confirmation_failure",
            ReservationError::Interaction { .. } => "interaction_failure",
        }
    }
}

/// A failed run: the error plus the state it was raised from.
#[derive(Debug, Error)]
#[error("Run failed at {state}: {error}")]
pub struct RunFailure {
    /// Last state reached before the failure
    pub state: RunState,

    /// What went wrong
    #[source]
    pub error: ReservationError,
}
