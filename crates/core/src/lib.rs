//! courtres core data models.
//!
//! This crate defines the values a reservation run is built from: the
//! immutable run profile, the calendar target, selection outcomes and the
//! events and errors a run produces. Nothing in here talks to a browser.

#![warn(missing_docs)]

// Core identities
mod id;

// Run inputs
mod credentials;
mod profile;
mod target;

// Run progress and results
mod state;
mod outcome;
mod event;
mod error;

// Re-exports
pub use id::RunId;

pub use credentials::Credentials;
pub use profile::{RunProfile, PartialBlockPolicy};
pub use target::{compute_target_date, live_offset_days, DayName, TargetDate};

pub use state::{RunState, Finalized};
pub use outcome::{
    SlotSelectionOutcome, SkippedCandidate, SkipReason,
    InteractionAttempt, StrategyRecord, StrategyOutcome,
    BookingOutcome, RunReport,
};
pub use event::{RunEvent, RunObserver, NullObserver};
pub use error::{ReservationError, RunFailure};

/// Local wall-clock timestamp type used for all run timing.
pub type LocalTime = chrono::NaiveDateTime;
