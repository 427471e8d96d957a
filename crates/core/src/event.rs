//! Run events - what a run reports about itself while it happens.

use crate::outcome::SkipReason;
use crate::state::RunState;
use serde::{Deserialize, Serialize};

/// A structured observation emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A step of the flow is about to run
    StepStarted {
        /// Step name
        step: String,
    },

    /// The state machine moved forward
    StateReached {
        /// New state
        state: RunState,
    },

    /// A slot or court candidate was passed over
    CandidateSkipped {
        /// Candidate label
        label: String,
        /// Why
        reason: SkipReason,
    },

    /// One rung of the click ladder raised
    StrategyFailed {
        /// What was being clicked
        target: String,
        /// Strategy name
        strategy: String,
        /// Error text
        error: String,
    },

    /// The run ended, either in a terminal state or in a failure
    RunFinished {
        /// Last state reached
        state: RunState,
        /// Whether the run succeeded
        success: bool,
        /// Failure description, if any
        detail: Option<String>,
    },
}

/// Sink for [`RunEvent`]s, injected into the orchestrator.
pub trait RunObserver: Send + Sync {
    /// Receive one event.
    fn on_event(&self, event: &RunEvent);
}

/// Observer that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_event(&self, _event: &RunEvent) {}
}

impl<T: RunObserver + ?Sized> RunObserver for std::sync::Arc<T> {
    fn on_event(&self, event: &RunEvent) {
        (**self).on_event(event)
    }
}
