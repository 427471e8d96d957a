//! Execution layer - gating, click escalation and the reservation flow.

#![warn(missing_docs)]

pub mod clock;
pub mod gate;
pub mod site;
pub mod interaction;
pub mod orchestrator;
pub mod confirmation;
pub mod observer;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{AnchoredClock, Clock, SystemClock};
pub use gate::{ClaimInstant, GateOutcome, WallClockGate};
pub use site::{SiteMap, Timings};
pub use interaction::{
    attempt_in_order, stabilize, ClickOutcome, ClickStrategy, HardClickFailure, ResilientClicker,
};
pub use orchestrator::ReservationOrchestrator;
pub use confirmation::ConfirmationFlow;
pub use observer::TracingObserver;
pub use runner::{run_in_session, Reservation, RunError, SessionFuture};
