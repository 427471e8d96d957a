//! Run state machine positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a run that reached the end was closed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finalized {
    /// Booking committed (live mode)
    Confirmed,
    /// Booking rolled back (rehearsal mode)
    Cancelled,
}

/// Position of a run in the reservation flow.
///
/// States are strictly ordered; a run only ever moves forward, and a failure
/// is reported against the last state that was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing done yet
    Init,
    /// Signed in
    Authenticated,
    /// Booking page landmark visible
    OnReservationPage,
    /// Calendar day clicked
    DateSelected,
    /// Sport option selected
    SportSelected,
    /// At least one slot of the block claimed
    SlotsSelected,
    /// A court claimed
    CourtSelected,
    /// Participant added
    UsersAdded,
    /// Booking submitted
    Booked,
    /// Terminal
    Finalized(Finalized),
}

impl RunState {
    /// Whether this is a terminal state.
    pub fn is_final(self) -> bool {
        matches!(self, RunState::Finalized(_))
    }

    /// Stable name used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Init => "init",
            RunState::Authenticated => "authenticated",
            RunState::OnReservationPage => "on_reservation_page",
            RunState::DateSelected => "date_selected",
            RunState::SportSelected => "sport_selected",
            RunState::SlotsSelected => "slots_selected",
            RunState::CourtSelected => "court_selected",
            RunState::UsersAdded => "users_added",
            RunState::Booked => "booked",
            RunState::Finalized(Finalized::Confirmed) => "confirmed",
            RunState::Finalized(Finalized::Cancelled) => "cancelled",
        }
    }
}

impl fmt::Display for Finalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(RunState::Finalized(*self).as_str())
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
