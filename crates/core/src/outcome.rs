//! Outcomes of selection steps and of whole runs.

use crate::id::RunId;
use crate::state::Finalized;
use crate::target::TargetDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a slot or court candidate was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Not rendered, or not visible
    NotVisible,
    /// Rendered but disabled
    Disabled,
    /// Clicked, then the site said someone else got it first
    TransientUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotVisible => f.write_str("not visible"),
            SkipReason::Disabled => f.write_str("disabled"),
            SkipReason::TransientUnavailable => f.write_str("taken by someone else"),
        }
    }
}

/// A candidate that was not selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    /// Candidate label
    pub label: String,
    /// Reason it was skipped
    pub reason: SkipReason,
}

/// Result of walking the slot candidates once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSelectionOutcome {
    /// Labels that were claimed, in candidate order
    pub selected: Vec<String>,

    /// Labels that were passed over, in candidate order
    pub skipped: Vec<SkippedCandidate>,
}

impl SlotSelectionOutcome {
    /// Number of labels claimed.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Record a claimed label.
    pub fn select(&mut self, label: impl Into<String>) {
        self.selected.push(label.into());
    }

    /// Record a skipped label.
    pub fn skip(&mut self, label: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedCandidate {
            label: label.into(),
            reason,
        });
    }
}

/// Outcome of one strategy on the click ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyOutcome {
    /// The click went through
    Success,
    /// The strategy raised; carries the error text
    Failure(String),
}

/// One rung of the ladder as it was tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRecord {
    /// Strategy name
    pub strategy: String,
    /// What happened
    pub outcome: StrategyOutcome,
}

/// Transient record of one escalation ladder run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionAttempt {
    /// Strategies tried, in order
    pub records: Vec<StrategyRecord>,
}

impl InteractionAttempt {
    /// Append a strategy result.
    pub fn record(&mut self, strategy: impl Into<String>, outcome: StrategyOutcome) {
        self.records.push(StrategyRecord {
            strategy: strategy.into(),
            outcome,
        });
    }

    /// Name of the strategy that succeeded, if any.
    pub fn winner(&self) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.outcome == StrategyOutcome::Success)
            .map(|r| r.strategy.as_str())
    }

    /// Whether any strategy succeeded.
    pub fn succeeded(&self) -> bool {
        self.winner().is_some()
    }

    /// Error text of the last failed strategy.
    pub fn last_error(&self) -> Option<&str> {
        self.records.iter().rev().find_map(|r| match &r.outcome {
            StrategyOutcome::Failure(e) => Some(e.as_str()),
            StrategyOutcome::Success => None,
        })
    }
}

/// How a completed booking ended.
pub type BookingOutcome = Finalized;

/// Structured result handed back to whatever triggered the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: RunId,

    /// Confirmed or cancelled
    pub booking_outcome: BookingOutcome,

    /// Rehearsal flag
    pub test_mode: bool,

    /// Day that was booked
    pub target_date: TargetDate,

    /// Slot selection details
    pub slots: SlotSelectionOutcome,

    /// Court that was claimed
    pub court: String,
}
