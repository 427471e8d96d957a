//! Run profile - the immutable description of what a run goes after.

use serde::{Deserialize, Serialize};

/// Court preference used by live runs.
const LIVE_COURTS: &[&str] = &["PB Court 25"];

/// Half-hour labels forming the 7:00-9:00 PM block.
const LIVE_SLOTS: &[&str] = &["-7:30pm", ":30-8pm", "-8:30pm", ":30-9pm"];

/// Court preference used by rehearsal runs.
const REHEARSAL_COURTS: &[&str] = &["PB Court 1"];

/// Half-hour labels forming the 2:00-4:00 PM block.
const REHEARSAL_SLOTS: &[&str] = &["-2:30pm", ":30-3pm", "-3:30pm", ":30-4pm"];

/// What to do when only part of the slot block could be claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialBlockPolicy {
    /// Continue with whatever was selected, as long as it is not nothing.
    #[default]
    Accept,

    /// Every candidate label must be selected, otherwise the run fails.
    RequireAll,
}

/// Immutable value computed once per run.
///
/// Rehearsal profiles carry the low-stakes candidates, live profiles the
/// production ones. The orchestrator and every component it drives read
/// the mode from here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProfile {
    test_mode: bool,
    court_candidates: Vec<String>,
    time_slot_candidates: Vec<String>,
    #[serde(default)]
    partial_block: PartialBlockPolicy,
}

impl RunProfile {
    /// Production profile with the built-in evening candidates.
    pub fn live() -> Self {
        Self::with_defaults(false, LIVE_COURTS, LIVE_SLOTS)
    }

    /// Rehearsal profile with the built-in afternoon candidates.
    pub fn rehearsal() -> Self {
        Self::with_defaults(true, REHEARSAL_COURTS, REHEARSAL_SLOTS)
    }

    /// Pick the built-in profile for the given mode.
    pub fn for_mode(test_mode: bool) -> Self {
        if test_mode {
            Self::rehearsal()
        } else {
            Self::live()
        }
    }

    fn with_defaults(test_mode: bool, courts: &[&str], slots: &[&str]) -> Self {
        Self {
            test_mode,
            court_candidates: courts.iter().map(|c| c.to_string()).collect(),
            time_slot_candidates: slots.iter().map(|s| s.to_string()).collect(),
            partial_block: PartialBlockPolicy::default(),
        }
    }

    /// Replace the court preference list. Empty lists keep the defaults.
    pub fn with_courts(mut self, courts: Vec<String>) -> Self {
        if !courts.is_empty() {
            self.court_candidates = courts;
        }
        self
    }

    /// Replace the time slot list. Empty lists keep the defaults.
    pub fn with_slots(mut self, slots: Vec<String>) -> Self {
        if !slots.is_empty() {
            self.time_slot_candidates = slots;
        }
        self
    }

    /// Set the partial block policy.
    pub fn with_partial_block(mut self, policy: PartialBlockPolicy) -> Self {
        self.partial_block = policy;
        self
    }

    /// Whether this is a rehearsal run.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Courts in preference order.
    pub fn court_candidates(&self) -> &[String] {
        &self.court_candidates
    }

    /// Slot labels making up the desired block, in order.
    pub fn time_slot_candidates(&self) -> &[String] {
        &self.time_slot_candidates
    }

    /// Partial block policy.
    pub fn partial_block(&self) -> PartialBlockPolicy {
        self.partial_block
    }

    /// Human readable name of the block, for messages.
    pub fn block_description(&self) -> String {
        match (self.time_slot_candidates.first(), self.time_slot_candidates.last()) {
            (Some(first), Some(last)) if first != last => format!("{first} .. {last}"),
            (Some(only), _) => only.clone(),
            _ => "no slots".to_string(),
        }
    }
}
