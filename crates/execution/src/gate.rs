//! Wall-clock gating - hold the run until the claim instant.

use crate::clock::Clock;
use chrono::{NaiveTime, Timelike};
use courtres_core::RunProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Moment of the day at which the booking window opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimInstant(NaiveTime);

impl ClaimInstant {
    /// `hour:minute:second`, or `None` if out of range.
    pub fn new(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Self)
    }

    /// As a time of day.
    pub fn time(self) -> NaiveTime {
        self.0
    }
}

impl Default for ClaimInstant {
    /// 2:00:00 PM, when the site releases the next session.
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN))
    }
}

impl fmt::Display for ClaimInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.0.hour(), self.0.minute(), self.0.second())
    }
}

impl FromStr for ClaimInstant {
    type Err = String;

    /// Accepts `HH:MM` or `HH:MM:SS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(Self)
            .map_err(|_| format!("invalid time '{s}', expected HH:MM or HH:MM:SS"))
    }
}

impl TryFrom<String> for ClaimInstant {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClaimInstant> for String {
    fn from(value: ClaimInstant) -> Self {
        value.to_string()
    }
}

/// How the gate was passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Rehearsal run, not gated
    Bypassed,
    /// Waited and released at the instant
    Reached,
    /// Entered after the instant; released immediately
    AlreadyPast {
        /// How late the run is
        late_by: Duration,
    },
}

/// Suspends a run until a wall-clock instant.
///
/// Polls the clock at a short fixed interval. There is no timeout and no
/// cancellation: the only way out is reaching or passing the instant.
pub struct WallClockGate {
    clock: Arc<dyn Clock>,
    poll: Duration,
}

impl WallClockGate {
    /// Gate reading `clock`, polling every 250ms.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            poll: Duration::from_millis(250),
        }
    }

    /// Set the poll interval.
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Gate a run. Rehearsal profiles pass straight through.
    pub async fn pass(&self, profile: &RunProfile, at: ClaimInstant) -> GateOutcome {
        if profile.test_mode() {
            info!("Rehearsal run, not waiting for {}", at);
            return GateOutcome::Bypassed;
        }
        self.await_instant(at).await
    }

    /// Wait until today's `at`, or return at once if it has passed.
    pub async fn await_instant(&self, at: ClaimInstant) -> GateOutcome {
        let now = self.clock.now();
        let target = now.date().and_time(at.time());

        if now >= target {
            let late_by = (now - target).to_std().unwrap_or_default();
            warn!(late_ms = late_by.as_millis() as u64, "Already past {}, running immediately", at);
            return GateOutcome::AlreadyPast { late_by };
        }

        info!(
            wait_secs = (target - now).num_seconds(),
            "Waiting until {} to start",
            at
        );

        loop {
            let now = self.clock.now();
            if now >= target {
                info!("It is {}, starting", at);
                return GateOutcome::Reached;
            }

            let remaining = (target - now).to_std().unwrap_or_default();
            if remaining.as_secs() > 0 && remaining.as_secs() % 60 == 0 {
                debug!(remaining_secs = remaining.as_secs(), "Still waiting");
            }
            tokio::time::sleep(remaining.min(self.poll)).await;
        }
    }
}
