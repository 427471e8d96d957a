//! Default run observer: run events as structured log lines.

use courtres_core::{RunEvent, RunId, RunObserver, SkipReason};
use tracing::{debug, error, info, warn};

/// Forwards every [`RunEvent`] to `tracing`, tagged with the run id.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    run_id: RunId,
}

impl TracingObserver {
    /// Observer for one run.
    pub fn new(run_id: RunId) -> Self {
        Self { run_id }
    }
}

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent) {
        let run_id = self.run_id.to_string();
        let run_id = run_id.as_str();
        match event {
            RunEvent::StepStarted { step } => {
                debug!(run_id, step = step.as_str(), "Step started");
            }
            RunEvent::StateReached { state } => {
                info!(run_id, state = %state, "State reached");
            }
            RunEvent::CandidateSkipped {
                label,
                reason: SkipReason::TransientUnavailable,
            } => {
                warn!(run_id, label = label.as_str(), reason = "taken", "Candidate lost to another user");
            }
            RunEvent::CandidateSkipped { label, reason } => {
                info!(run_id, label = label.as_str(), reason = %reason, "Candidate skipped");
            }
            RunEvent::StrategyFailed {
                target,
                strategy,
                error,
            } => {
                debug!(
                    run_id,
                    locator = target.as_str(),
                    strategy = strategy.as_str(),
                    error = error.as_str(),
                    "Click strategy failed"
                );
            }
            RunEvent::RunFinished {
                state,
                success: true,
                ..
            } => {
                info!(run_id, state = %state, outcome = "success", "Run finished");
            }
            RunEvent::RunFinished {
                state,
                success: false,
                detail,
            } => {
                let detail = detail.as_deref().unwrap_or("");
                error!(run_id, state = %state, outcome = "failure", detail, "Run finished");
            }
        }
    }
}
