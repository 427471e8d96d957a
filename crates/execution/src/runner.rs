//! Session-scoped runs: open a session, gate, drive the flow, always close.

use crate::clock::{Clock, SystemClock};
use crate::gate::{ClaimInstant, WallClockGate};
use crate::orchestrator::ReservationOrchestrator;
use crate::site::{SiteMap, Timings};
use courtres_core::{
    compute_target_date, Credentials, RunFailure, RunId, RunObserver, RunProfile, RunReport,
    TargetDate,
};
use courtres_driver::{DriverError, PageDriver, SessionProvider};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Future returned by the work handed to [`run_in_session`].
pub type SessionFuture<'s, T> = Pin<Box<dyn Future<Output = Result<T, RunFailure>> + 's>>;

/// Why a run produced no report.
#[derive(Debug, Error)]
pub enum RunError {
    /// No session could be opened
    #[error("Could not open browser session: {0}")]
    Session(#[source] DriverError),

    /// The flow failed
    #[error(transparent)]
    Run(#[from] RunFailure),
}

/// Open a session, run `work` on its page and close the session again,
/// whatever `work` returned. A panic in `work` still closes the session
/// before it carries on unwinding.
///
/// A close error is logged. It never replaces the outcome of `work`.
pub async fn run_in_session<T, F>(provider: &dyn SessionProvider, work: F) -> Result<T, RunError>
where
    F: for<'s> FnOnce(&'s dyn PageDriver) -> SessionFuture<'s, T>,
{
    let session = provider.open().await.map_err(RunError::Session)?;
    debug!("Browser session opened");

    let outcome = AssertUnwindSafe(work(session.page())).catch_unwind().await;

    match session.close().await {
        Ok(()) => debug!("Browser session closed"),
        Err(e) => warn!("Could not close browser session: {}", e),
    }
    match outcome {
        Ok(result) => result.map_err(RunError::from),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Everything one reservation run needs.
pub struct Reservation {
    run_id: RunId,
    profile: RunProfile,
    credentials: Credentials,
    site: SiteMap,
    timings: Timings,
    claim_at: ClaimInstant,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn RunObserver>>,
    screenshot_dir: Option<PathBuf>,
}

impl Reservation {
    /// Run for `profile` with the given account.
    pub fn new(profile: RunProfile, credentials: Credentials) -> Self {
        Self {
            run_id: RunId::new(),
            profile,
            credentials,
            site: SiteMap::default(),
            timings: Timings::default(),
            claim_at: ClaimInstant::default(),
            clock: Arc::new(SystemClock),
            observer: None,
            screenshot_dir: None,
        }
    }

    /// Set the site map.
    pub fn with_site(mut self, site: SiteMap) -> Self {
        self.site = site;
        self
    }

    /// Set the timings.
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Set the instant live runs wait for.
    pub fn with_claim_at(mut self, claim_at: ClaimInstant) -> Self {
        self.claim_at = claim_at;
        self
    }

    /// Set the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Send run events to `observer` instead of the log.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Save a screenshot into `dir` when the run fails.
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    /// Run identifier.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Day the run goes after, as of now.
    pub fn target(&self) -> TargetDate {
        compute_target_date(self.clock.now().date(), self.profile.test_mode())
    }

    /// Open a session, wait for the claim instant, book.
    pub async fn run(self, provider: &dyn SessionProvider) -> Result<RunReport, RunError> {
        let target = self.target();
        info!(run_id = %self.run_id, "Target date {}", target);

        let gate = WallClockGate::new(self.clock.clone());
        let profile = self.profile.clone();
        let claim_at = self.claim_at;
        let mut orchestrator = ReservationOrchestrator::new(self.profile, self.credentials, target)
            .with_run_id(self.run_id)
            .with_site(self.site)
            .with_timings(self.timings);
        if let Some(observer) = self.observer {
            orchestrator = orchestrator.with_observer(observer);
        }
        if let Some(dir) = self.screenshot_dir {
            orchestrator = orchestrator.with_screenshot_dir(dir);
        }

        run_in_session(provider, move |page| {
            Box::pin(async move {
                gate.pass(&profile, claim_at).await;
                orchestrator.run(page).await
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::AnchoredClock;
    use crate::testing::{scripted_site, stock_options, RecordingObserver};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use courtres_core::{Finalized, RunState};
    use courtres_driver::fake::{FakePage, FakeProvider};
    use courtres_driver::Session;

    fn clock_at(h: u32, m: u32, s: u32) -> Arc<AnchoredClock> {
        let anchor = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap();
        Arc::new(AnchoredClock::new(anchor))
    }

    fn reservation(profile: RunProfile, clock: Arc<AnchoredClock>) -> Reservation {
        Reservation::new(profile, Credentials::new("player@example.com", "hunter2"))
            .with_clock(clock)
            .with_observer(Arc::new(RecordingObserver::default()))
    }

    fn ready_site(reservation: &Reservation, profile: &RunProfile) -> FakePage {
        let site = SiteMap::default();
        let page = scripted_site(&site);
        stock_options(&page, &site, &reservation.target(), profile);
        page
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_closed_after_success() {
        let profile = RunProfile::rehearsal();
        let reservation = reservation(profile.clone(), clock_at(9, 0, 0));
        let page = ready_site(&reservation, &profile);

        let report = reservation.run(&FakeProvider::new(page.clone())).await.unwrap();

        assert_eq!(report.booking_outcome, Finalized::Cancelled);
        assert_eq!(report.target_date.date, NaiveDate::from_ymd_opt(2026, 10, 26).unwrap());
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_closed_after_failure() {
        let page = FakePage::new();
        let reservation = reservation(RunProfile::rehearsal(), clock_at(9, 0, 0));

        let err = reservation.run(&FakeProvider::new(page.clone())).await.unwrap_err();

        match err {
            RunError::Run(failure) => assert_eq!(failure.state, RunState::Init),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_run_starts_at_claim_instant() {
        let profile = RunProfile::live();
        let clock = clock_at(13, 59, 50);
        let reservation = reservation(profile.clone(), clock.clone());
        let page = ready_site(&reservation, &profile);

        let report = reservation.run(&FakeProvider::new(page)).await.unwrap();

        assert_eq!(report.booking_outcome, Finalized::Confirmed);
        // Monday's live target is Wednesday.
        assert_eq!(report.target_date.date, NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
        assert!(clock.now().time() >= NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_session_closed_when_work_panics() {
        let page = FakePage::new();
        let provider = FakeProvider::new(page.clone());

        let run = run_in_session::<(), _>(&provider, |page| {
            Box::pin(async move {
                if page.current_url().await.is_ok() {
                    panic!("driver bug");
                }
                Ok(())
            })
        });
        let unwound = AssertUnwindSafe(run).catch_unwind().await;

        assert!(unwound.is_err());
        assert_eq!(page.close_count(), 1);
    }

    struct Unreachable;

    #[async_trait]
    impl SessionProvider for Unreachable {
        async fn open(&self) -> courtres_driver::Result<Box<dyn Session>> {
            Err(DriverError::Transport("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_unreachable_browser_is_session_error() {
        let reservation = reservation(RunProfile::rehearsal(), clock_at(9, 0, 0));

        let err = reservation.run(&Unreachable).await.unwrap_err();

        assert!(matches!(err, RunError::Session(DriverError::Transport(_))));
    }
}
