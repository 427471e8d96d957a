//! The reservation orchestrator - drives one run through the booking flow.

use crate::confirmation::ConfirmationFlow;
use crate::interaction::{stabilize, ClickOutcome, ResilientClicker};
use crate::observer::TracingObserver;
use crate::site::{SiteMap, Timings};
use courtres_core::{
    Credentials, PartialBlockPolicy, ReservationError, RunEvent, RunFailure, RunId, RunObserver,
    RunProfile, RunReport, RunState, SkipReason, SlotSelectionOutcome, TargetDate,
};
use courtres_driver::{DriverError, ElementState, LoadState, Locator, PageDriver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs the booking flow against one page:
/// ```text
/// Sign in → Reservation page → Date → Sport → Slots → Court
///         → Participants → Book → Confirm | Cancel
/// ```
///
/// Any hard failure stops the run where it is. Nothing is retried as a
/// whole; resilience lives in the click ladder and in candidate fallback.
pub struct ReservationOrchestrator {
    run_id: RunId,
    profile: RunProfile,
    credentials: Credentials,
    target: TargetDate,
    site: SiteMap,
    timings: Timings,
    observer: Arc<dyn RunObserver>,
    screenshot_dir: Option<PathBuf>,
    state: RunState,
}

impl ReservationOrchestrator {
    /// Create an orchestrator for one run.
    pub fn new(profile: RunProfile, credentials: Credentials, target: TargetDate) -> Self {
        let run_id = RunId::new();
        Self {
            run_id,
            profile,
            credentials,
            target,
            site: SiteMap::default(),
            timings: Timings::default(),
            observer: Arc::new(TracingObserver::new(run_id)),
            screenshot_dir: None,
            state: RunState::Init,
        }
    }

    /// Use a specific run id.
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
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

    /// Send run events to `observer` instead of the log.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
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

    /// Last state reached.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drive the whole flow on `page`.
    pub async fn run(&mut self, page: &dyn PageDriver) -> Result<RunReport, RunFailure> {
        self.state = RunState::Init;
        info!(
            run_id = %self.run_id,
            test_mode = self.profile.test_mode(),
            "Reserving {} for {}",
            self.profile.block_description(),
            self.target
        );

        match self.drive(page).await {
            Ok(report) => {
                info!("Run finished: {}", report.booking_outcome);
                self.emit(RunEvent::RunFinished {
                    state: self.state,
                    success: true,
                    detail: None,
                });
                Ok(report)
            }
            Err(error) => {
                error!(state = %self.state, kind = error.kind(), "Run failed: {}", error);
                self.capture_failure(page).await;
                self.emit(RunEvent::RunFinished {
                    state: self.state,
                    success: false,
                    detail: Some(error.to_string()),
                });
                Err(RunFailure {
                    state: self.state,
                    error,
                })
            }
        }
    }

    async fn drive(&mut self, page: &dyn PageDriver) -> Result<RunReport, ReservationError> {
        let clicker =
            ResilientClicker::new(&self.site, self.timings).with_observer(self.observer.clone());

        self.authenticate(page, &clicker).await?;
        self.advance(RunState::Authenticated);

        self.open_reservation_page(page).await?;
        self.advance(RunState::OnReservationPage);

        self.select_date(page, &clicker).await?;
        self.advance(RunState::DateSelected);

        self.select_sport(page, &clicker).await?;
        self.advance(RunState::SportSelected);

        let slots = self.select_slots(page, &clicker).await?;
        self.advance(RunState::SlotsSelected);

        let court = self.select_court(page, &clicker).await?;
        self.advance(RunState::CourtSelected);

        self.step("proceed");
        clicker.click_required(page, &self.site.proceed).await?;
        tokio::time::sleep(self.timings.step_settle).await;

        self.step("add_participants");
        self.confirmation(&clicker).add_participants(page).await?;
        self.advance(RunState::UsersAdded);

        self.step("book");
        self.confirmation(&clicker).submit(page).await?;
        self.advance(RunState::Booked);

        self.step("finalize");
        let outcome = self.confirmation(&clicker).finalize(page, &self.profile).await?;
        self.advance(RunState::Finalized(outcome));

        Ok(RunReport {
            run_id: self.run_id,
            booking_outcome: outcome,
            test_mode: self.profile.test_mode(),
            target_date: self.target,
            slots,
            court,
        })
    }

    async fn authenticate(
        &self,
        page: &dyn PageDriver,
        clicker: &ResilientClicker,
    ) -> Result<(), ReservationError> {
        self.step("authenticate");
        self.load_booking_page(page).await?;

        let frame = &self.site.login_frame;
        page.find(frame.clone())
            .wait_for(ElementState::Attached, self.timings.landmark_timeout)
            .await
            .map_err(|e| auth_failure("sign-in form not found", e))?;
        let form = page
            .embedded_document(frame)
            .await
            .map_err(|e| auth_failure("sign-in form not found", e))?;
        let form = form.as_ref();

        let email = form.find(self.site.email_field.clone());
        email
            .wait_for(ElementState::Visible, self.timings.landmark_timeout)
            .await
            .map_err(|e| auth_failure("email field not shown", e))?;
        email
            .fill(&self.credentials.email)
            .await
            .map_err(|e| auth_failure("could not enter email", e))?;
        form.find(self.site.password_field.clone())
            .fill(&self.credentials.password)
            .await
            .map_err(|e| auth_failure("could not enter password", e))?;

        clicker
            .click_required(form, &self.site.sign_in)
            .await
            .map_err(|e| ReservationError::AuthenticationFailure(e.to_string()))?;

        // A form that stays up means the credentials were turned down. The
        // frame itself going away counts as cleared.
        match email
            .wait_for(ElementState::Hidden, self.timings.landmark_timeout)
            .await
        {
            Ok(()) | Err(DriverError::NotFound(_)) => {}
            Err(e) => return Err(auth_failure("sign-in not accepted", e)),
        }

        if let Err(e) = page.wait_for_load_state(LoadState::NetworkIdle).await {
            warn!("Network still busy after sign-in: {}", e);
        }
        Ok(())
    }

    /// Open the booking URL and wait for it to load, all within
    /// `page_load`.
    async fn load_booking_page(&self, page: &dyn PageDriver) -> Result<(), ReservationError> {
        let url = &self.site.booking_url;
        let budget = self.timings.page_load;
        let load = async {
            page.navigate(url).await?;
            page.wait_for_load_state(LoadState::Load).await
        };
        match tokio::time::timeout(budget, load).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ReservationError::PageLoadTimeout(format!("{url}: {e}"))),
            Err(_) => Err(ReservationError::PageLoadTimeout(format!(
                "{url}: not loaded within {}ms",
                budget.as_millis()
            ))),
        }
    }

    async fn open_reservation_page(&self, page: &dyn PageDriver) -> Result<(), ReservationError> {
        self.step("reservation_page");
        let landmark = &self.site.reservation_landmark;
        page.find(landmark.clone())
            .wait_for(ElementState::Visible, self.timings.landmark_timeout)
            .await
            .map_err(|e| ReservationError::PageLoadTimeout(format!("{landmark}: {e}")))
    }

    async fn select_date(
        &self,
        page: &dyn PageDriver,
        clicker: &ResilientClicker,
    ) -> Result<(), ReservationError> {
        self.step("select_date");
        let day = self.site.calendar_day(&self.target);
        page.find(day.clone())
            .wait_for(ElementState::Visible, self.timings.landmark_timeout)
            .await
            .map_err(|e| interaction(&day, &e))?;
        clicker.click_required(page, &day).await?;
        info!("Selected {}", self.target);
        Ok(())
    }

    async fn select_sport(
        &self,
        page: &dyn PageDriver,
        clicker: &ResilientClicker,
    ) -> Result<(), ReservationError> {
        self.step("select_sport");
        let sport = &self.site.sport_option;
        let option = page.find(sport.clone());
        option
            .wait_for(ElementState::Visible, self.timings.landmark_timeout)
            .await
            .map_err(|e| interaction(sport, &e))?;

        if option.is_selected().await.map_err(|e| interaction(sport, &e))? {
            debug!("{} already selected", sport);
            return Ok(());
        }
        clicker.click_required(page, sport).await?;
        Ok(())
    }

    /// Walk the slot labels once, claiming every usable one.
    async fn select_slots(
        &self,
        page: &dyn PageDriver,
        clicker: &ResilientClicker,
    ) -> Result<SlotSelectionOutcome, ReservationError> {
        self.step("select_slots");
        let labels = self.profile.time_slot_candidates();
        let first = labels.first().map(|label| self.site.time_slot(label));
        stabilize(
            page,
            first.as_ref(),
            self.timings.slot_settle,
            self.timings.candidate_wait,
        )
        .await;

        let mut outcome = SlotSelectionOutcome::default();
        for label in labels {
            let slot = self.site.time_slot(label);
            if let Some(reason) = self.unusable(page, &slot).await? {
                self.skipped(label, reason);
                outcome.skip(label.as_str(), reason);
                continue;
            }

            match clicker.click(page, &slot).await? {
                ClickOutcome::Clicked { .. } => {
                    info!("Selected slot {}", label);
                    outcome.select(label.as_str());
                }
                ClickOutcome::Unavailable => {
                    self.skipped(label, SkipReason::TransientUnavailable);
                    outcome.skip(label.as_str(), SkipReason::TransientUnavailable);
                }
            }
        }

        let short = outcome.selected_count() < labels.len()
            && self.profile.partial_block() == PartialBlockPolicy::RequireAll;
        if outcome.selected_count() == 0 || short {
            return Err(ReservationError::NoSlotsAvailable { outcome });
        }
        info!(
            "Selected {} of {} slots",
            outcome.selected_count(),
            labels.len()
        );
        Ok(outcome)
    }

    /// Claim the first usable court in preference order.
    async fn select_court(
        &self,
        page: &dyn PageDriver,
        clicker: &ResilientClicker,
    ) -> Result<String, ReservationError> {
        self.step("select_court");
        let courts = self.profile.court_candidates();
        let first = courts.first().map(|name| self.site.court(name));
        stabilize(
            page,
            first.as_ref(),
            self.timings.court_settle,
            self.timings.candidate_wait,
        )
        .await;

        let mut tried = Vec::new();
        for name in courts {
            tried.push(name.clone());
            let court = self.site.court(name);
            if let Some(reason) = self.unusable(page, &court).await? {
                self.skipped(name, reason);
                continue;
            }

            match clicker.click(page, &court).await? {
                ClickOutcome::Clicked { .. } => {
                    info!("Selected {}", name);
                    return Ok(name.clone());
                }
                ClickOutcome::Unavailable => self.skipped(name, SkipReason::TransientUnavailable),
            }
        }
        Err(ReservationError::NoCourtAvailable { tried })
    }

    /// Why a candidate cannot be clicked, if it cannot.
    async fn unusable(
        &self,
        page: &dyn PageDriver,
        candidate: &Locator,
    ) -> Result<Option<SkipReason>, ReservationError> {
        let element = page.find(candidate.clone());
        if !element
            .is_visible()
            .await
            .map_err(|e| interaction(candidate, &e))?
        {
            return Ok(Some(SkipReason::NotVisible));
        }
        match element.is_disabled().await {
            Ok(true) => Ok(Some(SkipReason::Disabled)),
            Ok(false) => Ok(None),
            // Gone between the two checks.
            Err(DriverError::NotFound(_)) => Ok(Some(SkipReason::NotVisible)),
            Err(e) => Err(interaction(candidate, &e)),
        }
    }

    fn confirmation<'a>(&'a self, clicker: &'a ResilientClicker) -> ConfirmationFlow<'a> {
        ConfirmationFlow::new(&self.site, &self.timings, clicker)
    }

    fn step(&self, step: &str) {
        debug!("Step: {}", step);
        self.emit(RunEvent::StepStarted {
            step: step.to_string(),
        });
    }

    fn advance(&mut self, state: RunState) {
        self.state = state;
        self.emit(RunEvent::StateReached { state });
    }

    fn skipped(&self, label: &str, reason: SkipReason) {
        self.emit(RunEvent::CandidateSkipped {
            label: label.to_string(),
            reason,
        });
    }

    fn emit(&self, event: RunEvent) {
        self.observer.on_event(&event);
    }

    async fn capture_failure(&self, page: &dyn PageDriver) {
        let Some(dir) = &self.screenshot_dir else {
            return;
        };
        let path = dir.join(format!("{}-{}.png", self.run_id, self.state));
        match page.screenshot(&path).await {
            Ok(()) => info!("Saved failure screenshot to {}", path.display()),
            Err(e) => warn!("Could not save failure screenshot: {}", e),
        }
    }
}

fn interaction(target: &Locator, error: &DriverError) -> ReservationError {
    ReservationError::Interaction {
        target: target.to_string(),
        message: error.to_string(),
    }
}

fn auth_failure(what: &str, error: DriverError) -> ReservationError {
    ReservationError::AuthenticationFailure(format!("{what}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{scripted_site, stock_options, target, RecordingObserver, LISTING_URL, MODAL};
    use courtres_core::{Finalized, SkippedCandidate};
    use courtres_driver::fake::{Call, ClickKind, Effect, FakeElement, FakePage};
    use std::time::Duration;

    fn orchestrator(profile: RunProfile, observer: Arc<RecordingObserver>) -> ReservationOrchestrator {
        ReservationOrchestrator::new(
            profile,
            Credentials::new("player@example.com", "hunter2"),
            target(),
        )
        .with_observer(observer)
    }

    fn site_for(profile: &RunProfile) -> FakePage {
        let site = SiteMap::default();
        let page = scripted_site(&site);
        stock_options(&page, &site, &target(), profile);
        page
    }

    #[tokio::test(start_paused = true)]
    async fn test_rehearsal_run_cancels_booking() {
        let profile = RunProfile::rehearsal();
        let page = site_for(&profile);
        let observer = Arc::new(RecordingObserver::default());
        let mut run = orchestrator(profile, observer.clone());

        let report = run.run(&page).await.unwrap();

        assert_eq!(report.booking_outcome, Finalized::Cancelled);
        assert!(report.test_mode);
        assert_eq!(report.court, "PB Court 1");
        assert_eq!(report.slots.selected_count(), 4);
        assert_eq!(run.state(), RunState::Finalized(Finalized::Cancelled));
        assert_eq!(page.url(), LISTING_URL);
        assert_eq!(
            observer.states(),
            vec![
                RunState::Authenticated,
                RunState::OnReservationPage,
                RunState::DateSelected,
                RunState::SportSelected,
                RunState::SlotsSelected,
                RunState::CourtSelected,
                RunState::UsersAdded,
                RunState::Booked,
                RunState::Finalized(Finalized::Cancelled),
            ]
        );
        assert_eq!(observer.finished(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_run_confirms_booking() {
        let profile = RunProfile::live();
        let page = site_for(&profile);
        let site = SiteMap::default();
        let observer = Arc::new(RecordingObserver::default());

        let report = orchestrator(profile, observer.clone()).run(&page).await.unwrap();

        assert_eq!(report.booking_outcome, Finalized::Confirmed);
        assert_eq!(report.court, "PB Court 25");
        assert!(!page.touched(&site.cancel));
        let finals: Vec<_> = observer.states().into_iter().filter(|s| s.is_final()).collect();
        assert_eq!(finals, vec![RunState::Finalized(Finalized::Confirmed)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_credentials_entered_in_sign_in_form() {
        let profile = RunProfile::rehearsal();
        let page = site_for(&profile);
        let site = SiteMap::default();

        orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap();

        let fills: Vec<_> = page
            .calls()
            .into_iter()
            .filter(|(doc, call)| doc == MODAL && matches!(call, Call::Fill(..)))
            .map(|(_, call)| call)
            .collect();
        assert_eq!(
            fills,
            vec![
                Call::Fill(site.email_field.clone(), "player@example.com".into()),
                Call::Fill(site.password_field.clone(), "hunter2".into()),
            ]
        );
        assert_eq!(page.calls()[0].1, Call::Navigate(site.booking_url.clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_slots_are_skipped() {
        let profile = RunProfile::rehearsal().with_slots(vec!["A".into(), "B".into(), "C".into(), "D".into()]);
        let page = site_for(&profile);
        let site = SiteMap::default();
        page.add(site.time_slot("C"), FakeElement::visible().disabled());
        page.remove(&site.time_slot("D"));
        let observer = Arc::new(RecordingObserver::default());

        let report = orchestrator(profile, observer.clone()).run(&page).await.unwrap();

        assert_eq!(report.slots.selected, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            report.slots.skipped,
            vec![
                SkippedCandidate { label: "C".into(), reason: SkipReason::Disabled },
                SkippedCandidate { label: "D".into(), reason: SkipReason::NotVisible },
            ]
        );
        assert!(page.clicks(&site.time_slot("C")).is_empty());
        assert_eq!(
            observer.skipped(),
            vec![("C".to_string(), SkipReason::Disabled), ("D".to_string(), SkipReason::NotVisible)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_usable_slot_fails_run() {
        let profile = RunProfile::rehearsal().with_slots(vec!["A".into(), "B".into()]);
        let page = site_for(&profile);
        let site = SiteMap::default();
        page.add(site.time_slot("A"), FakeElement::visible().disabled());
        page.remove(&site.time_slot("B"));
        let observer = Arc::new(RecordingObserver::default());

        let failure = orchestrator(profile, observer.clone())
            .with_screenshot_dir("/tmp/courtres")
            .run(&page)
            .await
            .unwrap_err();

        assert_eq!(failure.state, RunState::SportSelected);
        match failure.error {
            ReservationError::NoSlotsAvailable { outcome } => {
                assert_eq!(outcome.selected_count(), 0);
                assert_eq!(outcome.skipped.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!page.touched(&site.book));
        assert!(page
            .calls()
            .iter()
            .any(|(_, call)| matches!(call, Call::Screenshot(path) if path.starts_with("/tmp/courtres"))));
        assert_eq!(observer.finished(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_require_all_rejects_partial_block() {
        let profile = RunProfile::rehearsal()
            .with_slots(vec!["A".into(), "B".into()])
            .with_partial_block(PartialBlockPolicy::RequireAll);
        let page = site_for(&profile);
        page.add(SiteMap::default().time_slot("B"), FakeElement::visible().disabled());

        let failure = orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap_err();

        assert_eq!(failure.error.kind(), "no_slots_available");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_taken_mid_click_is_skipped() {
        let site = SiteMap::default();
        let notice = site.unavailable_notice.clone().unwrap();
        let profile = RunProfile::rehearsal().with_slots(vec!["A".into(), "B".into()]);
        let page = site_for(&profile);
        page.add(site.time_slot("A"), FakeElement::visible().on_click(Effect::show(notice.clone())));
        page.add(notice.clone(), FakeElement::hidden());
        page.add(site.notice_dismiss.clone(), FakeElement::visible().on_click(Effect::hide(notice)));

        let report = orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap();

        assert_eq!(report.slots.selected, vec!["B".to_string()]);
        assert_eq!(report.slots.skipped[0].reason, SkipReason::TransientUnavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_court_fallback_stops_at_first_success() {
        let profile = RunProfile::rehearsal().with_courts(vec![
            "Court 25".into(),
            "Court 1".into(),
            "Court 3".into(),
        ]);
        let page = site_for(&profile);
        let site = SiteMap::default();
        page.add(site.court("Court 25"), FakeElement::hidden());

        let report = orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap();

        assert_eq!(report.court, "Court 1");
        assert!(page.clicks(&site.court("Court 25")).is_empty());
        assert_eq!(page.clicks(&site.court("Court 1")), vec![ClickKind::Forced]);
        assert!(!page.touched(&site.court("Court 3")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_usable_court_fails_run() {
        let profile = RunProfile::rehearsal().with_courts(vec!["Court 25".into(), "Court 1".into()]);
        let page = site_for(&profile);
        let site = SiteMap::default();
        page.add(site.court("Court 25"), FakeElement::hidden());
        page.add(site.court("Court 1"), FakeElement::visible().disabled());

        let failure = orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap_err();

        assert_eq!(failure.state, RunState::SlotsSelected);
        assert_eq!(
            failure.error.to_string(),
            "No available court (tried Court 25, Court 1)"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_selected_sport_is_not_clicked() {
        let profile = RunProfile::rehearsal();
        let page = site_for(&profile);
        let site = SiteMap::default();
        page.add(site.sport_option.clone(), FakeElement::visible().selected());

        orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap();

        assert!(page.clicks(&site.sport_option).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_sign_in_form_is_authentication_failure() {
        let page = FakePage::new();

        let failure = orchestrator(RunProfile::rehearsal(), Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap_err();

        assert_eq!(failure.state, RunState::Init);
        assert_eq!(failure.error.kind(), "authentication_failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_sign_in_is_authentication_failure() {
        let profile = RunProfile::rehearsal();
        let page = site_for(&profile);
        let site = SiteMap::default();
        // Wrong password: the form stays where it is.
        page.add_frame(site.login_frame.clone(), MODAL)
            .add(site.sign_in.clone(), FakeElement::visible());

        let failure = orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap_err();

        assert_eq!(failure.state, RunState::Init);
        assert_eq!(failure.error.kind(), "authentication_failure");
        assert!(failure.error.to_string().contains("sign-in not accepted"));
        assert!(!page.touched(&site.reservation_landmark));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_frame_rendered_late() {
        let profile = RunProfile::rehearsal();
        let page = site_for(&profile);
        let site = SiteMap::default();
        page.remove_frame(&site.login_frame);
        let late = page.clone();
        let frame = site.login_frame.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            late.add_frame(frame, MODAL);
        });

        let report = orchestrator(profile, Arc::new(RecordingObserver::default()))
            .run(&page)
            .await
            .unwrap();

        assert_eq!(report.booking_outcome, Finalized::Cancelled);
        assert_eq!(page.clicks_in(MODAL, &site.sign_in), vec![ClickKind::Forced]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_booking_page_is_page_load_timeout() {
        let profile = RunProfile::rehearsal();
        let page = site_for(&profile);
        page.set_load_delay(Duration::from_secs(120));
        let timings = Timings {
            page_load: Duration::from_secs(5),
            ..Timings::default()
        };
        let started = tokio::time::Instant::now();

        let failure = orchestrator(profile, Arc::new(RecordingObserver::default()))
            .with_timings(timings)
            .run(&page)
            .await
            .unwrap_err();

        assert_eq!(failure.state, RunState::Init);
        assert_eq!(failure.error.kind(), "page_load_timeout");
        assert!(started.elapsed() < Duration::from_secs(6));
    }
}
