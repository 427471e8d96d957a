//! Shared test fixtures: a scripted booking site and a recording observer.

use crate::site::SiteMap;
use courtres_core::{RunEvent, RunObserver, RunProfile, RunState, SkipReason, TargetDate};
use courtres_driver::fake::{Effect, FakeElement, FakePage};
use std::sync::Mutex;

/// Name of the fake document behind the site's iframe.
pub(crate) const MODAL: &str = "modal";

/// Where cancelling a booking lands.
pub(crate) const LISTING_URL: &str = "https://app.playbypoint.com/users/reservations";

/// Monday 26 October 2026.
pub(crate) fn target() -> TargetDate {
    TargetDate::from_date(chrono::NaiveDate::from_ymd_opt(2026, 10, 26).unwrap())
}

/// A booking site with every control of the flow in place, but no
/// bookable options yet.
///
/// Clicking "Sign in" clears the sign-in form and shows the reservation
/// landmark. The cancellation "Yes" navigates to the listing.
pub(crate) fn scripted_site(site: &SiteMap) -> FakePage {
    let page = FakePage::new();

    let login = page.add_frame(site.login_frame.clone(), MODAL);
    login.add(site.email_field.clone(), FakeElement::visible());
    login.add(site.password_field.clone(), FakeElement::visible());
    login.add(
        site.sign_in.clone(),
        FakeElement::visible()
            .on_click(Effect::Hide {
                doc: MODAL.to_string(),
                locator: site.email_field.clone(),
            })
            .on_click(Effect::show(site.reservation_landmark.clone())),
    );
    page.add(site.reservation_landmark.clone(), FakeElement::hidden());

    page.add(site.sport_option.clone(), FakeElement::visible());
    page.add(site.proceed.clone(), FakeElement::visible());
    if let Some(add_users) = &site.add_users {
        page.add(add_users.clone(), FakeElement::visible());
    }
    page.add(site.add_participant.clone(), FakeElement::visible());
    page.add(site.book.clone(), FakeElement::visible());
    page.add(site.confirm.clone(), FakeElement::visible());
    page.add(site.cancel.clone(), FakeElement::visible());

    let dialog = page.add_frame(site.cancel_frame.clone(), MODAL);
    dialog.add(
        site.cancel_confirm.clone(),
        FakeElement::visible().on_click(Effect::Navigate(LISTING_URL.to_string())),
    );
    page
}

/// Offer the target day and every slot and court of `profile`.
pub(crate) fn stock_options(page: &FakePage, site: &SiteMap, target: &TargetDate, profile: &RunProfile) {
    page.add(site.calendar_day(target), FakeElement::visible());
    for label in profile.time_slot_candidates() {
        page.add(site.time_slot(label), FakeElement::visible());
    }
    for court in profile.court_candidates() {
        page.add(site.court(court), FakeElement::visible());
    }
}

/// Observer that keeps every event.
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn states(&self) -> Vec<RunState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::StateReached { state } => Some(state),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn skipped(&self) -> Vec<(String, SkipReason)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::CandidateSkipped { label, reason } => Some((label, reason)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn strategy_failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::StrategyFailed { strategy, .. } => Some(strategy),
                _ => None,
            })
            .collect()
    }

    /// Success flag of the `RunFinished` event, if one was sent.
    pub(crate) fn finished(&self) -> Option<bool> {
        self.events().into_iter().find_map(|e| match e {
            RunEvent::RunFinished { success, .. } => Some(success),
            _ => None,
        })
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
