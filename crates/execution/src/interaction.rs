//! Resilient interaction - escalating click attempts against a page that
//! may not have settled yet.

use crate::site::{SiteMap, Timings};
use courtres_core::{
    InteractionAttempt, NullObserver, ReservationError, RunEvent, RunObserver, StrategyOutcome,
};
use courtres_driver::{ClickOptions, ElementHandle, ElementState, LoadState, Locator, PageDriver};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Run `strategies` in order until one succeeds.
///
/// Every strategy tried is recorded, with its error text when it fails.
/// Strategies after the first success are never invoked. The value the
/// winning strategy produced is returned alongside the record.
pub async fn attempt_in_order<S, T, E, F, Fut>(
    strategies: &[S],
    mut run: F,
) -> (InteractionAttempt, Option<T>)
where
    S: fmt::Display,
    E: fmt::Display,
    F: FnMut(&S) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = InteractionAttempt::default();
    for strategy in strategies {
        match run(strategy).await {
            Ok(value) => {
                attempt.record(strategy.to_string(), StrategyOutcome::Success);
                return (attempt, Some(value));
            }
            Err(e) => attempt.record(strategy.to_string(), StrategyOutcome::Failure(e.to_string())),
        }
    }
    (attempt, None)
}

/// One way of clicking an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickStrategy {
    /// Pointer click that skips actionability checks
    Forced,
    /// Script-level click on the node
    Scripted,
    /// Plain pointer click with a long timeout
    Patient,
}

impl ClickStrategy {
    /// The default ladder, cheapest first.
    pub const LADDER: [ClickStrategy; 3] = [
        ClickStrategy::Forced,
        ClickStrategy::Scripted,
        ClickStrategy::Patient,
    ];

    /// Strategy name used in records and events.
    pub fn name(self) -> &'static str {
        match self {
            ClickStrategy::Forced => "forced",
            ClickStrategy::Scripted => "scripted",
            ClickStrategy::Patient => "patient",
        }
    }

    async fn apply(
        self,
        element: &dyn ElementHandle,
        timings: &Timings,
    ) -> courtres_driver::Result<()> {
        match self {
            ClickStrategy::Forced => element.click(ClickOptions::forced()).await,
            ClickStrategy::Scripted => element.dispatch_click().await,
            ClickStrategy::Patient => {
                element
                    .click(ClickOptions::with_timeout(timings.patient_click_timeout))
                    .await
            }
        }
    }
}

impl fmt::Display for ClickStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a ladder run that did not hard-fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click landed
    Clicked {
        /// Strategy that landed it
        strategy: ClickStrategy,
    },
    /// The click landed, then the site said the option was gone
    Unavailable,
}

impl ClickOutcome {
    /// Whether the click landed and stuck.
    pub fn is_clicked(&self) -> bool {
        matches!(self, ClickOutcome::Clicked { .. })
    }
}

/// Every strategy on the ladder raised.
#[derive(Debug, Clone, Error)]
#[error("All click strategies failed on {target}: {}", .attempt.last_error().unwrap_or("no strategy tried"))]
pub struct HardClickFailure {
    /// What was being clicked
    pub target: String,
    /// The full ladder record
    pub attempt: InteractionAttempt,
}

impl From<HardClickFailure> for ReservationError {
    fn from(failure: HardClickFailure) -> Self {
        ReservationError::Interaction {
            message: failure
                .attempt
                .last_error()
                .unwrap_or("no strategy tried")
                .to_string(),
            target: failure.target,
        }
    }
}

/// Clicks through [`attempt_in_order`] and then looks for the site's
/// "taken by someone else" notice.
pub struct ResilientClicker {
    strategies: Vec<ClickStrategy>,
    overlay: Option<Locator>,
    notice: Option<Locator>,
    dismiss: Locator,
    timings: Timings,
    observer: Arc<dyn RunObserver>,
}

impl ResilientClicker {
    /// Clicker using the site's overlay and notice locators.
    pub fn new(site: &SiteMap, timings: Timings) -> Self {
        Self {
            strategies: ClickStrategy::LADDER.to_vec(),
            overlay: site.blocking_overlay.clone(),
            notice: site.unavailable_notice.clone(),
            dismiss: site.notice_dismiss.clone(),
            timings,
            observer: Arc::new(NullObserver),
        }
    }

    /// Report failed strategies to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the ladder.
    pub fn with_strategies(mut self, strategies: Vec<ClickStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Click `target` on `page`.
    ///
    /// Fails only when every strategy raised. A click that landed but was
    /// answered with the unavailable notice comes back as
    /// [`ClickOutcome::Unavailable`], with the notice dismissed.
    pub async fn click(
        &self,
        page: &dyn PageDriver,
        target: &Locator,
    ) -> Result<ClickOutcome, HardClickFailure> {
        let element = page.find(target.clone());
        let element: &dyn ElementHandle = element.as_ref();

        let (attempt, winner) = attempt_in_order(&self.strategies, |strategy| {
            let strategy = *strategy;
            async move {
                self.wait_out_overlay(page).await;
                strategy.apply(element, &self.timings).await.map(|_| strategy)
            }
        })
        .await;

        for record in &attempt.records {
            if let StrategyOutcome::Failure(error) = &record.outcome {
                warn!(locator = %target, strategy = %record.strategy, "Click strategy failed: {}", error);
                self.observer.on_event(&RunEvent::StrategyFailed {
                    target: target.to_string(),
                    strategy: record.strategy.clone(),
                    error: error.clone(),
                });
            }
        }

        let Some(strategy) = winner else {
            return Err(HardClickFailure {
                target: target.to_string(),
                attempt,
            });
        };
        debug!(locator = %target, strategy = %strategy, "Clicked");

        if self.notice_shown(page).await {
            return Ok(ClickOutcome::Unavailable);
        }
        Ok(ClickOutcome::Clicked { strategy })
    }

    /// Click a control the flow cannot continue without.
    ///
    /// Here the unavailable notice is as fatal as every strategy raising.
    pub async fn click_required(
        &self,
        page: &dyn PageDriver,
        target: &Locator,
    ) -> Result<ClickStrategy, ReservationError> {
        match self.click(page, target).await? {
            ClickOutcome::Clicked { strategy } => Ok(strategy),
            ClickOutcome::Unavailable => Err(ReservationError::Interaction {
                target: target.to_string(),
                message: "site reported the option as no longer available".to_string(),
            }),
        }
    }

    async fn wait_out_overlay(&self, page: &dyn PageDriver) {
        let Some(overlay) = &self.overlay else {
            return;
        };
        if let Err(e) = page
            .find(overlay.clone())
            .wait_for(ElementState::Hidden, self.timings.overlay_grace)
            .await
        {
            debug!("Overlay still up, clicking anyway: {}", e);
        }
    }

    /// Look for the unavailable notice and dismiss it if it is up.
    async fn notice_shown(&self, page: &dyn PageDriver) -> bool {
        let Some(notice) = &self.notice else {
            return false;
        };
        if page
            .find(notice.clone())
            .wait_for(ElementState::Visible, self.timings.notice_window)
            .await
            .is_err()
        {
            return false;
        }

        warn!("Option was taken by someone else");
        if let Err(e) = page
            .find(self.dismiss.clone())
            .click(ClickOptions::with_timeout(self.timings.overlay_grace))
            .await
        {
            warn!("Could not dismiss unavailable notice: {}", e);
        }
        true
    }
}

/// Let an updating page settle before reading candidates from it.
///
/// Waits for network quiescence, then optionally for `first` to be
/// attached, then sleeps `settle`. The first two waits are best effort.
pub async fn stabilize(
    page: &dyn PageDriver,
    first: Option<&Locator>,
    settle: Duration,
    candidate_wait: Duration,
) {
    if let Err(e) = page.wait_for_load_state(LoadState::NetworkIdle).await {
        warn!("Network did not go idle: {}", e);
    }
    if let Some(first) = first {
        if let Err(e) = page
            .find(first.clone())
            .wait_for(ElementState::Attached, candidate_wait)
            .await
        {
            debug!("First candidate {} not attached yet: {}", first, e);
        }
    }
    tokio::time::sleep(settle).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingObserver;
    use courtres_driver::fake::{Call, ClickKind, Effect, FakeElement, FakePage};
    use std::cell::Cell;

    fn clicker() -> ResilientClicker {
        ResilientClicker::new(&SiteMap::default(), Timings::default())
    }

    #[tokio::test]
    async fn test_attempt_in_order_short_circuits() {
        let calls = Cell::new(0);
        let (attempt, value) = attempt_in_order(&["one", "two", "three"], |name| {
            calls.set(calls.get() + 1);
            let name = *name;
            async move {
                if name == "one" {
                    Err("boom")
                } else {
                    Ok(name.len())
                }
            }
        })
        .await;

        assert_eq!(value, Some(3));
        assert_eq!(calls.get(), 2);
        assert_eq!(attempt.records.len(), 2);
        assert_eq!(attempt.winner(), Some("two"));
        assert_eq!(attempt.last_error(), Some("boom"));
    }

    #[tokio::test]
    async fn test_attempt_in_order_all_fail() {
        let (attempt, value) =
            attempt_in_order(&[1, 2, 3], |n| {
                let n = *n;
                async move { Err::<(), _>(format!("fail {n}")) }
            })
            .await;

        assert!(value.is_none());
        assert!(!attempt.succeeded());
        assert_eq!(attempt.records.len(), 3);
        assert_eq!(attempt.last_error(), Some("fail 3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_failure_escalates_to_scripted() {
        let page = FakePage::new();
        let slot = Locator::button("-7:30pm");
        page.add(slot.clone(), FakeElement::visible().failing(ClickKind::Forced));
        let observer = Arc::new(RecordingObserver::default());

        let outcome = clicker()
            .with_observer(observer.clone())
            .click(&page, &slot)
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Clicked { strategy: ClickStrategy::Scripted });
        assert_eq!(page.clicks(&slot), vec![ClickKind::Forced, ClickKind::Dispatched]);
        assert_eq!(observer.strategy_failures(), vec!["forced".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_strategy_failing_is_hard_failure() {
        let page = FakePage::new();
        let book = Locator::button("Book");
        page.add(
            book.clone(),
            FakeElement::visible()
                .failing(ClickKind::Forced)
                .failing(ClickKind::Dispatched)
                .failing(ClickKind::Plain),
        );

        let failure = clicker().click(&page, &book).await.unwrap_err();

        assert_eq!(failure.attempt.records.len(), 3);
        assert_eq!(
            page.clicks(&book),
            vec![ClickKind::Forced, ClickKind::Dispatched, ClickKind::Plain]
        );
        let err: ReservationError = failure.into();
        assert_eq!(err.kind(), "interaction_failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_makes_click_soft_failure() {
        let site = SiteMap::default();
        let notice = site.unavailable_notice.clone().unwrap();
        let page = FakePage::new();
        let court = Locator::button("PB Court 25").exact();
        page.add(court.clone(), FakeElement::visible().on_click(Effect::show(notice.clone())));
        page.add(notice.clone(), FakeElement::hidden());
        page.add(
            site.notice_dismiss.clone(),
            FakeElement::visible().on_click(Effect::hide(notice.clone())),
        );

        let outcome = clicker().click(&page, &court).await.unwrap();

        assert_eq!(outcome, ClickOutcome::Unavailable);
        assert_eq!(page.clicks(&site.notice_dismiss), vec![ClickKind::Plain]);
        assert!(!page.find(notice).is_visible().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_waited_before_each_attempt() {
        let site = SiteMap::default();
        let overlay = site.blocking_overlay.clone().unwrap();
        let page = FakePage::new();
        let next = Locator::button("Next");
        page.add(overlay.clone(), FakeElement::visible());
        page.add(next.clone(), FakeElement::visible().failing(ClickKind::Forced));

        let started = tokio::time::Instant::now();
        let outcome = clicker().click(&page, &next).await.unwrap();

        assert!(outcome.is_clicked());
        let overlay_waits = page
            .calls()
            .into_iter()
            .filter(|(_, call)| *call == Call::WaitFor(overlay.clone(), ElementState::Hidden))
            .count();
        assert_eq!(overlay_waits, 2);
        assert!(started.elapsed() >= Timings::default().overlay_grace * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stabilize_tolerates_missing_candidate() {
        let page = FakePage::new();
        let first = Locator::button("-2:30pm");
        let started = tokio::time::Instant::now();

        stabilize(&page, Some(&first), Duration::from_millis(1000), Duration::from_secs(5)).await;

        assert!(started.elapsed() >= Duration::from_secs(6));
        assert_eq!(page.calls()[0].1, Call::WaitForLoadState(LoadState::NetworkIdle));
    }
}
