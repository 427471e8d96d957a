//! Confirmation flow - participants, submit, then commit or roll back.

use crate::interaction::ResilientClicker;
use crate::site::{SiteMap, Timings};
use courtres_core::{Finalized, ReservationError, RunProfile};
use courtres_driver::{ElementState, Locator, PageDriver};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

const URL_POLL: std::time::Duration = std::time::Duration::from_millis(100);

/// Drives the pages after a court has been picked.
///
/// Every failure in here is reported as
/// [`ReservationError::ConfirmationFailure`].
pub struct ConfirmationFlow<'a> {
    site: &'a SiteMap,
    timings: &'a Timings,
    clicker: &'a ResilientClicker,
}

impl<'a> ConfirmationFlow<'a> {
    /// Flow over the given site map.
    pub fn new(site: &'a SiteMap, timings: &'a Timings, clicker: &'a ResilientClicker) -> Self {
        Self {
            site,
            timings,
            clicker,
        }
    }

    /// Add the account holder as participant, when the site asks for one,
    /// and move on to the booking page.
    pub async fn add_participants(&self, page: &dyn PageDriver) -> Result<(), ReservationError> {
        match &self.site.add_users {
            Some(add_users) => {
                self.click_settled(page, add_users).await?;
                self.click_settled(page, &self.site.add_participant).await?;
            }
            None => debug!("No participant picker configured"),
        }
        self.click_settled(page, &self.site.proceed).await
    }

    /// Submit the booking.
    pub async fn submit(&self, page: &dyn PageDriver) -> Result<(), ReservationError> {
        self.click(page, &self.site.book).await
    }

    /// Confirm a live booking, or cancel a rehearsal one. Exactly one
    /// branch runs, picked by the profile.
    pub async fn finalize(
        &self,
        page: &dyn PageDriver,
        profile: &RunProfile,
    ) -> Result<Finalized, ReservationError> {
        if profile.test_mode() {
            self.cancel(page).await?;
            Ok(Finalized::Cancelled)
        } else {
            self.confirm(page).await?;
            Ok(Finalized::Confirmed)
        }
    }

    async fn confirm(&self, page: &dyn PageDriver) -> Result<(), ReservationError> {
        self.click(page, &self.site.confirm).await?;

        if let Some(landmark) = &self.site.confirmed_landmark {
            page.find(landmark.clone())
                .wait_for(ElementState::Visible, self.timings.landmark_timeout)
                .await
                .map_err(|e| failure(format!("booking not acknowledged: {e}")))?;
        }
        info!("Booking confirmed");
        Ok(())
    }

    async fn cancel(&self, page: &dyn PageDriver) -> Result<(), ReservationError> {
        info!("Rehearsal run, cancelling the booking");
        self.click_settled(page, &self.site.cancel).await?;

        let frame = &self.site.cancel_frame;
        page.find(frame.clone())
            .wait_for(ElementState::Attached, self.timings.landmark_timeout)
            .await
            .map_err(|e| failure(format!("cancellation dialog not shown: {e}")))?;
        let dialog = page
            .embedded_document(frame)
            .await
            .map_err(|e| failure(format!("cancellation dialog not found: {e}")))?;
        self.click(dialog.as_ref(), &self.site.cancel_confirm).await?;

        self.await_listing(page).await?;
        info!("Booking cancelled");
        Ok(())
    }

    /// Wait for the top-level URL to reach the reservations listing.
    async fn await_listing(&self, page: &dyn PageDriver) -> Result<(), ReservationError> {
        let deadline = Instant::now() + self.timings.navigation_timeout;
        loop {
            let url = page
                .current_url()
                .await
                .map_err(|e| failure(format!("could not read current url: {e}")))?;
            if url.contains(&self.site.listing_path) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(failure(format!(
                    "expected to land on {}, still at {}",
                    self.site.listing_path, url
                )));
            }
            sleep(URL_POLL).await;
        }
    }

    async fn click(&self, page: &dyn PageDriver, target: &Locator) -> Result<(), ReservationError> {
        self.clicker
            .click_required(page, target)
            .await
            .map(|_| ())
            .map_err(|e| failure(e.to_string()))
    }

    async fn click_settled(
        &self,
        page: &dyn PageDriver,
        target: &Locator,
    ) -> Result<(), ReservationError> {
        self.click(page, target).await?;
        sleep(self.timings.step_settle).await;
        Ok(())
    }
}

fn failure(message: String) -> ReservationError {
    ReservationError::ConfirmationFailure(message)
}
