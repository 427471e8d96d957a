//! Where things are on the booking site, and how long to give them.

use courtres_core::TargetDate;
use courtres_driver::{Locator, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Every URL and landmark the reservation flow touches.
///
/// Defaults describe the production booking site. A JSON config file can
/// override single entries when the site changes its markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMap {
    /// Booking entry point
    pub booking_url: String,

    /// Container of the sign-in form
    pub login_frame: Locator,
    /// Email field inside the sign-in form
    pub email_field: Locator,
    /// Password field inside the sign-in form
    pub password_field: Locator,
    /// Submit control of the sign-in form
    pub sign_in: Locator,

    /// Visible once the reservation page is usable
    pub reservation_landmark: Locator,
    /// Sport option button
    pub sport_option: Locator,
    /// Advances past the selection page and the participants page
    pub proceed: Locator,

    /// Opens the participant picker, when the site asks for one
    pub add_users: Option<Locator>,
    /// Adds the account holder as participant
    pub add_participant: Locator,
    /// Submits the booking
    pub book: Locator,
    /// Affirms the booking
    pub confirm: Locator,
    /// Visible once a live booking went through, when the site shows one
    pub confirmed_landmark: Option<Locator>,

    /// Cancels a freshly made booking
    pub cancel: Locator,
    /// Container of the cancellation dialog
    pub cancel_frame: Locator,
    /// Affirms the cancellation inside its dialog
    pub cancel_confirm: Locator,
    /// Path segment of the reservations listing reached after cancelling
    pub listing_path: String,

    /// Notice shown when a clicked option was taken by someone else
    pub unavailable_notice: Option<Locator>,
    /// Dismisses that notice
    pub notice_dismiss: Locator,
    /// Overlay that swallows clicks while the page updates
    pub blocking_overlay: Option<Locator>,
}

impl Default for SiteMap {
    fn default() -> Self {
        Self {
            booking_url: "https://app.playbypoint.com/book/ipicklewhittiernarrows?skip_waivers=true"
                .to_string(),
            login_frame: Locator::css("iframe"),
            email_field: Locator::role(Role::Textbox, "Email"),
            password_field: Locator::role(Role::Textbox, "Password"),
            sign_in: Locator::button("Sign in"),
            reservation_landmark: Locator::text("Select date and time"),
            sport_option: Locator::button("Pickleball"),
            proceed: Locator::button("Next"),
            add_users: Some(Locator::button(" Add Users")),
            add_participant: Locator::button("Add").nth(1),
            book: Locator::button("Book"),
            confirm: Locator::button("Yes"),
            confirmed_landmark: None,
            cancel: Locator::css("button.ui.button.basic.black.tiny.fluid"),
            cancel_frame: Locator::css("iframe"),
            cancel_confirm: Locator::button("Yes"),
            listing_path: "/reservations".to_string(),
            unavailable_notice: Some(Locator::text("no longer available")),
            notice_dismiss: Locator::button("OK"),
            blocking_overlay: Some(Locator::css(".ui.dimmer.active")),
        }
    }
}

impl SiteMap {
    /// Calendar button for the target day, named like "Mon 21".
    pub fn calendar_day(&self, target: &TargetDate) -> Locator {
        Locator::button(target.calendar_label()).exact()
    }

    /// Time slot button. Slot labels are fragments of the button name.
    pub fn time_slot(&self, label: &str) -> Locator {
        Locator::button(label)
    }

    /// Court button, matched on its whole name so "PB Court 1" never
    /// picks "PB Court 12".
    pub fn court(&self, name: &str) -> Locator {
        Locator::button(name).exact()
    }
}

/// Every wait the flow performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Landmark and form-field visibility budget
    #[serde(with = "millis")]
    pub landmark_timeout: Duration,

    /// Budget for opening the booking URL and reaching its load event
    #[serde(with = "millis")]
    pub page_load: Duration,

    /// Settle delay before looking at time slots
    #[serde(with = "millis")]
    pub slot_settle: Duration,

    /// Settle delay before looking at courts
    #[serde(with = "millis")]
    pub court_settle: Duration,

    /// Pause after add-user, next and cancel clicks
    #[serde(with = "millis")]
    pub step_settle: Duration,

    /// How long to wait for the first candidate to appear
    #[serde(with = "millis")]
    pub candidate_wait: Duration,

    /// Longest wait for a blocking overlay to clear before a click
    #[serde(with = "millis")]
    pub overlay_grace: Duration,

    /// How long to look for the "unavailable" notice after a click
    #[serde(with = "millis")]
    pub notice_window: Duration,

    /// Timeout of the last, plain click on the ladder
    #[serde(with = "millis")]
    pub patient_click_timeout: Duration,

    /// Budget for the post-cancel navigation to reach the listing
    #[serde(with = "millis")]
    pub navigation_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            landmark_timeout: Duration::from_secs(30),
            page_load: Duration::from_secs(30),
            slot_settle: Duration::from_millis(1000),
            court_settle: Duration::from_millis(500),
            step_settle: Duration::from_millis(500),
            candidate_wait: Duration::from_secs(5),
            overlay_grace: Duration::from_secs(1),
            notice_window: Duration::from_millis(250),
            patient_click_timeout: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(15),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
