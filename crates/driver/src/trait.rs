//! Driver traits.

use crate::locator::Locator;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Result alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors raised by a page driver.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    /// A bounded wait expired
    #[error("Timed out after {}ms waiting for {what}", .timeout.as_millis())]
    Timeout {
        /// What was awaited
        what: String,
        /// Budget that expired
        timeout: Duration,
    },

    /// No element matched the locator
    #[error("No element matches {0}")]
    NotFound(String),

    /// Element exists but cannot be acted on (covered, detached, disabled)
    #[error("Element {locator} not interactable: {reason}")]
    NotInteractable {
        /// Locator of the element
        locator: String,
        /// Reason given by the driver
        reason: String,
    },

    /// The remote end answered with an error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The connection to the remote end failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The session is gone
    #[error("Session closed")]
    SessionClosed,
}

impl DriverError {
    /// Whether this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

/// Page load milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// `load` fired
    Load,
    /// DOM parsed
    DomContentLoaded,
    /// No network activity for a short window
    NetworkIdle,
}

/// Element states that can be awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Present in the document
    Attached,
    /// Absent from the document
    Detached,
    /// Present and visible
    Visible,
    /// Absent or not visible
    Hidden,
}

/// Options for a pointer click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOptions {
    /// Skip actionability checks (stable, receives events, enabled)
    pub force: bool,

    /// Override the driver's default action timeout
    pub timeout: Option<Duration>,
}

impl ClickOptions {
    /// Forced click.
    pub fn forced() -> Self {
        Self {
            force: true,
            timeout: None,
        }
    }

    /// Plain click with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            force: false,
            timeout: Some(timeout),
        }
    }
}

/// A lazily resolved element.
///
/// Each operation resolves the locator afresh, so a handle stays valid
/// across re-renders of the page.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// The locator this handle resolves.
    fn locator(&self) -> &Locator;

    /// Whether the element exists and is visible. Missing elements are not
    /// an error.
    async fn is_visible(&self) -> Result<bool>;

    /// Whether the element is disabled.
    async fn is_disabled(&self) -> Result<bool>;

    /// Whether the element is in its selected/pressed state.
    async fn is_selected(&self) -> Result<bool>;

    /// Pointer click.
    async fn click(&self, options: ClickOptions) -> Result<()>;

    /// Script-level click on the underlying node, without pointer checks.
    async fn dispatch_click(&self) -> Result<()>;

    /// Replace the element's value with `text`.
    async fn fill(&self, text: &str) -> Result<()>;

    /// Wait until the element reaches `state`, or fail with
    /// [`DriverError::Timeout`].
    async fn wait_for(&self, state: ElementState, timeout: Duration) -> Result<()>;
}

/// One rendered document: the top-level page, or a sub-document of it.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load a URL.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for a load milestone.
    async fn wait_for_load_state(&self, state: LoadState) -> Result<()>;

    /// URL of the top-level page.
    async fn current_url(&self) -> Result<String>;

    /// Handle for the element matching `locator`.
    fn find(&self, locator: Locator) -> Box<dyn ElementHandle + '_>;

    /// Driver scoped to the document embedded in `container` (an iframe).
    async fn embedded_document(&self, container: &Locator) -> Result<Box<dyn PageDriver + '_>>;

    /// Save a screenshot of the page. Diagnostic only.
    async fn screenshot(&self, path: &Path) -> Result<()>;
}

/// A browser session owned by one run.
#[async_trait]
pub trait Session: Send + Sync {
    /// The session's page.
    fn page(&self) -> &dyn PageDriver;

    /// Release the session. Called exactly once, on every exit path.
    async fn close(&self) -> Result<()>;
}

/// Opens sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Open a new session with a blank page.
    async fn open(&self) -> Result<Box<dyn Session>>;
}
