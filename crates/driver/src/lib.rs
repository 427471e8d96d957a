//! Page driver abstraction
//!
//! The capability the reservation flow drives: navigation, semantic element
//! lookup, state checks and clicks against one rendered page. Transports
//! (WebDriver, CDP, an in-memory fake) implement these traits; the
//! orchestrator only ever sees them.

#![warn(missing_docs)]

pub mod r#trait;
pub mod locator;

#[cfg(feature = "fake")]
pub mod fake;

pub use r#trait::{
    ClickOptions, DriverError, ElementHandle, ElementState, LoadState, PageDriver, Result,
    Session, SessionProvider,
};
pub use locator::{Locator, Role};
