//! W3C WebDriver backend for the page driver traits.
//!
//! Talks JSON over HTTP to any WebDriver endpoint (chromedriver, a Selenium
//! grid, a hosted browser service) and exposes the resulting session as a
//! [`courtres_driver::PageDriver`].

#![warn(missing_docs)]

mod config;
mod page;
mod query;
mod session;
mod wire;

pub use config::WebDriverConfig;
pub use page::WebDriverPage;
pub use session::{WebDriverProvider, WebDriverSession};
