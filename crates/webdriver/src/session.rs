//! Session lifecycle.

use crate::config::WebDriverConfig;
use crate::page::WebDriverPage;
use crate::wire::Wire;
use async_trait::async_trait;
use courtres_driver::{DriverError, PageDriver, Result, Session, SessionProvider};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Opens WebDriver sessions.
#[derive(Debug, Clone)]
pub struct WebDriverProvider {
    config: WebDriverConfig,
}

impl WebDriverProvider {
    /// Provider for the given endpoint and browser settings.
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }

    /// Endpoint settings.
    pub fn config(&self) -> &WebDriverConfig {
        &self.config
    }
}

#[async_trait]
impl SessionProvider for WebDriverProvider {
    async fn open(&self) -> Result<Box<dyn Session>> {
        let wire = Wire::new(&self.config.url, self.config.connect_timeout)?;
        info!(url = %self.config.url, headless = self.config.headless, "Opening browser session");

        let created = wire.post("session", self.config.capabilities()).await?;
        let id = created
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Protocol("session response without sessionId".to_string()))?
            .to_string();

        let session_wire = wire.scoped(&format!("session/{id}"));
        session_wire
            .post(
                "timeouts",
                json!({
                    "implicit": 0,
                    "pageLoad": self.config.load_timeout.as_millis() as u64,
                    "script": self.config.action_timeout.as_millis() as u64,
                }),
            )
            .await?;

        info!(session = %id, "Browser session ready");
        Ok(Box::new(WebDriverSession {
            id,
            page: WebDriverPage::root(session_wire, self.config.clone()),
            closed: AtomicBool::new(false),
        }))
    }
}

/// An open WebDriver session.
pub struct WebDriverSession {
    id: String,
    page: WebDriverPage,
    closed: AtomicBool,
}

impl WebDriverSession {
    /// Remote session id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl Session for WebDriverSession {
    fn page(&self) -> &dyn PageDriver {
        &self.page
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(session = %self.id, "Closing browser session");
        match self.page.wire().delete("").await {
            Ok(_) | Err(DriverError::SessionClosed) => Ok(()),
            Err(e) => {
                warn!(session = %self.id, error = %e, "Failed to close browser session");
                Err(e)
            }
        }
    }
}
