//! Page and element handles over a WebDriver session.

use crate::config::WebDriverConfig;
use crate::query::Query;
use crate::wire::{element_arg, element_ref, Wire};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use courtres_driver::{
    ClickOptions, DriverError, ElementHandle, ElementState, LoadState, Locator, PageDriver, Result,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, Instant};
use tracing::debug;

const POLL: Duration = Duration::from_millis(100);

/// Quiet window after which the network counts as idle.
const IDLE_WINDOW: Duration = Duration::from_millis(500);

const IS_DISABLED: &str = "const e = arguments[0]; \
    return !!(e.disabled || e.getAttribute('aria-disabled') === 'true' || e.classList.contains('disabled'));";

const IS_SELECTED: &str = "const e = arguments[0]; \
    return e.classList.contains(arguments[1]) || e.getAttribute('aria-pressed') === 'true' \
    || e.getAttribute('aria-selected') === 'true';";

const READY_STATE: &str = "return [document.readyState, performance.getEntriesByType('resource').length];";

/// Frame path the remote session is currently switched to. `None` when a
/// switch failed half way and the position is unknown.
type Scope = Option<Vec<Locator>>;

struct Inner {
    wire: Wire,
    config: WebDriverConfig,
    scope: Mutex<Scope>,
}

/// A document inside a WebDriver session: the top-level page, or an
/// iframe reached through a chain of container locators.
#[derive(Clone)]
pub struct WebDriverPage {
    inner: Arc<Inner>,
    frames: Vec<Locator>,
}

impl WebDriverPage {
    pub(crate) fn root(wire: Wire, config: WebDriverConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                wire,
                config,
                scope: Mutex::new(Some(Vec::new())),
            }),
            frames: Vec::new(),
        }
    }

    pub(crate) fn wire(&self) -> &Wire {
        &self.inner.wire
    }

    /// Switch the session into this document and keep it there while the
    /// returned guard lives.
    async fn enter(&self) -> Result<MutexGuard<'_, Scope>> {
        let mut scope = self.inner.scope.lock().await;
        if scope.as_ref() == Some(&self.frames) {
            return Ok(scope);
        }

        *scope = None;
        self.wire().post("frame", json!({ "id": Value::Null })).await?;
        let mut reached = Vec::new();
        for container in &self.frames {
            let frame = self
                .resolve(container)
                .await?
                .ok_or_else(|| DriverError::NotFound(container.to_string()))?;
            self.wire().post("frame", json!({ "id": element_arg(&frame) })).await?;
            reached.push(container.clone());
        }
        *scope = Some(reached);
        Ok(scope)
    }

    /// Element reference for `locator` in the current document, if any.
    async fn resolve(&self, locator: &Locator) -> Result<Option<String>> {
        let query = Query::from_locator(locator);
        let found = self
            .wire()
            .post("elements", json!({ "using": query.using, "value": query.value }))
            .await?;
        Ok(found
            .as_array()
            .and_then(|all| all.get(query.index))
            .and_then(element_ref))
    }

    async fn script(&self, body: &str, args: Vec<Value>) -> Result<Value> {
        self.wire()
            .post("execute/sync", json!({ "script": body, "args": args }))
            .await
    }
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut scope = self.inner.scope.lock().await;
        *scope = None;
        self.wire().post("url", json!({ "url": url })).await?;
        *scope = Some(Vec::new());
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState) -> Result<()> {
        let _scope = self.enter().await?;
        let timeout = self.inner.config.load_timeout;
        let deadline = Instant::now() + timeout;
        let mut last_count = None;
        let mut quiet_since = Instant::now();

        loop {
            let readiness = self.script(READY_STATE, Vec::new()).await?;
            let ready = readiness.get(0usize).and_then(Value::as_str).unwrap_or("loading");
            let count = readiness.get(1usize).and_then(Value::as_u64).unwrap_or(0);

            let done = match state {
                LoadState::DomContentLoaded => ready != "loading",
                LoadState::Load => ready == "complete",
                LoadState::NetworkIdle => {
                    if last_count != Some(count) {
                        last_count = Some(count);
                        quiet_since = Instant::now();
                    }
                    ready == "complete" && quiet_since.elapsed() >= IDLE_WINDOW
                }
            };
            if done {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what: format!("load state {state:?}"),
                    timeout,
                });
            }
            sleep(POLL).await;
        }
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.wire().get("url").await?;
        url.as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Protocol("current url is not a string".to_string()))
    }

    fn find(&self, locator: Locator) -> Box<dyn ElementHandle + '_> {
        Box::new(WebDriverElement {
            page: self,
            locator,
        })
    }

    async fn embedded_document(&self, container: &Locator) -> Result<Box<dyn PageDriver + '_>> {
        {
            let _scope = self.enter().await?;
            if self.resolve(container).await?.is_none() {
                return Err(DriverError::NotFound(container.to_string()));
            }
        }

        let mut frames = self.frames.clone();
        frames.push(container.clone());
        Ok(Box::new(WebDriverPage {
            inner: self.inner.clone(),
            frames,
        }))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let encoded = self.wire().get("screenshot").await?;
        let bytes = BASE64
            .decode(encoded.as_str().unwrap_or_default())
            .map_err(|e| DriverError::Protocol(format!("bad screenshot payload: {e}")))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| DriverError::Transport(format!("writing {}: {e}", path.display())))
    }
}

struct WebDriverElement<'a> {
    page: &'a WebDriverPage,
    locator: Locator,
}

impl WebDriverElement<'_> {
    async fn require(&self) -> Result<String> {
        self.page
            .resolve(&self.locator)
            .await?
            .ok_or_else(|| DriverError::NotFound(self.locator.to_string()))
    }

    async fn displayed(&self, reference: &str) -> Result<bool> {
        match self.page.wire().get(&format!("element/{reference}/displayed")).await {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            Err(DriverError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn disabled(&self, reference: &str) -> Result<bool> {
        let value = self.page.script(IS_DISABLED, vec![element_arg(reference)]).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn in_state(&self, state: ElementState) -> Result<bool> {
        let reference = self.page.resolve(&self.locator).await?;
        Ok(match (state, reference) {
            (ElementState::Attached, found) => found.is_some(),
            (ElementState::Detached, found) => found.is_none(),
            (ElementState::Visible, Some(r)) => self.displayed(&r).await?,
            (ElementState::Visible, None) => false,
            (ElementState::Hidden, Some(r)) => !self.displayed(&r).await?,
            (ElementState::Hidden, None) => true,
        })
    }

    fn tag(&self, error: DriverError) -> DriverError {
        match error {
            DriverError::NotInteractable { reason, .. } => DriverError::NotInteractable {
                locator: self.locator.to_string(),
                reason,
            },
            other => other,
        }
    }
}

#[async_trait]
impl ElementHandle for WebDriverElement<'_> {
    fn locator(&self) -> &Locator {
        &self.locator
    }

    async fn is_visible(&self) -> Result<bool> {
        let _scope = self.page.enter().await?;
        match self.page.resolve(&self.locator).await? {
            Some(reference) => self.displayed(&reference).await,
            None => Ok(false),
        }
    }

    async fn is_disabled(&self) -> Result<bool> {
        let _scope = self.page.enter().await?;
        let reference = self.require().await?;
        self.disabled(&reference).await
    }

    async fn is_selected(&self) -> Result<bool> {
        let _scope = self.page.enter().await?;
        let reference = self.require().await?;
        let class = Value::String(self.page.inner.config.selected_class.clone());
        let value = self
            .page
            .script(IS_SELECTED, vec![element_arg(&reference), class])
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, options: ClickOptions) -> Result<()> {
        let _scope = self.page.enter().await?;

        if options.force {
            let reference = self.require().await?;
            self.page
                .script(
                    "arguments[0].scrollIntoView({block: 'center'});",
                    vec![element_arg(&reference)],
                )
                .await?;
            return self
                .page
                .wire()
                .post(&format!("element/{reference}/click"), json!({}))
                .await
                .map(|_| ())
                .map_err(|e| self.tag(e));
        }

        let timeout = options.timeout.unwrap_or(self.page.inner.config.action_timeout);
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(reference) = self.page.resolve(&self.locator).await? {
                if self.displayed(&reference).await? && !self.disabled(&reference).await? {
                    match self
                        .page
                        .wire()
                        .post(&format!("element/{reference}/click"), json!({}))
                        .await
                    {
                        Ok(_) => return Ok(()),
                        Err(DriverError::NotFound(_)) | Err(DriverError::NotInteractable { .. }) => {
                            debug!(locator = %self.locator, "click not accepted yet, retrying");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what: format!("{} to be clickable", self.locator),
                    timeout,
                });
            }
            sleep(POLL).await;
        }
    }

    async fn dispatch_click(&self) -> Result<()> {
        let _scope = self.page.enter().await?;
        let reference = self.require().await?;
        self.page
            .script("arguments[0].click();", vec![element_arg(&reference)])
            .await
            .map(|_| ())
    }

    async fn fill(&self, text: &str) -> Result<()> {
        let _scope = self.page.enter().await?;
        let reference = self.require().await?;
        self.page
            .wire()
            .post(&format!("element/{reference}/clear"), json!({}))
            .await
            .map_err(|e| self.tag(e))?;
        self.page
            .wire()
            .post(&format!("element/{reference}/value"), json!({ "text": text }))
            .await
            .map(|_| ())
            .map_err(|e| self.tag(e))
    }

    async fn wait_for(&self, state: ElementState, timeout: Duration) -> Result<()> {
        let _scope = self.page.enter().await?;
        let deadline = Instant::now() + timeout;
        loop {
            if self.in_state(state).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what: format!("{} to be {:?}", self.locator, state),
                    timeout,
                });
            }
            sleep(POLL).await;
        }
    }
}
