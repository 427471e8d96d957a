//! In-memory scripted page for tests.
//!
//! Elements are registered up front with their visibility, disabled and
//! selected state, optional click failures and click effects. Every driver
//! call is recorded so tests can assert on exactly what was touched.

use crate::locator::Locator;
use crate::r#trait::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Name of the top-level document.
pub const ROOT: &str = "";

const POLL: Duration = Duration::from_millis(50);

/// How a click was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// Pointer click with `force`
    Forced,
    /// Pointer click without `force`
    Plain,
    /// Script-level click
    Dispatched,
}

/// Something a click changes on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Top-level URL changes
    Navigate(String),
    /// Element in `doc` becomes present and visible
    Show {
        /// Document name
        doc: String,
        /// Element
        locator: Locator,
    },
    /// Element in `doc` becomes hidden
    Hide {
        /// Document name
        doc: String,
        /// Element
        locator: Locator,
    },
}

impl Effect {
    /// Show an element of the top-level document.
    pub fn show(locator: Locator) -> Self {
        Effect::Show {
            doc: ROOT.to_string(),
            locator,
        }
    }

    /// Hide an element of the top-level document.
    pub fn hide(locator: Locator) -> Self {
        Effect::Hide {
            doc: ROOT.to_string(),
            locator,
        }
    }
}

/// Scripted element state.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    /// Visible when present
    pub visible: bool,
    /// Disabled
    pub disabled: bool,
    /// Selected/pressed
    pub selected: bool,
    /// Click kinds that raise
    pub failing: Vec<ClickKind>,
    /// Applied after every successful click
    pub on_click: Vec<Effect>,
}

impl FakeElement {
    /// Present and visible.
    pub fn visible() -> Self {
        Self {
            visible: true,
            ..Default::default()
        }
    }

    /// Present but not visible.
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Mark disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Mark selected.
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Make clicks of this kind raise.
    pub fn failing(mut self, kind: ClickKind) -> Self {
        self.failing.push(kind);
        self
    }

    /// Add a click effect.
    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click.push(effect);
        self
    }
}

/// A recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `navigate`
    Navigate(String),
    /// `wait_for_load_state`
    WaitForLoadState(LoadState),
    /// `is_visible`
    IsVisible(Locator),
    /// `is_disabled`
    IsDisabled(Locator),
    /// `is_selected`
    IsSelected(Locator),
    /// any click
    Click(Locator, ClickKind),
    /// `fill`
    Fill(Locator, String),
    /// `wait_for`
    WaitFor(Locator, ElementState),
    /// `embedded_document`
    EnterFrame(Locator),
    /// `screenshot`
    Screenshot(PathBuf),
}

impl Call {
    /// Locator the call acted on, if any.
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            Call::IsVisible(l)
            | Call::IsDisabled(l)
            | Call::IsSelected(l)
            | Call::Click(l, _)
            | Call::Fill(l, _)
            | Call::WaitFor(l, _)
            | Call::EnterFrame(l) => Some(l),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    url: String,
    docs: HashMap<String, HashMap<Locator, FakeElement>>,
    frames: HashMap<(String, Locator), String>,
    calls: Vec<(String, Call)>,
    closed: usize,
    load_delay: Duration,
}

/// Scripted page. Clones share state.
#[derive(Debug, Clone)]
pub struct FakePage {
    state: Arc<Mutex<State>>,
    doc: String,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    /// Empty page at `about:blank`.
    pub fn new() -> Self {
        let mut state = State {
            url: "about:blank".to_string(),
            ..Default::default()
        };
        state.docs.insert(ROOT.to_string(), HashMap::new());
        Self {
            state: Arc::new(Mutex::new(state)),
            doc: ROOT.to_string(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register an element in this document.
    pub fn add(&self, locator: Locator, element: FakeElement) -> &Self {
        self.lock()
            .docs
            .entry(self.doc.clone())
            .or_default()
            .insert(locator, element);
        self
    }

    /// Remove an element from this document.
    pub fn remove(&self, locator: &Locator) {
        if let Some(doc) = self.lock().docs.get_mut(&self.doc) {
            doc.remove(locator);
        }
    }

    /// Register a sub-document named `name` reachable through `container`,
    /// and return a handle for populating it. The container itself becomes
    /// a visible element of this document.
    pub fn add_frame(&self, container: Locator, name: &str) -> FakePage {
        let mut state = self.lock();
        state.docs.entry(name.to_string()).or_default();
        state
            .docs
            .entry(self.doc.clone())
            .or_default()
            .entry(container.clone())
            .or_insert_with(FakeElement::visible);
        state.frames.insert((self.doc.clone(), container), name.to_string());
        FakePage {
            state: self.state.clone(),
            doc: name.to_string(),
        }
    }

    /// Detach the sub-document behind `container`. Its contents are kept,
    /// so a later [`add_frame`](Self::add_frame) with the same name brings
    /// it back as it was.
    pub fn remove_frame(&self, container: &Locator) {
        let mut state = self.lock();
        state.frames.remove(&(self.doc.clone(), container.clone()));
        if let Some(doc) = state.docs.get_mut(&self.doc) {
            doc.remove(container);
        }
    }

    /// Make every `wait_for_load_state` take `delay`.
    pub fn set_load_delay(&self, delay: Duration) {
        self.lock().load_delay = delay;
    }

    /// Set the top-level URL.
    pub fn set_url(&self, url: &str) {
        self.lock().url = url.to_string();
    }

    /// Current top-level URL.
    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    /// All recorded calls with the document they were issued against.
    pub fn calls(&self) -> Vec<(String, Call)> {
        self.lock().calls.clone()
    }

    /// Clicks issued on `locator`, in any document.
    pub fn clicks(&self, locator: &Locator) -> Vec<ClickKind> {
        self.lock()
            .calls
            .iter()
            .filter_map(|(_, call)| match call {
                Call::Click(l, kind) if l == locator => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Clicks issued on `locator` in document `doc`.
    pub fn clicks_in(&self, doc: &str, locator: &Locator) -> Vec<ClickKind> {
        self.lock()
            .calls
            .iter()
            .filter_map(|(d, call)| match call {
                Call::Click(l, kind) if l == locator && d == doc => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Whether any call touched `locator`.
    pub fn touched(&self, locator: &Locator) -> bool {
        self.lock()
            .calls
            .iter()
            .any(|(_, call)| call.locator() == Some(locator))
    }

    /// How many times a session wrapping this page was closed.
    pub fn close_count(&self) -> usize {
        self.lock().closed
    }

    fn record(&self, call: Call) {
        let doc = self.doc.clone();
        self.lock().calls.push((doc, call));
    }

    fn element(&self, locator: &Locator) -> Option<FakeElement> {
        self.lock()
            .docs
            .get(&self.doc)
            .and_then(|doc| doc.get(locator))
            .cloned()
    }

    fn apply(&self, effects: &[Effect]) {
        let mut state = self.lock();
        for effect in effects {
            match effect {
                Effect::Navigate(url) => state.url = url.clone(),
                Effect::Show { doc, locator } => {
                    let element = state
                        .docs
                        .entry(doc.clone())
                        .or_default()
                        .entry(locator.clone())
                        .or_default();
                    element.visible = true;
                }
                Effect::Hide { doc, locator } => {
                    if let Some(element) = state.docs.get_mut(doc).and_then(|d| d.get_mut(locator)) {
                        element.visible = false;
                    }
                }
            }
        }
    }

    fn matches(&self, locator: &Locator, state: ElementState) -> bool {
        let element = self.element(locator);
        match state {
            ElementState::Attached => element.is_some(),
            ElementState::Detached => element.is_none(),
            ElementState::Visible => element.map(|e| e.visible).unwrap_or(false),
            ElementState::Hidden => !element.map(|e| e.visible).unwrap_or(false),
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(Call::Navigate(url.to_string()));
        self.set_url(url);
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState) -> Result<()> {
        self.record(Call::WaitForLoadState(state));
        let delay = self.lock().load_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url())
    }

    fn find(&self, locator: Locator) -> Box<dyn ElementHandle + '_> {
        Box::new(FakeHandle {
            page: self,
            locator,
        })
    }

    async fn embedded_document(&self, container: &Locator) -> Result<Box<dyn PageDriver + '_>> {
        self.record(Call::EnterFrame(container.clone()));
        let name = self
            .lock()
            .frames
            .get(&(self.doc.clone(), container.clone()))
            .cloned()
            .ok_or_else(|| DriverError::NotFound(container.to_string()))?;

        Ok(Box::new(FakePage {
            state: self.state.clone(),
            doc: name,
        }))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(Call::Screenshot(path.to_path_buf()));
        Ok(())
    }
}

struct FakeHandle<'a> {
    page: &'a FakePage,
    locator: Locator,
}

impl FakeHandle<'_> {
    fn click_as(&self, kind: ClickKind) -> Result<()> {
        self.page.record(Call::Click(self.locator.clone(), kind));

        let element = self
            .page
            .element(&self.locator)
            .ok_or_else(|| DriverError::NotFound(self.locator.to_string()))?;

        if element.failing.contains(&kind) {
            return Err(DriverError::NotInteractable {
                locator: self.locator.to_string(),
                reason: format!("scripted {kind:?} failure"),
            });
        }

        self.page.apply(&element.on_click);
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for FakeHandle<'_> {
    fn locator(&self) -> &Locator {
        &self.locator
    }

    async fn is_visible(&self) -> Result<bool> {
        self.page.record(Call::IsVisible(self.locator.clone()));
        Ok(self.page.matches(&self.locator, ElementState::Visible))
    }

    async fn is_disabled(&self) -> Result<bool> {
        self.page.record(Call::IsDisabled(self.locator.clone()));
        self.page
            .element(&self.locator)
            .map(|e| e.disabled)
            .ok_or_else(|| DriverError::NotFound(self.locator.to_string()))
    }

    async fn is_selected(&self) -> Result<bool> {
        self.page.record(Call::IsSelected(self.locator.clone()));
        self.page
            .element(&self.locator)
            .map(|e| e.selected)
            .ok_or_else(|| DriverError::NotFound(self.locator.to_string()))
    }

    async fn click(&self, options: ClickOptions) -> Result<()> {
        self.click_as(if options.force {
            ClickKind::Forced
        } else {
            ClickKind::Plain
        })
    }

    async fn dispatch_click(&self) -> Result<()> {
        self.click_as(ClickKind::Dispatched)
    }

    async fn fill(&self, text: &str) -> Result<()> {
        self.page.record(Call::Fill(self.locator.clone(), text.to_string()));
        self.page
            .element(&self.locator)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound(self.locator.to_string()))
    }

    async fn wait_for(&self, state: ElementState, timeout: Duration) -> Result<()> {
        self.page.record(Call::WaitFor(self.locator.clone(), state));
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.matches(&self.locator, state) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    what: format!("{} to be {:?}", self.locator, state),
                    timeout,
                });
            }
            tokio::time::sleep(POLL).await;
        }
    }
}

/// Session over a [`FakePage`] that counts closes.
#[derive(Debug, Clone)]
pub struct FakeSession {
    page: FakePage,
}

impl FakeSession {
    /// Wrap a page.
    pub fn new(page: FakePage) -> Self {
        Self { page }
    }
}

#[async_trait]
impl Session for FakeSession {
    fn page(&self) -> &dyn PageDriver {
        &self.page
    }

    async fn close(&self) -> Result<()> {
        self.page.lock().closed += 1;
        Ok(())
    }
}

/// Provider handing out sessions over one shared [`FakePage`].
#[derive(Debug, Clone)]
pub struct FakeProvider {
    page: FakePage,
}

impl FakeProvider {
    /// Provider for `page`.
    pub fn new(page: FakePage) -> Self {
        Self { page }
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn open(&self) -> Result<Box<dyn Session>> {
        Ok(Box::new(FakeSession::new(self.page.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_element_is_not_visible() {
        let page = FakePage::new();
        let handle = page.find(Locator::button("Ghost"));
        assert!(!handle.is_visible().await.unwrap());
        assert!(handle.is_disabled().await.is_err());
    }

    #[tokio::test]
    async fn test_click_effects_and_failures() {
        let page = FakePage::new();
        let notice = Locator::text("no longer available");
        page.add(
            Locator::button("A"),
            FakeElement::visible()
                .failing(ClickKind::Forced)
                .on_click(Effect::show(notice.clone())),
        );

        let a = page.find(Locator::button("A"));
        assert!(a.click(ClickOptions::forced()).await.is_err());
        assert!(!page.find(notice.clone()).is_visible().await.unwrap());

        a.dispatch_click().await.unwrap();
        assert!(page.find(notice).is_visible().await.unwrap());
        assert_eq!(
            page.clicks(&Locator::button("A")),
            vec![ClickKind::Forced, ClickKind::Dispatched]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let page = FakePage::new();
        let err = page
            .find(Locator::text("Never"))
            .wait_for(ElementState::Visible, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_frames_share_url() {
        let page = FakePage::new();
        let frame = page.add_frame(Locator::css("iframe"), "confirm");
        frame.add(
            Locator::button("Yes"),
            FakeElement::visible().on_click(Effect::Navigate("https://x/reservations".into())),
        );

        let inner = page.embedded_document(&Locator::css("iframe")).await.unwrap();
        inner
            .find(Locator::button("Yes"))
            .click(ClickOptions::default())
            .await
            .unwrap();

        assert_eq!(page.url(), "https://x/reservations");
        assert_eq!(page.clicks_in("confirm", &Locator::button("Yes")).len(), 1);
        assert!(page.clicks_in(ROOT, &Locator::button("Yes")).is_empty());
    }

    #[tokio::test]
    async fn test_removed_frame_comes_back_with_contents() {
        let page = FakePage::new();
        let container = Locator::css("iframe");
        page.add_frame(container.clone(), "login")
            .add(Locator::button("Sign in"), FakeElement::visible());
        assert!(page.find(container.clone()).is_visible().await.unwrap());

        page.remove_frame(&container);
        assert!(page.embedded_document(&container).await.is_err());
        assert!(!page.find(container.clone()).is_visible().await.unwrap());

        page.add_frame(container.clone(), "login");
        let inner = page.embedded_document(&container).await.unwrap();
        assert!(inner.find(Locator::button("Sign in")).is_visible().await.unwrap());
    }
}
