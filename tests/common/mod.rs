#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use westie_crawler::config::CrawlSettings;
use westie_crawler::constants::{selectors, TILE_INDEX_ATTR};
use westie_crawler::driver::{Driver, DriverError, DriverResult, Locator, Rect, WebElement};
use westie_crawler::session::SessionCookie;
use westie_crawler::types::{EventProcessor, RelativePosition, TileIndex, TileOutcome};

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

/// Settings with timeouts short enough for tests.
pub fn fast_settings() -> CrawlSettings {
    CrawlSettings {
        section_probe_ms: 20,
        element_ms: 200,
        authentication_ms: 200,
        poll_ms: 1,
        scroll_settle_ms: 0,
        unknown_backoff_ms: 0,
        ..CrawlSettings::default()
    }
}

pub fn tile_html(title: &str, subtitle: &str, dates: &str, tag: &str) -> String {
    format!(
        r#"<div><div class="tile-inner">
            <div class="tile-image-area"></div>
            <div class="tile-overlay">
              <div class="tile-corner-container">
                <div class="top-left-content corner-content"><div data-test="app-tag-overlay">{tag}</div></div>
              </div>
              <div class="center-content corner-content"><div class="tile-text-container">
                <div class="tile-title">{title}</div>
                <div class="tile-subtitle">{subtitle}</div>
              </div></div>
              <div class="tile-corner-container">
                <div class="bottom-left-content corner-content">{dates}</div>
              </div>
            </div>
        </div></div>"#
    )
}

/// Viewport used by every fake listing: y from 100 to 700.
pub fn viewport_rect() -> Rect {
    Rect::new(0.0, 100.0, 400.0, 600.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Blank,
    LoginEmail,
    LoginPin,
    Home,
    Events,
    Lessons,
}

/// One event card of the fake listing.
#[derive(Debug, Clone)]
pub struct FakeTile {
    pub index_attr: Option<String>,
    pub rect: Rect,
    pub html: String,
    pub has_image_area: bool,
    /// `None` makes the capture fail.
    pub png: Option<Vec<u8>>,
}

impl FakeTile {
    pub fn new(index: TileIndex, y: f64) -> Self {
        Self {
            index_attr: Some(index.to_string()),
            rect: Rect::new(0.0, y, 400.0, 150.0),
            html: tile_html(
                &format!("Event {index}"),
                "Paris, France",
                "12-14 Janvier 2024",
                "",
            ),
            has_image_area: true,
            png: Some(PNG.to_vec()),
        }
    }

    pub fn with_html(mut self, html: String) -> Self {
        self.html = html;
        self
    }

    pub fn without_index(mut self) -> Self {
        self.index_attr = None;
        self
    }

    pub fn without_image_area(mut self) -> Self {
        self.has_image_area = false;
        self
    }

    pub fn failing_capture(mut self) -> Self {
        self.png = None;
        self
    }
}

#[derive(Debug)]
pub struct State {
    pub page: Page,
    /// Page shown once the PIN field goes away.
    pub after_pin: Page,
    /// Remaining lookups before the PIN field disappears; `None` keeps it forever.
    pub pin_polls: Option<u32>,
    pub typed: Vec<String>,
    /// Tiles per pass; the last entry is reused once scrolling goes further.
    pub listing: Vec<Vec<FakeTile>>,
    pub last_refs: Vec<String>,
    pub last_ref_reads: usize,
    /// Reading the trailing tile's text hits a detached element.
    pub last_ref_stale: bool,
    pub viewport_stale: bool,
    pub viewport_lookups: u32,
    pub favorite_toggles: usize,
    pub scripts: Vec<String>,
    pub scrolls: usize,
    pub cookies: Vec<SessionCookie>,
    pub navigations: Vec<String>,
    pub closes: u32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            page: Page::Blank,
            after_pin: Page::Home,
            pin_polls: Some(2),
            typed: Vec::new(),
            listing: Vec::new(),
            last_refs: vec!["A".to_string()],
            last_ref_reads: 0,
            last_ref_stale: false,
            viewport_stale: false,
            viewport_lookups: 0,
            favorite_toggles: 0,
            scripts: Vec::new(),
            scrolls: 0,
            cookies: Vec::new(),
            navigations: Vec::new(),
            closes: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum Role {
    Plain,
    EmailButton,
    EventsTile,
    Viewport,
    LastTile,
    Tile(FakeTile),
    ImageArea(Option<Vec<u8>>),
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    state: Arc<Mutex<State>>,
    role: Role,
    text: String,
}

impl FakeElement {
    fn new(state: &Arc<Mutex<State>>, role: Role) -> Self {
        Self {
            state: state.clone(),
            role,
            text: String::new(),
        }
    }

    /// A tile detached from any driver, for driving processors directly.
    pub fn tile(tile: FakeTile) -> Self {
        Self::new(&Arc::new(Mutex::new(State::default())), Role::Tile(tile))
    }

    fn boxed(self) -> Box<dyn WebElement> {
        Box::new(self)
    }
}

#[async_trait::async_trait]
impl WebElement for FakeElement {
    async fn rect(&self) -> DriverResult<Rect> {
        match &self.role {
            Role::Viewport => {
                let mut state = self.state.lock().unwrap();
                state.viewport_lookups += 1;
                if state.viewport_stale {
                    Err(DriverError::StaleElement("viewport".into()))
                } else {
                    Ok(viewport_rect())
                }
            }
            Role::Tile(tile) => Ok(tile.rect),
            _ => Ok(Rect::default()),
        }
    }

    async fn text(&self) -> DriverResult<String> {
        if matches!(self.role, Role::LastTile) && self.state.lock().unwrap().last_ref_stale {
            return Err(DriverError::StaleElement("last tile".into()));
        }
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        match &self.role {
            Role::Tile(tile) if name == TILE_INDEX_ATTR => Ok(tile.index_attr.clone()),
            _ => Ok(None),
        }
    }

    async fn outer_html(&self) -> DriverResult<String> {
        match &self.role {
            Role::Tile(tile) => Ok(tile.html.clone()),
            _ => Ok("<div></div>".to_string()),
        }
    }

    async fn is_displayed(&self) -> DriverResult<bool> {
        Ok(true)
    }

    async fn find_all(&self, locator: Locator) -> DriverResult<Vec<Box<dyn WebElement>>> {
        match &self.role {
            Role::Tile(tile) if locator == selectors::TILE_IMAGE && tile.has_image_area => {
                Ok(vec![FakeElement::new(&self.state, Role::ImageArea(tile.png.clone())).boxed()])
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        match &self.role {
            Role::ImageArea(Some(png)) => Ok(png.clone()),
            _ => Err(DriverError::Command("element screenshot failed".into())),
        }
    }

    async fn click(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        match self.role {
            Role::EmailButton => state.page = Page::LoginPin,
            Role::EventsTile => state.page = Page::Events,
            _ => {}
        }
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        self.state.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }

    fn script_handle(&self) -> Value {
        json!("fake-element")
    }
}

/// Scripted stand-in for a browser session on the application.
#[derive(Clone, Default)]
pub struct FakeDriver {
    pub state: Arc<Mutex<State>>,
}

impl FakeDriver {
    pub fn on(page: Page) -> Self {
        let driver = Self::default();
        driver.state.lock().unwrap().page = page;
        driver
    }

    /// Events page with a fixed listing and scripted last-tile texts.
    pub fn events(listing: Vec<Vec<FakeTile>>, last_refs: &[&str]) -> Self {
        let driver = Self::on(Page::Events);
        {
            let mut state = driver.state.lock().unwrap();
            state.listing = listing;
            state.last_refs = last_refs.iter().map(|s| s.to_string()).collect();
        }
        driver
    }

    pub fn with<F: FnOnce(&mut State)>(self, f: F) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn snapshot<T, F: FnOnce(&State) -> T>(&self, f: F) -> T {
        f(&self.state.lock().unwrap())
    }

    fn element(&self, role: Role) -> Box<dyn WebElement> {
        FakeElement::new(&self.state, role).boxed()
    }
}

#[async_trait::async_trait]
impl Driver for FakeDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn find_elements(&self, locator: Locator) -> DriverResult<Vec<Box<dyn WebElement>>> {
        let mut state = self.state.lock().unwrap();
        let page = state.page;
        let on = |p: Page| page == p;

        let found = if locator == selectors::HOME_PAGE && on(Page::Home) {
            vec![self.element(Role::Plain)]
        } else if locator == selectors::LOGIN_EMAIL_INPUT && on(Page::LoginEmail) {
            vec![self.element(Role::Plain)]
        } else if locator == selectors::LOGIN_EMAIL_BUTTON && on(Page::LoginEmail) {
            vec![self.element(Role::EmailButton)]
        } else if locator == selectors::LOGIN_PIN_INPUT && on(Page::LoginPin) {
            let polls = state.pin_polls;
            match polls {
                None => vec![self.element(Role::Plain)],
                Some(0) => {
                    state.page = state.after_pin;
                    Vec::new()
                }
                Some(n) => {
                    state.pin_polls = Some(n - 1);
                    vec![self.element(Role::Plain)]
                }
            }
        } else if locator == selectors::EVENTS_PAGE && on(Page::Events) {
            vec![self.element(Role::Plain)]
        } else if locator == selectors::LESSONS_PAGE && on(Page::Lessons) {
            vec![self.element(Role::Plain)]
        } else if locator == selectors::HOME_EVENTS_TILE && on(Page::Home) {
            vec![self.element(Role::EventsTile)]
        } else if locator == selectors::EVENT_TILES && on(Page::Events) {
            let pass = state.scrolls.min(state.listing.len().saturating_sub(1));
            state
                .listing
                .get(pass)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|tile| self.element(Role::Tile(tile)))
                .collect()
        } else if locator == selectors::LAST_EVENT_TILE && on(Page::Events) {
            if state.last_refs.is_empty() {
                Vec::new()
            } else {
                let read = state.last_ref_reads.min(state.last_refs.len() - 1);
                state.last_ref_reads += 1;
                let mut element = FakeElement::new(&self.state, Role::LastTile);
                element.text = state.last_refs[read].clone();
                vec![element.boxed()]
            }
        } else if locator == selectors::VIEWPORT && on(Page::Events) {
            vec![self.element(Role::Viewport)]
        } else if locator == selectors::LIST_CONTAINER && on(Page::Events) {
            vec![self.element(Role::Plain)]
        } else if locator == selectors::FAVORITE_TOGGLES && on(Page::Events) {
            (0..state.favorite_toggles)
                .map(|_| self.element(Role::Plain))
                .collect()
        } else {
            Vec::new()
        };
        Ok(found)
    }

    async fn run_script(&self, code: &str, _args: Vec<Value>) -> DriverResult<Value> {
        let mut state = self.state.lock().unwrap();
        if code.contains("scrollBy") {
            state.scrolls += 1;
        }
        state.scripts.push(code.to_string());
        Ok(Value::Null)
    }

    async fn cookies(&self) -> DriverResult<Vec<SessionCookie>> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn add_cookie(&self, cookie: SessionCookie) -> DriverResult<()> {
        self.state.lock().unwrap().cookies.push(cookie);
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Processor that records what it was asked to do.
#[derive(Default)]
pub struct RecordingProcessor {
    pub calls: Vec<(TileIndex, RelativePosition, bool)>,
    pub resets: usize,
    outcome: TileOutcome,
}

#[async_trait::async_trait]
impl EventProcessor for RecordingProcessor {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn process(
        &mut self,
        _tile: &dyn WebElement,
        position: RelativePosition,
        index: TileIndex,
        reset: bool,
    ) -> bool {
        if reset {
            self.reset_batch();
        }
        self.calls.push((index, position, reset));
        true
    }

    fn has_more(&self, position: RelativePosition) -> bool {
        !matches!(
            position,
            RelativePosition::Below | RelativePosition::OverlappingBottom
        )
    }

    fn reset_batch(&mut self) {
        self.resets += 1;
    }

    fn last_outcome(&self) -> &TileOutcome {
        &self.outcome
    }
}
