//! Browser automation boundary.
//!
//! The crawl core only talks to the live document through [`Driver`] and
//! [`WebElement`]. [`webdriver::FantocciniDriver`] backs them with a W3C
//! WebDriver session; tests provide scripted fakes.

pub mod webdriver;
pub mod wait;

use crate::session::SessionCookie;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by the automation layer.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The handle was detached or replaced by a DOM mutation.
    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("element not found: {0}")]
    NoSuchElement(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("WebDriver command failed: {0}")]
    Command(String),

    #[error("WebDriver session error: {0}")]
    Session(String),
}

impl DriverError {
    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleElement(_))
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Element lookup strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(&'static str),
    Css(&'static str),
}

impl Locator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locator::XPath(s) | Locator::Css(s) => s,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::XPath(s) => write!(f, "xpath `{s}`"),
            Locator::Css(s) => write!(f, "css `{s}`"),
        }
    }
}

/// Bounding box of an element in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Handle to one element of the live document.
#[async_trait::async_trait]
pub trait WebElement: Send + Sync {
    async fn rect(&self) -> DriverResult<Rect>;

    /// Rendered text of the element.
    async fn text(&self) -> DriverResult<String>;

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>>;

    async fn outer_html(&self) -> DriverResult<String>;

    async fn is_displayed(&self) -> DriverResult<bool>;

    /// Descendants matching `locator`, relative to this element.
    async fn find_all(&self, locator: Locator) -> DriverResult<Vec<Box<dyn WebElement>>>;

    /// PNG capture of the element's on-screen area.
    async fn screenshot(&self) -> DriverResult<Vec<u8>>;

    async fn click(&self) -> DriverResult<()>;

    async fn send_keys(&self, text: &str) -> DriverResult<()>;

    /// Reference passed to [`Driver::run_script`] as an argument.
    fn script_handle(&self) -> Value;
}

/// Capability set of the browser session.
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    async fn find_elements(&self, locator: Locator) -> DriverResult<Vec<Box<dyn WebElement>>>;

    async fn run_script(&self, code: &str, args: Vec<Value>) -> DriverResult<Value>;

    async fn cookies(&self) -> DriverResult<Vec<SessionCookie>>;

    async fn add_cookie(&self, cookie: SessionCookie) -> DriverResult<()>;

    /// Ends the browser session.
    async fn close(&self) -> DriverResult<()>;
}
