//! Seam to the UI-automation engine driving the target application.
//!
//! The sequencer never talks to a browser directly; it holds a `dyn UiEngine`
//! and everything engine-specific (wire protocol, element handles) stays
//! behind this trait. `WebDriverEngine` is the real implementation,
//! `MockEngine` a scripted one for tests.

pub mod mock;
pub mod webdriver;

pub use mock::MockEngine;
pub use webdriver::WebDriverEngine;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures surfaced by an engine implementation.
///
/// `Structural` is the load-bearing variant: it means a required element or
/// control is absent, which is a different thing from a predicate evaluating
/// to `false`. Waiters retry on `Ok(false)` and abort on `Structural`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("required element not present: {0}")]
    Structural(String),
    #[error("webdriver transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected webdriver response: {0}")]
    Protocol(String),
    #[error("page script failed: {0}")]
    Script(String),
}

/// CSS locator plus an index into the list of matching elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub css: String,
    pub index: usize,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            css: selector.into(),
            index: 0,
        }
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.css, self.index)
    }
}

/// Pointer destination as fractions of a target's bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerOffset {
    pub x: f64,
    pub y: f64,
}

impl PointerOffset {
    pub const CENTER: PointerOffset = PointerOffset { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Keys the sequencer can press on a focused element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
}

impl Key {
    /// W3C WebDriver key codepoint.
    pub fn wire_code(&self) -> &'static str {
        match self {
            Key::Enter => "\u{E007}",
        }
    }
}

/// One live automation session against the target application.
///
/// The recording artifact is a side effect of the session (capture is
/// configured where the session is launched); this trait only observes and
/// drives the UI.
#[async_trait]
pub trait UiEngine: Send + Sync {
    /// Navigate the session to the target URL.
    async fn open(&self, url: &str) -> Result<(), EngineError>;

    /// Number of elements currently matching `css`. Zero matches is a valid
    /// observation, not an error.
    async fn count(&self, css: &str) -> Result<usize, EngineError>;

    /// Whether the located control is enabled. A locator that matches nothing
    /// yields `EngineError::Structural`, never `Ok(false)`.
    async fn is_enabled(&self, locator: &Locator) -> Result<bool, EngineError>;

    /// Click the located element, optionally at a fractional position within
    /// its bounding box instead of its center.
    async fn click(&self, locator: &Locator, at: Option<PointerOffset>) -> Result<(), EngineError>;

    /// Type `text` into the located element one character at a time, pausing
    /// `key_delay` between keystrokes.
    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        key_delay: Duration,
    ) -> Result<(), EngineError>;

    /// Press a single key on the located element.
    async fn press_key(&self, locator: &Locator, key: Key) -> Result<(), EngineError>;

    /// Execute a synchronous script in the page and return its value.
    async fn run_script(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, EngineError>;

    /// Dispatch a file-drop of an opaque payload onto the first element
    /// matching `css`. The bytes pass through untouched.
    async fn drop_payload(
        &self,
        css: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), EngineError>;

    /// Tear the session down. Called on every exit path.
    async fn close(&self) -> Result<(), EngineError>;
}
