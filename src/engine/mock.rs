//! Mock engine for deterministic testing.
//!
//! Implements [`UiEngine`] against scripted observations instead of a live
//! browser: element counts and enabled flags are consumed from per-selector
//! sequences (the last value is sticky), actions are appended to a call log,
//! and any locator can be marked structurally absent to exercise the fatal
//! path.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::engine::{EngineError, Key, Locator, PointerOffset, UiEngine};

#[derive(Default)]
pub struct MockEngine {
    counts: Mutex<HashMap<String, VecDeque<usize>>>,
    enabled: Mutex<HashMap<String, VecDeque<bool>>>,
    structural: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the count observations for a selector. Each `count` call
    /// consumes one value; the final value repeats forever.
    pub fn with_counts(self, css: &str, sequence: Vec<usize>) -> Self {
        self.counts
            .lock()
            .insert(css.to_string(), sequence.into());
        self
    }

    /// Script the enabled observations for a locator, same consumption rules
    /// as [`with_counts`](Self::with_counts). Unscripted locators read as
    /// enabled.
    pub fn with_enabled(self, locator: &Locator, sequence: Vec<bool>) -> Self {
        self.enabled
            .lock()
            .insert(locator.to_string(), sequence.into());
        self
    }

    /// Mark a locator as structurally absent: any query or action against it
    /// fails with `EngineError::Structural`.
    pub fn with_structural(self, locator: &Locator) -> Self {
        self.structural.lock().insert(locator.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn check_structural(&self, locator: &Locator) -> Result<(), EngineError> {
        if self.structural.lock().contains(&locator.to_string()) {
            return Err(EngineError::Structural(locator.to_string()));
        }
        Ok(())
    }
}

fn next_in<T: Copy>(map: &mut HashMap<String, VecDeque<T>>, key: &str) -> Option<T> {
    let sequence = map.get_mut(key)?;
    if sequence.len() > 1 {
        sequence.pop_front()
    } else {
        sequence.front().copied()
    }
}

#[async_trait]
impl UiEngine for MockEngine {
    async fn open(&self, url: &str) -> Result<(), EngineError> {
        self.log(format!("open {url}"));
        Ok(())
    }

    async fn count(&self, css: &str) -> Result<usize, EngineError> {
        self.log(format!("count {css}"));
        Ok(next_in(&mut self.counts.lock(), css).unwrap_or(0))
    }

    async fn is_enabled(&self, locator: &Locator) -> Result<bool, EngineError> {
        self.check_structural(locator)?;
        self.log(format!("enabled? {locator}"));
        Ok(next_in(&mut self.enabled.lock(), &locator.to_string()).unwrap_or(true))
    }

    async fn click(&self, locator: &Locator, at: Option<PointerOffset>) -> Result<(), EngineError> {
        self.check_structural(locator)?;
        match at {
            Some(at) => self.log(format!("click {locator} at ({:.3}, {:.3})", at.x, at.y)),
            None => self.log(format!("click {locator}")),
        }
        Ok(())
    }

    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        _key_delay: Duration,
    ) -> Result<(), EngineError> {
        self.check_structural(locator)?;
        self.log(format!("type {locator} {text:?}"));
        Ok(())
    }

    async fn press_key(&self, locator: &Locator, key: Key) -> Result<(), EngineError> {
        self.check_structural(locator)?;
        self.log(format!("press {locator} {key:?}"));
        Ok(())
    }

    async fn run_script(
        &self,
        _script: &str,
        _args: Vec<Value>,
    ) -> Result<Value, EngineError> {
        self.log("script");
        Ok(Value::Null)
    }

    async fn drop_payload(
        &self,
        css: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), EngineError> {
        self.log(format!("drop {css} {file_name} ({} bytes)", bytes.len()));
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.closed.store(true, Ordering::SeqCst);
        self.log("close");
        Ok(())
    }
}
