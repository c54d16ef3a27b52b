//! State-wait primitives: polling conditions over observable UI state.
//!
//! None of these enforce a timeout of their own; the surrounding session
//! timeout is the backstop. The distinction between "condition false" and
//! "condition unevaluable" is preserved: probe errors propagate immediately
//! instead of being retried.

use std::future::Future;
use std::time::Duration;

use crate::engine::{EngineError, Locator, UiEngine};

/// Fixed interval between predicate evaluations.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Re-evaluate `probe` until it yields `Ok(true)`.
///
/// `Ok(false)` sleeps one poll interval and tries again; `Err` bubbles up at
/// once.
pub async fn poll_until<F, Fut>(mut probe: F) -> Result<(), EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, EngineError>>,
{
    loop {
        if probe().await? {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Resolve once the number of elements matching `css` equals `expected`.
///
/// Used to detect that initial content has fully loaded without racing on a
/// partial render.
pub async fn wait_for_count(
    engine: &dyn UiEngine,
    css: &str,
    expected: usize,
) -> Result<(), EngineError> {
    tracing::debug!(css, expected, "waiting for element count");
    poll_until(move || async move { Ok(engine.count(css).await? == expected) }).await
}

/// Resolve once the located control's disabled flag clears.
pub async fn wait_for_enabled(
    engine: &dyn UiEngine,
    locator: &Locator,
) -> Result<(), EngineError> {
    tracing::debug!(locator = %locator, "waiting for control to enable");
    poll_until(move || async move { engine.is_enabled(locator).await }).await
}
