//! Cosmetic cursor overlay.
//!
//! An SVG injected over the page and eased between targets so the recording
//! shows where interactions land. The move is never a completion signal;
//! only predicate waits gate progression.

use std::time::Duration;

use serde_json::json;

use crate::engine::{EngineError, Locator, PointerOffset, UiEngine};

const INJECT_SCRIPT: &str = r#"
const [svg, easeMs] = arguments;
const container = document.createElement("div");
container.style.position = "fixed";
container.style.pointerEvents = "none";
container.innerHTML = svg;
document.body.appendChild(container);
const cursor = container.firstElementChild;
if (!cursor) {
    throw new Error("cursor asset has no root element");
}
cursor.id = "showreel-cursor";
cursor.style.strokeWidth = "2px";
cursor.style.position = "fixed";
cursor.style.pointerEvents = "none";
cursor.style.zIndex = "99999999";
cursor.style.width = "32px";
cursor.style.height = "32px";
cursor.style.left = "10px";
cursor.style.top = "10px";
cursor.style.transition = `left ${easeMs}ms ease-out, top ${easeMs}ms ease-out`;
"#;

const MOVE_SCRIPT: &str = r#"
const [selector, index, fx, fy] = arguments;
const cursor = document.getElementById("showreel-cursor");
if (!cursor) {
    throw new Error("cursor overlay not injected");
}
const target = document.querySelectorAll(selector)[index];
if (!target) {
    throw new Error(`cursor target not found: ${selector}`);
}
const box = target.getBoundingClientRect();
cursor.style.left = `${box.left + box.width * fx}px`;
cursor.style.top = `${box.top + box.height * fy}px`;
"#;

/// Inject the overlay. Done once, right after the page opens.
pub async fn inject(engine: &dyn UiEngine, svg: &str, ease: Duration) -> Result<(), EngineError> {
    engine
        .run_script(
            INJECT_SCRIPT,
            vec![json!(svg), json!(ease.as_millis() as u64)],
        )
        .await
        .map(drop)
}

/// Ease the overlay to `origin + size * offset` of the target's box, then
/// wait out the transition so the move is visible in the recording.
pub async fn move_to(
    engine: &dyn UiEngine,
    target: &Locator,
    at: PointerOffset,
    ease: Duration,
) -> Result<(), EngineError> {
    engine
        .run_script(
            MOVE_SCRIPT,
            vec![
                json!(target.css),
                json!(target.index),
                json!(at.x),
                json!(at.y),
            ],
        )
        .await?;
    tokio::time::sleep(ease).await;
    Ok(())
}
