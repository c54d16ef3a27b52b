//! Declarative interaction script: scenes and steps as data.
//!
//! A scenario is an ordered list of scenes, each an ordered list of steps.
//! Steps are immutable descriptors interpreted by the executor; they run
//! strictly in sequence and are never retried or reordered. A step may move
//! the cosmetic cursor, perform one action, await one post-condition, mark an
//! anchor or beat, and pause for a settle delay, in that order.

use std::time::Duration;

use crate::engine::{Key, Locator, PointerOffset};
use crate::util::math::unlerp;

/// Axis along which a continuous control extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Numeric domain of a continuous control; `from` maps to fraction 0 and `to`
/// to fraction 1, regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub from: f64,
    pub to: f64,
}

impl ValueRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    /// Fractional position of a domain value within this range.
    pub fn fraction_of(&self, value: f64) -> f64 {
        unlerp(self.from, self.to, value)
    }
}

/// One dispatchable interaction.
#[derive(Debug, Clone)]
pub enum Action {
    Click {
        target: Locator,
        at: Option<PointerOffset>,
    },
    Type {
        target: Locator,
        text: String,
    },
    Press {
        target: Locator,
        key: Key,
    },
    /// Positional click at the fraction of the control's extent that
    /// corresponds to `value` within `range`.
    Slide {
        target: Locator,
        axis: Axis,
        range: ValueRange,
        value: f64,
    },
    /// File-drop of an opaque payload onto a drop zone.
    DropFile {
        target_css: String,
        file_name: String,
        payload: Vec<u8>,
    },
    /// Named page script (window-title rewrite, scroll reset, ...).
    Script {
        name: String,
        source: String,
        args: Vec<serde_json::Value>,
    },
}

/// Post-condition a step awaits before the scene may continue.
#[derive(Debug, Clone)]
pub enum Wait {
    /// The number of elements matching `css` equals `expected`.
    Count { css: String, expected: usize },
    /// The located control's disabled flag has cleared.
    Enabled(Locator),
}

/// Fixed pause letting UI transitions finish before the next step.
#[derive(Debug, Clone, Copy)]
pub enum Settle {
    /// After synthesized keyboard input.
    Keyboard,
    /// After a click or slider adjustment.
    Action,
    /// After finishing one cell of the narrative.
    Cell,
    /// Explicit window, for anchors and tails.
    For(Duration),
}

/// Timestamp capture on step completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// The content-loaded anchor; must occur exactly once.
    Loaded,
    /// A recordable beat appended to the event-time sequence.
    Beat,
}

/// Eased cosmetic cursor move. Purely for recording legibility; never a
/// completion signal.
#[derive(Debug, Clone)]
pub struct CursorMove {
    pub target: Locator,
    pub at: PointerOffset,
}

/// One atomic scripted unit.
#[derive(Debug, Clone, Default)]
pub struct Step {
    pub cursor: Option<CursorMove>,
    pub action: Option<Action>,
    pub wait: Option<Wait>,
    pub mark: Option<Mark>,
    pub settle: Option<Settle>,
}

impl Step {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_cursor(mut self, target: Locator, at: PointerOffset) -> Self {
        self.cursor = Some(CursorMove { target, at });
        self
    }

    pub fn act(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn wait(mut self, wait: Wait) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn mark(mut self, mark: Mark) -> Self {
        self.mark = Some(mark);
        self
    }

    pub fn settle(mut self, settle: Settle) -> Self {
        self.settle = Some(settle);
        self
    }
}

/// Named block of steps. The name is what failure reports point at.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

/// The complete script for one recorded session.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub url: String,
    /// SVG injected as the cursor overlay right after the page opens.
    pub cursor_svg: Option<String>,
    pub scenes: Vec<Scene>,
}

impl Scenario {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cursor_svg: None,
            scenes: Vec::new(),
        }
    }

    pub fn with_cursor(mut self, svg: impl Into<String>) -> Self {
        self.cursor_svg = Some(svg.into());
        self
    }

    pub fn scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }
}

/// Bulk pre-caching pass: select, trigger, wait-for-active, trigger-again
/// over a fixed-size collection.
#[derive(Debug, Clone)]
pub struct PrecacheSpec {
    /// Selectable child of each item; the element index is the item index.
    pub item_css: String,
    pub item_count: usize,
    /// Control that starts the precomputation and whose re-enablement marks
    /// it active; triggered a second time to stop.
    pub trigger: Locator,
}

/// Expand a precache pass into a scene. Runs before the loaded anchor, so
/// its duration is excluded from the timed narrative.
pub fn precache_scene(name: impl Into<String>, spec: &PrecacheSpec) -> Scene {
    let mut scene = Scene::new(name);
    for index in 0..spec.item_count {
        scene = scene
            .step(Step::new().act(Action::Click {
                target: Locator::css(spec.item_css.clone()).nth(index),
                at: None,
            }))
            .step(
                Step::new()
                    .act(Action::Click {
                        target: spec.trigger.clone(),
                        at: None,
                    })
                    .wait(Wait::Enabled(spec.trigger.clone())),
            )
            .step(Step::new().act(Action::Click {
                target: spec.trigger.clone(),
                at: None,
            }));
    }
    scene
}

/// Cleanup pass over a collection: which child selects an item and which
/// child removes it, both indexed by item position.
#[derive(Debug, Clone)]
pub struct CleanupSpec {
    pub select_css: String,
    pub remove_css: String,
}

/// Order in which a set of indices must be removed: strictly descending, so
/// a removal never shifts the position of a not-yet-removed earlier index.
pub fn removal_order(indices: &[usize]) -> Vec<usize> {
    let mut order = indices.to_vec();
    order.sort_unstable_by(|a, b| b.cmp(a));
    order.dedup();
    order
}

/// Expand a cleanup pass into a scene removing `indices` from the
/// collection, processed in [`removal_order`].
pub fn cleanup_scene(name: impl Into<String>, spec: &CleanupSpec, indices: &[usize]) -> Scene {
    let mut scene = Scene::new(name);
    for index in removal_order(indices) {
        scene = scene
            .step(Step::new().act(Action::Click {
                target: Locator::css(spec.select_css.clone()).nth(index),
                at: None,
            }))
            .step(Step::new().act(Action::Click {
                target: Locator::css(spec.remove_css.clone()).nth(index),
                at: None,
            }));
    }
    scene
}

/// Slider adjustment step: cursor eased to the value's fractional position,
/// then a positional click there.
pub fn slide_step(
    target: Locator,
    axis: Axis,
    range: ValueRange,
    value: f64,
    settle: Settle,
) -> Step {
    let fraction = range.fraction_of(value);
    let cursor_at = match axis {
        Axis::Horizontal => PointerOffset::new(fraction, 0.5),
        Axis::Vertical => PointerOffset::new(0.5, fraction),
    };
    Step::new()
        .move_cursor(target.clone(), cursor_at)
        .act(Action::Slide {
            target,
            axis,
            range,
            value,
        })
        .settle(settle)
}
