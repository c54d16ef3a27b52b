pub mod cursor;
pub mod executor;
pub mod script;
pub mod wait;

pub use executor::{Pacing, Sequencer, SequencerError};
pub use script::{
    cleanup_scene, precache_scene, removal_order, slide_step, Action, Axis, CleanupSpec,
    CursorMove, Mark, PrecacheSpec, Scenario, Scene, Settle, Step, ValueRange, Wait,
};
pub use wait::{poll_until, wait_for_count, wait_for_enabled, POLL_INTERVAL};
