pub mod composite;
pub mod config;
pub mod engine;
pub mod scenario;
pub mod sequencer;
pub mod timeline;
pub mod util;

pub use composite::{CompositeError, Compositor};
pub use config::Settings;
pub use engine::{EngineError, Key, Locator, MockEngine, PointerOffset, UiEngine, WebDriverEngine};
pub use sequencer::{Pacing, Scenario, Scene, Sequencer, SequencerError, Step};
pub use timeline::{TimelineError, TimestampRecord};
