mod settings;

pub use settings::{Settings, TomlDelays, TomlSettings, EXAMPLE_CONFIG};
