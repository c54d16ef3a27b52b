use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::sequencer::Pacing;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Resolved settings shared by the record and composite phases.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Target application URL to automate.
    pub target_url: String,
    /// W3C WebDriver endpoint the engine connects to.
    pub webdriver_url: String,
    /// Browser window size, which is also the recording size.
    pub viewport: (u32, u32),
    /// Work directory holding `videos/`, `timings.json`, and the final cut.
    pub work_dir: PathBuf,
    /// Project description file dropped into the app at startup. Opaque
    /// bytes; passed through without parsing.
    pub project_file: PathBuf,
    /// SVG asset injected as the cursor overlay.
    pub cursor_file: PathBuf,
    /// Pause after each synthesized keystroke.
    pub keyboard_delay: Duration,
    /// Pause after a click or slider adjustment.
    pub action_delay: Duration,
    /// Pause after finishing one cell of the narrative.
    pub cell_delay: Duration,
    /// Duration of the eased cursor transition.
    pub cursor_ease: Duration,
    /// Extra window around the loaded anchor once content is present.
    pub loaded_settle: Duration,
    /// Explicit encoder binary; PATH lookup of `ffmpeg` when unset.
    pub encoder_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:5173".into(),
            webdriver_url: "http://127.0.0.1:9515".into(),
            viewport: (1280, 720),
            work_dir: PathBuf::from("composite"),
            project_file: PathBuf::from("assets/demo-project.json"),
            cursor_file: PathBuf::from("assets/cursor.svg"),
            keyboard_delay: Duration::from_millis(100),
            action_delay: Duration::from_millis(300),
            cell_delay: Duration::from_millis(500),
            cursor_ease: Duration::from_millis(500),
            loaded_settle: Duration::from_millis(2500),
            encoder_path: None,
        }
    }
}

/// TOML representation of the settings file; every field optional so the
/// file only needs to name what it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSettings {
    pub target_url: Option<String>,
    pub webdriver_url: Option<String>,
    pub viewport: Option<[u32; 2]>,
    pub work_dir: Option<PathBuf>,
    pub project_file: Option<PathBuf>,
    pub cursor_file: Option<PathBuf>,
    pub encoder_path: Option<PathBuf>,
    pub delays: Option<TomlDelays>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlDelays {
    pub keyboard_ms: Option<u64>,
    pub action_ms: Option<u64>,
    pub cell_ms: Option<u64>,
    pub cursor_ease_ms: Option<u64>,
    pub loaded_settle_ms: Option<u64>,
}

impl Settings {
    /// Load settings, overlaying the file at `path` (when given) on top of
    /// the compiled defaults. A missing or unparsable file logs a warning
    /// and falls back to defaults rather than aborting.
    pub fn load(path: Option<&Path>) -> Self {
        let mut settings = Settings::default();
        let Some(path) = path else {
            return settings;
        };

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<TomlSettings>(&contents) {
                Ok(overrides) => settings.apply(overrides),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "ignoring malformed settings file");
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            }
        }
        settings
    }

    fn apply(&mut self, overrides: TomlSettings) {
        if let Some(target_url) = overrides.target_url {
            self.target_url = target_url;
        }
        if let Some(webdriver_url) = overrides.webdriver_url {
            self.webdriver_url = webdriver_url;
        }
        if let Some([width, height]) = overrides.viewport {
            self.viewport = (width, height);
        }
        if let Some(work_dir) = overrides.work_dir {
            self.work_dir = work_dir;
        }
        if let Some(project_file) = overrides.project_file {
            self.project_file = project_file;
        }
        if let Some(cursor_file) = overrides.cursor_file {
            self.cursor_file = cursor_file;
        }
        if let Some(encoder_path) = overrides.encoder_path {
            self.encoder_path = Some(encoder_path);
        }
        if let Some(delays) = overrides.delays {
            if let Some(ms) = delays.keyboard_ms {
                self.keyboard_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = delays.action_ms {
                self.action_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = delays.cell_ms {
                self.cell_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = delays.cursor_ease_ms {
                self.cursor_ease = Duration::from_millis(ms);
            }
            if let Some(ms) = delays.loaded_settle_ms {
                self.loaded_settle = Duration::from_millis(ms);
            }
        }
    }

    /// Directory the automation engine's capture drops the raw recording in.
    pub fn videos_dir(&self) -> PathBuf {
        self.work_dir.join("videos")
    }

    /// Well-known handoff path for the timestamp record.
    pub fn timings_path(&self) -> PathBuf {
        self.work_dir.join("timings.json")
    }

    /// Destination of the trimmed artifact.
    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join("dist.mp4")
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            keyboard: self.keyboard_delay,
            action: self.action_delay,
            cell: self.cell_delay,
            cursor_ease: self.cursor_ease,
        }
    }
}
