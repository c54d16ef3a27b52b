//! The timestamp record handed from the recording phase to the compositor.
//!
//! Written once, atomically, after clean session teardown; read exactly once
//! by the compositor; never mutated after the session ends.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("loaded anchor {loaded}ms precedes start anchor {start}ms")]
    LoadedBeforeStart { start: u64, loaded: u64 },
    #[error("event time #{index} ({at}ms) is earlier than what precedes it ({previous}ms)")]
    UnorderedEvent { index: usize, at: u64, previous: u64 },
    #[error("failed to access timings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed timings file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Anchors and beats captured during one recorded session, as wall-clock
/// milliseconds since the Unix epoch, all taken within a single process run.
///
/// Invariant: `start_time <= loaded_time <= event_times[0] <= ...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimestampRecord {
    /// Captured the instant the session opens, before any load waiting.
    pub start_time: u64,
    /// Captured once initial content is confirmed present and settled.
    pub loaded_time: u64,
    /// Completion instants of the recordable beats, in script order.
    pub event_times: Vec<u64>,
}

impl TimestampRecord {
    /// Check the monotonicity invariant. The compositor refuses records that
    /// fail this; they indicate a partial or corrupted run.
    pub fn validate(&self) -> Result<(), TimelineError> {
        if self.loaded_time < self.start_time {
            return Err(TimelineError::LoadedBeforeStart {
                start: self.start_time,
                loaded: self.loaded_time,
            });
        }
        let mut previous = self.loaded_time;
        for (index, &at) in self.event_times.iter().enumerate() {
            if at < previous {
                return Err(TimelineError::UnorderedEvent {
                    index,
                    at,
                    previous,
                });
            }
            previous = at;
        }
        Ok(())
    }

    /// Seconds of setup to cut from the head of the raw recording.
    pub fn trim_offset_secs(&self) -> f64 {
        (self.loaded_time - self.start_time) as f64 / 1000.0
    }

    /// Persist the record: serialized to a temp file in the target
    /// directory, then renamed into place. A crashed run never leaves a
    /// half-written record for the compositor to pick up.
    pub fn write(&self, path: &Path) -> Result<(), TimelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec(self)?)?;
        fs::rename(&staging, path)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, TimelineError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(start: u64, loaded: u64, events: Vec<u64>) -> TimestampRecord {
        TimestampRecord {
            start_time: start,
            loaded_time: loaded,
            event_times: events,
        }
    }

    #[test]
    fn validate_accepts_monotonic_records() {
        record(1000, 3500, vec![4000, 4000, 5200]).validate().unwrap();
        record(1000, 1000, vec![]).validate().unwrap();
    }

    #[test]
    fn validate_rejects_loaded_before_start() {
        let err = record(3500, 1000, vec![]).validate().unwrap_err();
        assert!(matches!(
            err,
            TimelineError::LoadedBeforeStart { start: 3500, loaded: 1000 }
        ));
    }

    #[test]
    fn validate_rejects_unordered_events() {
        let err = record(1000, 3500, vec![4000, 3900]).validate().unwrap_err();
        assert!(matches!(err, TimelineError::UnorderedEvent { index: 1, .. }));

        let err = record(1000, 3500, vec![3400]).validate().unwrap_err();
        assert!(matches!(err, TimelineError::UnorderedEvent { index: 0, .. }));
    }

    #[test]
    fn trim_offset_is_the_setup_duration_in_seconds() {
        assert_eq!(record(1000, 3500, vec![]).trim_offset_secs(), 2.5);
        assert_eq!(record(0, 0, vec![]).trim_offset_secs(), 0.0);
    }

    #[test]
    fn write_then_read_round_trips_and_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timings.json");
        let original = record(1000, 3500, vec![4000, 5200]);

        original.write(&path).unwrap();
        let read_back = TimestampRecord::read(&path).unwrap();

        assert_eq!(read_back, original);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn serialized_form_uses_camel_case_anchors() {
        let json = serde_json::to_value(record(1, 2, vec![3])).unwrap();
        assert_eq!(json["startTime"], 1);
        assert_eq!(json["loadedTime"], 2);
        assert_eq!(json["eventTimes"][0], 3);
    }

    #[test]
    fn read_rejects_partial_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timings.json");
        fs::write(&path, r#"{"startTime": 1000}"#).unwrap();

        let err = TimestampRecord::read(&path).unwrap_err();
        assert!(matches!(err, TimelineError::Malformed(_)));
    }
}
