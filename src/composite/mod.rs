//! Timing-synchronized compositor.
//!
//! Consumes the timestamp record and the raw recording, computes the trim
//! offset, and delegates the seek-and-cut to ffmpeg. All preconditions are
//! checked before the encoder is invoked; no partial composite is ever
//! produced from partial data.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

use crate::timeline::{TimelineError, TimestampRecord};

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error("no recording found in {0}")]
    MissingRecording(PathBuf),
    #[error("{count} files in {dir}; expected exactly one recording")]
    AmbiguousRecording { dir: PathBuf, count: usize },
    #[error("failed to scan recording directory {dir}: {source}")]
    Scan {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ffmpeg not found on PATH; set encoder_path in the config")]
    EncoderNotFound,
    #[error("failed to launch the encoder: {0}")]
    EncoderSpawn(#[source] std::io::Error),
    #[error("encoder exited with {0}")]
    EncoderFailed(ExitStatus),
}

pub struct Compositor {
    videos_dir: PathBuf,
    timings_path: PathBuf,
    output_path: PathBuf,
    encoder_path: Option<PathBuf>,
}

impl Compositor {
    pub fn new(
        videos_dir: PathBuf,
        timings_path: PathBuf,
        output_path: PathBuf,
        encoder_path: Option<PathBuf>,
    ) -> Self {
        Self {
            videos_dir,
            timings_path,
            output_path,
            encoder_path,
        }
    }

    /// Produce the trimmed artifact, overwriting any previous output.
    pub async fn run(&self) -> Result<PathBuf, CompositeError> {
        let record = TimestampRecord::read(&self.timings_path)?;
        record.validate()?;

        let raw = self.locate_recording()?;
        let offset = record.trim_offset_secs();
        tracing::info!(
            raw = %raw.display(),
            offset_secs = offset,
            out = %self.output_path.display(),
            "compositing"
        );

        let encoder = self.resolve_encoder()?;
        let status = tokio::process::Command::new(&encoder)
            .args(encode_args(&raw, offset, &self.output_path))
            .status()
            .await
            .map_err(CompositeError::EncoderSpawn)?;
        if !status.success() {
            return Err(CompositeError::EncoderFailed(status));
        }
        Ok(self.output_path.clone())
    }

    /// The raw recording is located by convention: the recording directory
    /// must contain exactly one file. Anything else means the session left
    /// inconsistent state, and picking one silently would composite the
    /// wrong capture.
    fn locate_recording(&self) -> Result<PathBuf, CompositeError> {
        let scan_err = |source| CompositeError::Scan {
            dir: self.videos_dir.clone(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.videos_dir).map_err(scan_err)? {
            let path = entry.map_err(scan_err)?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        match files.len() {
            0 => Err(CompositeError::MissingRecording(self.videos_dir.clone())),
            1 => Ok(files.remove(0)),
            count => Err(CompositeError::AmbiguousRecording {
                dir: self.videos_dir.clone(),
                count,
            }),
        }
    }

    fn resolve_encoder(&self) -> Result<PathBuf, CompositeError> {
        match &self.encoder_path {
            Some(path) => Ok(path.clone()),
            None => which::which("ffmpeg").map_err(|_| CompositeError::EncoderNotFound),
        }
    }
}

/// `-ss` after `-i` decodes from the start and cuts at the offset; `-y`
/// overwrites any previous artifact without prompting.
fn encode_args(input: &Path, offset_secs: f64, output: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-i"),
        input.as_os_str().to_os_string(),
        OsString::from("-ss"),
        OsString::from(offset_secs.to_string()),
        output.as_os_str().to_os_string(),
        OsString::from("-y"),
    ]
}
