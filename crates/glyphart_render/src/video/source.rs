use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};

use super::timing::TimeWindow;
use crate::error::{ConfigError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Seconds.
    pub duration: f64,
}

/// Random access to decoded video frames. Implementations decode lazily; the
/// pipeline calls `frame_at` from several worker threads.
pub trait VideoSource: Sync {
    fn metadata(&self) -> VideoMetadata;

    fn frame_at(&self, timestamp: f64) -> Result<DynamicImage>;
}

/// A span of an audio track. Slicing is bookkeeping only; the samples are
/// read when the clip is muxed.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    pub source: PathBuf,
    pub window: TimeWindow,
}

impl AudioClip {
    pub fn new(source: impl Into<PathBuf>, duration: f64) -> Result<Self, ConfigError> {
        Ok(Self { source: source.into(), window: TimeWindow::new(0.0, duration)? })
    }

    /// Sub-clip between absolute timestamps, clamped to this clip.
    pub fn slice(&self, start: f64, end: f64) -> Result<Self, ConfigError> {
        let window = TimeWindow::new(start.max(self.window.start), end.min(self.window.end))?;
        Ok(Self { source: self.source.clone(), window })
    }
}

pub trait AudioSource {
    /// `None` when the source carries no audio track.
    fn load_audio(&self) -> Result<Option<AudioClip>>;
}

/// An assembled (possibly muxed) video that has not been saved yet.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoStream {
    pub location: PathBuf,
    pub frame_count: usize,
    pub fps: f64,
    pub audio: Option<TimeWindow>,
}

/// Receives rendered frames in presentation order and produces the output file.
pub trait VideoSink {
    fn begin(&mut self, width: u32, height: u32, fps: f64) -> Result<()>;

    fn push_frame(&mut self, frame: &RgbImage) -> Result<()>;

    fn finish(&mut self) -> Result<VideoStream>;

    fn attach_audio(&mut self, video: VideoStream, audio: &AudioClip) -> Result<VideoStream>;

    fn write_file(&mut self, video: VideoStream, destination: &Path) -> Result<()>;

    /// Drops everything produced so far. Nothing written before the abort is valid output.
    fn abort(&mut self);
}
