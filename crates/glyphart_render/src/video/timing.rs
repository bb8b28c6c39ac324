use log::warn;

use crate::error::{ConfigError, InvalidInput};

/// Closed-open span of source time, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, ConfigError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end {
            return Err(ConfigError::InvalidTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Applies the defaults (start 0, end = `duration`). An end past the
    /// source is clamped to its duration.
    pub fn resolve(start: Option<f64>, end: Option<f64>, duration: f64) -> Result<Self, ConfigError> {
        let start = start.unwrap_or(0.0);
        let end = match end {
            Some(end) if end > duration => {
                warn!("end time {end}s is past the source duration, clamping to {duration}s");
                duration
            },
            Some(end) => end,
            None => duration,
        };
        Self::new(start, end)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Evenly spaced sample timestamps over a window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleSchedule {
    window: TimeWindow,
    fps: f64,
    frame_count: usize,
    interval: f64,
}

impl SampleSchedule {
    pub fn new(window: TimeWindow, fps: f64) -> Result<Self, InvalidInput> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(InvalidInput::InvalidFrameRate(fps));
        }

        let duration = window.duration();
        let frame_count = (fps * duration).floor() as usize;
        if frame_count == 0 {
            return Err(InvalidInput::NoFrames { duration, fps });
        }

        Ok(Self { window, fps, frame_count, interval: duration / frame_count as f64 })
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Absolute source timestamp of sample `index`.
    pub fn timestamp(&self, index: usize) -> f64 {
        self.window.start + index as f64 * self.interval
    }
}
