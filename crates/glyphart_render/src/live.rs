use std::time::{Duration, Instant};

use image::DynamicImage;
use log::{debug, info};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::image_pipeline::loader::FrameSource;

/// Minimum spacing between two rendered camera frames.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiveStats {
    pub polled: usize,
    pub rendered: usize,
}

/// Pulls frames from a live source and hands at most one per interval to a
/// consumer. Frames arriving inside the interval are dropped so the source
/// never backs up.
pub struct LiveSession {
    interval: Duration,
    cancel: CancelToken,
}

impl LiveSession {
    pub fn new(cancel: CancelToken) -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, cancel }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs until the token is cancelled, the source runs dry or `on_frame`
    /// fails.
    pub fn run<S, F>(&self, source: &mut S, mut on_frame: F) -> Result<LiveStats>
    where
        S: FrameSource + ?Sized,
        F: FnMut(&DynamicImage) -> Result<()>,
    {
        let (width, height) = source.dimensions();
        info!("live session on a {width}x{height} source, one frame per {:?}", self.interval);

        let mut stats = LiveStats::default();
        let mut last_render: Option<Instant> = None;

        while !self.cancel.is_cancelled() {
            let Some(frame) = source.next_frame() else {
                debug!("frame source ended");
                break;
            };
            stats.polled += 1;

            if last_render.is_some_and(|at| at.elapsed() < self.interval) {
                continue;
            }
            last_render = Some(Instant::now());
            on_frame(&frame)?;
            stats.rendered += 1;
        }

        debug!("live session stopped after {} of {} frames", stats.rendered, stats.polled);
        Ok(stats)
    }
}
