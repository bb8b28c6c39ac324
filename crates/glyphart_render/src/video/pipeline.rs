use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info, warn};
use rayon::prelude::*;

use super::source::{AudioSource, VideoSink, VideoSource};
use super::timing::{SampleSchedule, TimeWindow};
use crate::cancel::CancelToken;
use crate::config::RenderConfig;
use crate::error::{ConfigError, RenderError, Result};
use crate::raster::GlyphPainter;
use crate::GlyphArtRenderer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    ExtractingFrames,
    Converting,
    Assembling,
    ExtractingAudio,
    Muxing,
    Saved,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Saved | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            PipelineState::Init => "resolving the time window",
            PipelineState::ExtractingFrames => "extracting frames",
            PipelineState::Converting => "converting frames",
            PipelineState::Assembling => "assembling the video",
            PipelineState::ExtractingAudio => "extracting audio",
            PipelineState::Muxing => "muxing audio",
            PipelineState::Saved => "saving",
            PipelineState::Failed => "failing",
        };
        f.write_str(stage)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub state: PipelineState,
    /// Frames pushed to the sink so far.
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }
}

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Seconds; defaults to the start of the source.
    pub start: Option<f64>,
    /// Seconds; defaults to the source duration.
    pub end: Option<f64>,
    pub workers: usize,
    pub cancel: CancelToken,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { start: None, end: None, workers, cancel: CancelToken::new() }
    }
}

/// Summary of a saved conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineReport {
    pub window: TimeWindow,
    pub frame_count: usize,
    pub fps: f64,
    pub frame_size: (u32, u32),
    pub audio: Option<TimeWindow>,
    pub destination: PathBuf,
}

/// Converts a window of a video into a glyph-art video, frame by frame.
pub struct VideoPipeline<'a, P: GlyphPainter + ?Sized> {
    renderer: GlyphArtRenderer<'a, P>,
    options: PipelineOptions,
    state: PipelineState,
}

impl<'a, P: GlyphPainter + ?Sized> VideoPipeline<'a, P> {
    pub fn new(
        config: &'a RenderConfig,
        painter: &'a P,
        options: PipelineOptions,
    ) -> Result<Self, ConfigError> {
        if options.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(Self { renderer: GlyphArtRenderer::new(config, painter), options, state: PipelineState::Init })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the conversion to completion. Any failure aborts the sink, leaves
    /// the pipeline `Failed` and reports the stage it happened in.
    pub fn run<S, A, K>(
        &mut self,
        source: &S,
        audio: &A,
        sink: &mut K,
        destination: &Path,
        mut progress: impl FnMut(Progress),
    ) -> Result<PipelineReport>
    where
        S: VideoSource + ?Sized,
        A: AudioSource + ?Sized,
        K: VideoSink + ?Sized,
    {
        let mut state = PipelineState::Init;
        let result = self.execute(&mut state, source, audio, sink, destination, &mut progress);

        match result {
            Ok(report) => {
                self.state = PipelineState::Saved;
                Ok(report)
            },
            Err(err) => {
                warn!("video pipeline failed while {state}: {err}");
                sink.abort();
                self.state = PipelineState::Failed;
                Err(RenderError::Pipeline { stage: state, source: Box::new(err) })
            },
        }
    }

    fn execute<S, A, K>(
        &self,
        state: &mut PipelineState,
        source: &S,
        audio: &A,
        sink: &mut K,
        destination: &Path,
        progress: &mut dyn FnMut(Progress),
    ) -> Result<PipelineReport>
    where
        S: VideoSource + ?Sized,
        A: AudioSource + ?Sized,
        K: VideoSink + ?Sized,
    {
        let metadata = source.metadata();
        let window = TimeWindow::resolve(self.options.start, self.options.end, metadata.duration)?;
        let schedule = SampleSchedule::new(window, metadata.fps)?;
        let total = schedule.frame_count();
        info!(
            "sampling {} frames from {:.3}s to {:.3}s at {:.3} fps",
            total, window.start, window.end, metadata.fps
        );

        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.options.workers).build()?;
        let chunk_size = self.options.workers * 4;
        let mut frame_size = None;
        let mut completed = 0;

        while completed < total {
            let indices = completed..(completed + chunk_size).min(total);

            enter(state, PipelineState::ExtractingFrames);
            let frames = pool.install(|| {
                indices
                    .clone()
                    .into_par_iter()
                    .map(|index| {
                        self.check_cancelled()?;
                        source.frame_at(schedule.timestamp(index))
                    })
                    .collect::<Result<Vec<_>>>()
            })?;

            enter(state, PipelineState::Converting);
            let rendered = pool.install(|| {
                frames
                    .into_par_iter()
                    .zip(indices.into_par_iter())
                    .map(|(frame, index)| {
                        self.check_cancelled()?;
                        Ok(self.renderer.render_frame(&frame, index)?.image)
                    })
                    .collect::<Result<Vec<RgbImage>>>()
            })?;

            enter(state, PipelineState::Assembling);
            for frame in &rendered {
                if frame_size.is_none() {
                    let (width, height) = frame.dimensions();
                    sink.begin(width, height, metadata.fps)?;
                    frame_size = Some((width, height));
                }
                sink.push_frame(frame)?;
                completed += 1;
            }
            progress(Progress { state: *state, completed, total });
        }
        let video = sink.finish()?;
        debug!("assembled {} frames", video.frame_count);

        enter(state, PipelineState::ExtractingAudio);
        let clip = match audio.load_audio()? {
            Some(track) => Some(track.slice(window.start, window.end)?),
            None => {
                info!("source has no audio track");
                None
            },
        };

        enter(state, PipelineState::Muxing);
        let video = match &clip {
            Some(clip) => sink.attach_audio(video, clip)?,
            None => video,
        };

        enter(state, PipelineState::Saved);
        sink.write_file(video, destination)?;
        progress(Progress { state: *state, completed, total });

        Ok(PipelineReport {
            window,
            frame_count: total,
            fps: metadata.fps,
            frame_size: frame_size.unwrap_or_default(),
            audio: clip.map(|clip| clip.window),
            destination: destination.to_path_buf(),
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.options.cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        Ok(())
    }
}

fn enter(state: &mut PipelineState, next: PipelineState) {
    if *state != next {
        debug!("video pipeline: {:?} -> {:?}", state, next);
        *state = next;
    }
}
