use std::io;
use std::path::PathBuf;

use crate::video::PipelineState;

/// Result alias used throughout the crate.
pub type Result<T, E = RenderError> = std::result::Result<T, E>;

/// Rejected configuration values. Never retried; the caller has to supply a
/// corrected configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("gradient must contain at least two glyphs, got {0}")]
    GradientTooShort(usize),
    #[error("glyph size must be at least one pixel")]
    ZeroGlyphSize,
    #[error("{name} component {value} is outside 0..=255")]
    ColorOutOfRange { name: &'static str, value: i64 },
    #[error("`{0}` is not an R,G,B colour triple")]
    MalformedColor(String),
    #[error("start time {start}s must be before end time {end}s")]
    InvalidTimeWindow { start: f64, end: f64 },
    #[error("unknown effect `{0}`")]
    UnknownEffect(String),
    #[error("worker count must be at least one")]
    ZeroWorkers,
}

/// Frames that cannot be turned into a glyph grid.
#[derive(Debug, thiserror::Error)]
pub enum InvalidInput {
    #[error("frame {width}x{height} is smaller than one {glyph_size}px glyph cell")]
    FrameTooSmall { width: u32, height: u32, glyph_size: u32 },
    #[error("{columns} text columns leave no glyph cells for a {width}x{height} frame")]
    TooFewColumns { columns: u32, width: u32, height: u32 },
    #[error("a {duration:.3}s window at {fps} fps contains no frames")]
    NoFrames { duration: f64, fps: f64 },
    #[error("source reported an unusable frame rate of {0}")]
    InvalidFrameRate(f64),
    #[error("glyph grid has no cells")]
    EmptyGrid,
    #[error("effect field {field_columns}x{field_rows} does not cover a {columns}x{rows} grid")]
    FieldMismatch { field_columns: u32, field_rows: u32, columns: u32, rows: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("failed to process image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to decode {stage}: {message}")]
    Decode { stage: &'static str, message: String },
    #[error("failed to encode {stage}: {message}")]
    Encode { stage: &'static str, message: String },
    #[error("{} does not exist", path.display())]
    ResourceNotFound { path: PathBuf },
    #[error("i/o error while {stage}: {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("conversion cancelled")]
    Cancelled,
    #[error("video pipeline failed while {stage}: {source}")]
    Pipeline {
        stage: PipelineState,
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    pub(crate) fn decode(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Decode { stage, message: message.into() }
    }

    pub(crate) fn encode(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Encode { stage, message: message.into() }
    }

    pub(crate) fn io(stage: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { stage, source }
    }

    /// Strips the pipeline stage wrapper, if any.
    pub fn root_cause(&self) -> &RenderError {
        match self {
            RenderError::Pipeline { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
