mod ascii;
mod cancel;
mod config;
mod error;
mod image_pipeline;
mod live;
mod raster;
pub mod video;

use std::path::Path;

pub use image;

use image::DynamicImage;
use log::debug;

pub use ascii::{
    compositor::{contrast_color, contrast_position, ColorCompositor, ColorPolicy},
    effects::{Effect, EffectField, EffectFieldGenerator},
    gradient::Gradient,
    grid::{CellGlyph, GlyphGrid},
    mapping::{GlyphMapper, MappedFrame, RASTER_REPEAT, TEXT_REPEAT},
    text::{TextOptions, TextRenderer},
};
pub use cancel::CancelToken;
pub use config::{
    RenderConfig, RenderConfigBuilder, DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, DEFAULT_GLYPH_SIZE,
    DEFAULT_GRADIENT,
};
pub use error::{ConfigError, InvalidInput, RenderError, Result};
pub use image_pipeline::{
    color::{hue_to_rgb, Hsv, Rgb, HUE_RANGE},
    frame::Frame,
    loader::{load_image, FrameSource, StaticFrame},
    resize::{downsample, LayoutPolicy, TargetGeometry},
};
pub use live::{LiveSession, LiveStats, DEFAULT_POLL_INTERVAL};
pub use raster::{
    font::FontdueRasterizer,
    renderer::{CellLayout, FrameRenderer, RenderedFrame},
    FontMetrics, GlyphPainter,
};
pub use video::{
    ffmpeg::{FfmpegCapture, FfmpegSink, FfmpegSource},
    AudioClip, AudioSource, PipelineOptions, PipelineReport, PipelineState, Progress,
    SampleSchedule, TimeWindow, VideoMetadata, VideoPipeline, VideoSink, VideoSource, VideoStream,
};

/// Still-frame entry point: maps a frame to glyphs, builds the effect field
/// and rasterizes the result with `painter`.
pub struct GlyphArtRenderer<'a, P: GlyphPainter + ?Sized> {
    config: &'a RenderConfig,
    painter: &'a P,
}

impl<'a, P: GlyphPainter + ?Sized> GlyphArtRenderer<'a, P> {
    pub fn new(config: &'a RenderConfig, painter: &'a P) -> Self {
        Self { config, painter }
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    pub fn render_path<T: AsRef<Path>>(&self, path: T) -> Result<RenderedFrame> {
        let image = load_image(path.as_ref())?;
        self.render_image(&image)
    }

    pub fn render_image(&self, image: &DynamicImage) -> Result<RenderedFrame> {
        self.render_with(image, self.config)
    }

    /// Renders the `frame_index`-th frame of a sequence, applying time-driven
    /// effects for that index.
    pub fn render_frame(&self, image: &DynamicImage, frame_index: usize) -> Result<RenderedFrame> {
        let config = self.config.for_frame(frame_index);
        self.render_with(image, &config)
    }

    fn render_with(&self, image: &DynamicImage, config: &RenderConfig) -> Result<RenderedFrame> {
        let layout = LayoutPolicy::GlyphSize(config.glyph_size());
        let mapped = GlyphMapper::new(config.gradient()).map_image(image, layout)?;
        let field = config
            .effect()
            .and_then(|effect| EffectFieldGenerator::generate(effect, &mapped.cells));

        debug!(
            "mapped {}x{} cells into a {}x{} glyph grid",
            mapped.cells.width(),
            mapped.cells.height(),
            mapped.grid.width,
            mapped.grid.height
        );
        FrameRenderer::new(self.painter).render(&mapped.grid, config, field.as_ref())
    }
}
