use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use fontdue::{Font, FontSettings, Metrics};
use image::RgbImage;
use log::debug;

use super::{FontMetrics, GlyphPainter};
use crate::error::{RenderError, Result};
use crate::image_pipeline::color::Rgb;

#[derive(Debug, Clone)]
struct GlyphBitmap {
    metrics: Metrics,
    coverage: Vec<u8>,
}

/// Glyph painter backed by a TrueType/OpenType face.
pub struct FontdueRasterizer {
    font: Font,
    px: f32,
    ascent: f32,
    metrics: FontMetrics,
    glyph_cache: HashMap<char, GlyphBitmap>,
}

impl FontdueRasterizer {
    pub fn load(path: &Path, px: f32) -> Result<Self> {
        if !path.exists() {
            return Err(RenderError::ResourceNotFound { path: path.to_path_buf() });
        }
        let bytes = fs::read(path).map_err(RenderError::io("reading font"))?;
        debug!("loaded font {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(bytes, px)
    }

    pub fn from_bytes(bytes: Vec<u8>, px: f32) -> Result<Self> {
        let px = px.max(1.0);
        let font = Font::from_bytes(bytes, FontSettings { scale: px, ..FontSettings::default() })
            .map_err(|err| RenderError::decode("font", err))?;

        let (ascent, line_height) = match font.horizontal_line_metrics(px) {
            Some(line) => (line.ascent, line.new_line_size),
            None => (px, px),
        };
        let advance = font.metrics('M', px).advance_width;
        let metrics =
            FontMetrics { advance: advance.max(1.0), line_height: line_height.ceil().max(1.0) };

        Ok(Self { font, px, ascent, metrics, glyph_cache: HashMap::new() })
    }

    /// Rasterizes `glyphs` up front so drawing never has to.
    pub fn prepare(&mut self, glyphs: &[char]) {
        for &glyph in glyphs {
            if !self.glyph_cache.contains_key(&glyph) {
                let bitmap = self.rasterize(glyph);
                self.glyph_cache.insert(glyph, bitmap);
            }
        }
    }

    fn rasterize(&self, glyph: char) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(glyph, self.px);
        GlyphBitmap { metrics, coverage }
    }

    fn bitmap(&self, glyph: char) -> Cow<'_, GlyphBitmap> {
        match self.glyph_cache.get(&glyph) {
            Some(bitmap) => Cow::Borrowed(bitmap),
            None => Cow::Owned(self.rasterize(glyph)),
        }
    }
}

impl GlyphPainter for FontdueRasterizer {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn draw_glyph(&self, canvas: &mut RgbImage, x: i32, y: i32, glyph: char, color: Rgb) {
        let bitmap = self.bitmap(glyph);
        let metrics = bitmap.metrics;
        if metrics.width == 0 || metrics.height == 0 {
            return;
        }

        let baseline = y as f32 + self.ascent;
        let left = x + metrics.xmin;
        let top = (baseline - (metrics.ymin as f32 + metrics.height as f32)).round() as i32;
        blend_coverage(canvas, left, top, metrics.width, &bitmap.coverage, color);
    }
}

/// Alpha-blends a coverage bitmap of `width` columns onto the canvas.
fn blend_coverage(canvas: &mut RgbImage, left: i32, top: i32, width: usize, coverage: &[u8], color: Rgb) {
    let (canvas_width, canvas_height) = (canvas.width() as i32, canvas.height() as i32);
    let color = color.to_array();

    for (idx, &alpha) in coverage.iter().enumerate() {
        if alpha == 0 {
            continue;
        }
        let px = left + (idx % width) as i32;
        let py = top + (idx / width) as i32;
        if px < 0 || py < 0 || px >= canvas_width || py >= canvas_height {
            continue;
        }

        let alpha = f32::from(alpha) / 255.0;
        let pixel = canvas.get_pixel_mut(px as u32, py as u32);
        for (channel, &source) in pixel.0.iter_mut().zip(color.iter()) {
            let blended = f32::from(*channel) * (1.0 - alpha) + f32::from(source) * alpha;
            *channel = blended.round() as u8;
        }
    }
}
