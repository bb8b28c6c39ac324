pub mod font;
pub mod renderer;

use image::RgbImage;

use crate::image_pipeline::color::Rgb;

/// Pixel metrics of the face glyphs are drawn with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    /// Horizontal advance of one monospace cell.
    pub advance: f32,
    /// Distance between consecutive baselines.
    pub line_height: f32,
}

/// Draws single glyphs onto a canvas. `(x, y)` is the top-left corner of the
/// glyph's cell; painting outside the canvas is clipped.
pub trait GlyphPainter: Sync {
    fn metrics(&self) -> FontMetrics;

    fn draw_glyph(&self, canvas: &mut RgbImage, x: i32, y: i32, glyph: char, color: Rgb);
}
