use std::path::Path;

use image::RgbImage;

use super::{FontMetrics, GlyphPainter};
use crate::ascii::{
    compositor::{ColorCompositor, ColorPolicy},
    effects::EffectField,
    grid::GlyphGrid,
    mapping::RASTER_REPEAT,
};
use crate::config::RenderConfig;
use crate::error::{InvalidInput, Result};

/// One rendered output raster.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub image: RgbImage,
    pub policy: ColorPolicy,
}

impl RenderedFrame {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }
}

/// Pixel pitch of one text column and one text row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLayout {
    pub pitch_x: f32,
    pub pitch_y: f32,
}

impl CellLayout {
    /// Plain output advances by the face's own metrics. Contrast and effect
    /// output place glyphs on a fixed grid of half-width cells.
    pub fn for_policy(policy: ColorPolicy, glyph_size: u32, metrics: FontMetrics) -> Self {
        match policy {
            ColorPolicy::Plain => {
                Self { pitch_x: metrics.advance.max(1.0), pitch_y: metrics.line_height.max(1.0) }
            },
            ColorPolicy::Contrast | ColorPolicy::Effect => Self {
                pitch_x: glyph_size as f32 / RASTER_REPEAT as f32,
                pitch_y: glyph_size as f32,
            },
        }
    }

    pub fn canvas_size(&self, grid: &GlyphGrid) -> (u32, u32) {
        let width = (grid.width as f32 * self.pitch_x).ceil().max(1.0);
        let height = (grid.height as f32 * self.pitch_y).ceil().max(1.0);
        (width as u32, height as u32)
    }

    pub fn origin(&self, row: u32, col: u32) -> (i32, i32) {
        ((col as f32 * self.pitch_x).floor() as i32, (row as f32 * self.pitch_y).floor() as i32)
    }
}

pub struct FrameRenderer<'a, P: GlyphPainter + ?Sized> {
    painter: &'a P,
}

impl<'a, P: GlyphPainter + ?Sized> FrameRenderer<'a, P> {
    pub fn new(painter: &'a P) -> Self {
        Self { painter }
    }

    pub fn render(
        &self,
        grid: &GlyphGrid,
        config: &RenderConfig,
        field: Option<&EffectField>,
    ) -> Result<RenderedFrame> {
        if grid.is_empty() || grid.height == 0 {
            return Err(InvalidInput::EmptyGrid.into());
        }
        if let Some(field) = field {
            if field.columns() != grid.source_columns() || field.rows() != grid.height {
                return Err(InvalidInput::FieldMismatch {
                    field_columns: field.columns(),
                    field_rows: field.rows(),
                    columns: grid.source_columns(),
                    rows: grid.height,
                }
                .into());
            }
        }

        let compositor = ColorCompositor::new(config, field);
        let layout =
            CellLayout::for_policy(compositor.policy(), config.glyph_size(), self.painter.metrics());
        let (width, height) = layout.canvas_size(grid);
        let mut canvas = RgbImage::from_pixel(width, height, compositor.canvas_background().into());

        for (row, col, cell) in grid.iter() {
            if cell.ch.is_whitespace() {
                continue;
            }
            let color = compositor.color_for(cell.level, row, grid.source_column(col));
            let (x, y) = layout.origin(row, col);
            self.painter.draw_glyph(&mut canvas, x, y, cell.ch, color);
        }

        Ok(RenderedFrame { image: canvas, policy: compositor.policy() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::{
        effects::{Effect, EffectFieldGenerator},
        grid::CellGlyph,
    };
    use crate::image_pipeline::{color::Rgb, frame::Frame};

    /// Paints a solid 1x1 dot at each glyph origin.
    struct DotPainter;

    impl GlyphPainter for DotPainter {
        fn metrics(&self) -> FontMetrics {
            FontMetrics { advance: 5.0, line_height: 9.0 }
        }

        fn draw_glyph(&self, canvas: &mut RgbImage, x: i32, y: i32, _glyph: char, color: Rgb) {
            canvas.put_pixel(x as u32, y as u32, color.into());
        }
    }

    fn filled_grid(columns: u32, rows: u32, level: usize) -> GlyphGrid {
        let mut grid = GlyphGrid::blank(columns, rows, RASTER_REPEAT);
        for row in 0..rows {
            for col in 0..grid.width {
                grid.set(row, col, CellGlyph::new('#', level));
            }
        }
        grid
    }

    #[test]
    fn plain_canvas_uses_font_metrics() {
        let config = RenderConfig::default();
        let frame = FrameRenderer::new(&DotPainter).render(&filled_grid(3, 2, 9), &config, None).unwrap();

        assert_eq!(frame.policy, ColorPolicy::Plain);
        assert_eq!(frame.dimensions(), (30, 18));
        assert_eq!(frame.image.get_pixel(5, 9).0, config.foreground().to_array());
        assert_eq!(frame.image.get_pixel(1, 1).0, config.background().to_array());
    }

    #[test]
    fn contrast_canvas_uses_half_width_cells() {
        let config = RenderConfig::builder().contrast(true).glyph_size(8).build().unwrap();
        let frame = FrameRenderer::new(&DotPainter).render(&filled_grid(3, 2, 0), &config, None).unwrap();

        assert_eq!(frame.dimensions(), (24, 16));
        // Level 0 blends all the way to the background.
        assert_eq!(frame.image.get_pixel(4, 8).0, config.background().to_array());
    }

    #[test]
    fn effect_canvas_is_black_and_coloured_per_cell() {
        let config = RenderConfig::builder().effect(Some(Effect::RainbowHorizontal)).build().unwrap();
        let cells = Frame::from_rgb_image(&RgbImage::new(3, 2));
        let field = EffectFieldGenerator::generate(Effect::RainbowHorizontal, &cells).unwrap();
        let frame = FrameRenderer::new(&DotPainter)
            .render(&filled_grid(3, 2, 4), &config, Some(&field))
            .unwrap();

        assert_eq!(frame.policy, ColorPolicy::Effect);
        assert_eq!(frame.image.get_pixel(1, 1).0, [0, 0, 0]);
        // Text columns 2 and 3 share source cell 1.
        assert_eq!(frame.image.get_pixel(8, 0).0, field.color_at(0, 1).to_array());
        assert_eq!(frame.image.get_pixel(12, 0).0, field.color_at(0, 1).to_array());
    }

    #[test]
    fn mismatched_field_is_rejected() {
        let config = RenderConfig::builder().effect(Some(Effect::RainbowVertical)).build().unwrap();
        let cells = Frame::from_rgb_image(&RgbImage::new(4, 2));
        let field = EffectFieldGenerator::generate(Effect::RainbowVertical, &cells).unwrap();
        let err = FrameRenderer::new(&DotPainter)
            .render(&filled_grid(3, 2, 1), &config, Some(&field))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::RenderError::InvalidInput(InvalidInput::FieldMismatch { .. })
        ));
    }

    #[test]
    fn zero_repeat_grids_render_one_column_per_cell() {
        let grid = GlyphGrid { width: 3, height: 1, repeat: 0, cells: vec![CellGlyph::new('#', 9); 3] };
        let config = RenderConfig::builder().contrast(true).build().unwrap();
        let frame = FrameRenderer::new(&DotPainter).render(&grid, &config, None).unwrap();

        assert_eq!(frame.dimensions(), (12, 8));
        assert_eq!(frame.image.get_pixel(8, 0).0, config.foreground().to_array());
    }

    #[test]
    fn empty_grid_is_rejected() {
        let grid = GlyphGrid::blank(0, 0, RASTER_REPEAT);
        let err = FrameRenderer::new(&DotPainter).render(&grid, &RenderConfig::default(), None).unwrap_err();
        assert!(matches!(err, crate::RenderError::InvalidInput(InvalidInput::EmptyGrid)));
    }
}
