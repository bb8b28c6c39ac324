use image::{DynamicImage, GenericImageView};

use super::{
    gradient::Gradient,
    grid::{CellGlyph, GlyphGrid},
};
use crate::error::{InvalidInput, Result};
use crate::image_pipeline::{
    frame::Frame,
    resize::{self, LayoutPolicy},
};

/// Glyphs are roughly twice as tall as wide, so raster output repeats each
/// cell twice horizontally.
pub const RASTER_REPEAT: u32 = 2;

/// Terminal cells are narrower still.
pub const TEXT_REPEAT: u32 = 3;

/// A glyph grid together with the downsampled cells it was built from.
#[derive(Clone, Debug)]
pub struct MappedFrame {
    pub grid: GlyphGrid,
    pub cells: Frame,
}

pub struct GlyphMapper<'a> {
    gradient: &'a Gradient,
    repeat: u32,
}

impl<'a> GlyphMapper<'a> {
    pub fn new(gradient: &'a Gradient) -> Self {
        Self { gradient, repeat: RASTER_REPEAT }
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    /// Downsamples `image` according to `layout`, then maps every cell.
    pub fn map_image(&self, image: &DynamicImage, layout: LayoutPolicy) -> Result<MappedFrame> {
        let (width, height) = image.dimensions();
        let geometry = layout.derive(width, height)?;
        let cells = resize::downsample(image, geometry);
        let grid = self.map_cells(&cells)?;
        Ok(MappedFrame { grid, cells })
    }

    /// Maps an already downsampled frame, one cell per pixel.
    pub fn map_cells(&self, cells: &Frame) -> Result<GlyphGrid, InvalidInput> {
        let (columns, rows) = (cells.width(), cells.height());
        if columns == 0 || rows == 0 {
            return Err(InvalidInput::FrameTooSmall { width: columns, height: rows, glyph_size: 1 });
        }

        let mut grid = GlyphGrid::blank(columns, rows, self.repeat);
        for row in 0..rows {
            for col in 0..columns {
                let level = self.gradient.index(cells.brightness(row, col));
                let glyph = CellGlyph::new(self.gradient.char_at(level), level);
                let first = col * self.repeat;
                for text_col in first..first + self.repeat {
                    grid.set(row, text_col, glyph);
                }
            }
        }

        Ok(grid)
    }
}
