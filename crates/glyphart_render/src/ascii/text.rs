use std::fmt::Write;

use image::DynamicImage;

use super::{
    compositor::{ColorCompositor, ColorPolicy},
    effects::EffectFieldGenerator,
    mapping::{GlyphMapper, MappedFrame, TEXT_REPEAT},
};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::image_pipeline::{color::Rgb, resize::LayoutPolicy};

#[derive(Clone, Copy, Debug)]
pub struct TextOptions {
    /// Text width in characters.
    pub columns: u32,
    pub repeat: u32,
    /// Emit 24-bit ANSI colour escapes.
    pub ansi: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self { columns: 220, repeat: TEXT_REPEAT, ansi: false }
    }
}

/// Renders frames as terminal text instead of a raster.
pub struct TextRenderer<'a> {
    config: &'a RenderConfig,
    options: TextOptions,
}

impl<'a> TextRenderer<'a> {
    pub fn new(config: &'a RenderConfig, options: TextOptions) -> Self {
        Self { config, options }
    }

    pub fn map(&self, image: &DynamicImage) -> Result<MappedFrame> {
        let layout =
            LayoutPolicy::FitColumns { columns: self.options.columns, repeat: self.options.repeat };
        GlyphMapper::new(self.config.gradient()).with_repeat(self.options.repeat).map_image(image, layout)
    }

    pub fn render(&self, image: &DynamicImage) -> Result<String> {
        let mapped = self.map(image)?;
        if !self.options.ansi {
            return Ok(mapped.grid.to_text());
        }

        let field = self
            .config
            .effect()
            .and_then(|effect| EffectFieldGenerator::generate(effect, &mapped.cells));
        let compositor = ColorCompositor::new(self.config, field.as_ref());
        let background = match compositor.policy() {
            ColorPolicy::Effect => None,
            ColorPolicy::Plain | ColorPolicy::Contrast => Some(compositor.canvas_background()),
        };

        let grid = &mapped.grid;
        let mut text = String::with_capacity(grid.cells.len() * 4);
        for row in 0..grid.height {
            if let Some(bg) = background {
                push_escape(&mut text, 48, bg);
            }
            let mut current: Option<Rgb> = None;
            for col in 0..grid.width {
                let cell = grid.cell(row, col);
                let color = compositor.color_for(cell.level, row, grid.source_column(col));
                if current != Some(color) {
                    push_escape(&mut text, 38, color);
                    current = Some(color);
                }
                text.push(cell.ch);
            }
            text.push_str("\x1b[0m\n");
        }

        Ok(text)
    }
}

fn push_escape(text: &mut String, layer: u8, color: Rgb) {
    let _ = write!(text, "\x1b[{layer};2;{};{};{}m", color.r, color.g, color.b);
}
