use std::borrow::Cow;

use log::debug;

use crate::ascii::{effects::Effect, gradient::Gradient};
use crate::error::ConfigError;
use crate::image_pipeline::color::Rgb;

pub const DEFAULT_GLYPH_SIZE: u32 = 8;
pub const DEFAULT_GRADIENT: &str = " .-;+=xX$█";
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(66, 5, 5);
pub const DEFAULT_FOREGROUND: Rgb = Rgb::new(164, 255, 45);

/// Immutable rendering settings shared by every frame of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    glyph_size: u32,
    gradient: Gradient,
    background: Rgb,
    foreground: Rgb,
    contrast: bool,
    effect: Option<Effect>,
    invert_gradient: bool,
}

impl RenderConfig {
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder::default()
    }

    pub fn glyph_size(&self) -> u32 {
        self.glyph_size
    }

    /// Effective gradient, already reversed when inversion is requested.
    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn foreground(&self) -> Rgb {
        self.foreground
    }

    pub fn contrast(&self) -> bool {
        self.contrast
    }

    pub fn effect(&self) -> Option<Effect> {
        self.effect
    }

    pub fn invert_gradient(&self) -> bool {
        self.invert_gradient
    }

    /// Settings for the frame at `frame_index`. Time-driven effects swap in their
    /// foreground on a black background and drop out of the effect slot.
    pub fn for_frame(&self, frame_index: usize) -> Cow<'_, RenderConfig> {
        match self.effect.and_then(|effect| effect.override_foreground(frame_index)) {
            Some(foreground) => Cow::Owned(RenderConfig {
                foreground,
                background: Rgb::BLACK,
                effect: None,
                ..self.clone()
            }),
            None => Cow::Borrowed(self),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            glyph_size: DEFAULT_GLYPH_SIZE,
            gradient: Gradient::classic(),
            background: DEFAULT_BACKGROUND,
            foreground: DEFAULT_FOREGROUND,
            contrast: false,
            effect: None,
            invert_gradient: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderConfigBuilder {
    glyph_size: u32,
    gradient: String,
    background: Rgb,
    foreground: Rgb,
    contrast: bool,
    effect: Option<Effect>,
    invert_gradient: bool,
}

impl Default for RenderConfigBuilder {
    fn default() -> Self {
        Self {
            glyph_size: DEFAULT_GLYPH_SIZE,
            gradient: DEFAULT_GRADIENT.to_owned(),
            background: DEFAULT_BACKGROUND,
            foreground: DEFAULT_FOREGROUND,
            contrast: false,
            effect: None,
            invert_gradient: false,
        }
    }
}

impl RenderConfigBuilder {
    pub fn glyph_size(mut self, glyph_size: u32) -> Self {
        self.glyph_size = glyph_size;
        self
    }

    pub fn gradient(mut self, gradient: impl Into<String>) -> Self {
        self.gradient = gradient.into();
        self
    }

    pub fn background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }

    pub fn foreground(mut self, foreground: Rgb) -> Self {
        self.foreground = foreground;
        self
    }

    pub fn contrast(mut self, contrast: bool) -> Self {
        self.contrast = contrast;
        self
    }

    pub fn effect(mut self, effect: Option<Effect>) -> Self {
        self.effect = effect;
        self
    }

    pub fn invert_gradient(mut self, invert: bool) -> Self {
        self.invert_gradient = invert;
        self
    }

    pub fn build(self) -> Result<RenderConfig, ConfigError> {
        if self.glyph_size == 0 {
            return Err(ConfigError::ZeroGlyphSize);
        }
        let gradient = Gradient::new(self.gradient)?.oriented(self.invert_gradient);

        debug!(
            "render config: {}px glyphs, {} gradient levels, contrast {}, effect {:?}",
            self.glyph_size,
            gradient.len(),
            self.contrast,
            self.effect.map(|effect| effect.name())
        );

        Ok(RenderConfig {
            glyph_size: self.glyph_size,
            gradient,
            background: self.background,
            foreground: self.foreground,
            contrast: self.contrast,
            effect: self.effect,
            invert_gradient: self.invert_gradient,
        })
    }
}
