use super::effects::EffectField;
use crate::config::RenderConfig;
use crate::image_pipeline::color::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorPolicy {
    /// Foreground glyphs on a flat background.
    Plain,
    /// Glyph colour blends from background to foreground with gradient position.
    Contrast,
    /// Glyph colour comes from an effect field.
    Effect,
}

impl ColorPolicy {
    /// Effect beats contrast, contrast beats plain. Time-driven effects have no
    /// field and fall through to the remaining flags.
    pub fn select(config: &RenderConfig) -> Self {
        match config.effect() {
            Some(effect) if effect.is_spatial() => ColorPolicy::Effect,
            _ if config.contrast() => ColorPolicy::Contrast,
            _ => ColorPolicy::Plain,
        }
    }
}

pub struct ColorCompositor<'a> {
    policy: ColorPolicy,
    foreground: Rgb,
    background: Rgb,
    max_level: usize,
    field: Option<&'a EffectField>,
}

impl<'a> ColorCompositor<'a> {
    pub fn new(config: &RenderConfig, field: Option<&'a EffectField>) -> Self {
        let policy = match ColorPolicy::select(config) {
            ColorPolicy::Effect if field.is_none() => {
                if config.contrast() {
                    ColorPolicy::Contrast
                } else {
                    ColorPolicy::Plain
                }
            },
            policy => policy,
        };

        Self {
            policy,
            foreground: config.foreground(),
            background: config.background(),
            max_level: config.gradient().max_index(),
            field,
        }
    }

    pub fn policy(&self) -> ColorPolicy {
        self.policy
    }

    /// Canvas fill colour. Effect colours span the whole hue circle, so they sit on black.
    pub fn canvas_background(&self) -> Rgb {
        match self.policy {
            ColorPolicy::Effect => Rgb::BLACK,
            ColorPolicy::Plain | ColorPolicy::Contrast => self.background,
        }
    }

    /// Colour of a glyph at gradient `level` drawn for downsampled cell `(row, col)`.
    pub fn color_for(&self, level: usize, row: u32, col: u32) -> Rgb {
        match (self.policy, self.field) {
            (ColorPolicy::Effect, Some(field)) => field.color_at(row, col),
            (ColorPolicy::Contrast, _) => {
                contrast_color(self.foreground, self.background, level, self.max_level)
            },
            _ => self.foreground,
        }
    }
}

/// Relative gradient position quantized to one decimal.
pub fn contrast_position(level: usize, max_level: usize) -> f64 {
    if max_level == 0 {
        return 1.0;
    }
    let tenths = level.min(max_level) * 10 / max_level;
    tenths as f64 / 10.0
}

/// `fg - (fg - bg) * (1 - p)` per channel: brightest glyphs take the foreground,
/// the darkest take the background.
pub fn contrast_color(foreground: Rgb, background: Rgb, level: usize, max_level: usize) -> Rgb {
    let position = contrast_position(level, max_level);
    let blend = |fg: u8, bg: u8| {
        let fg = f64::from(fg);
        let diff = fg - f64::from(bg);
        (fg - diff * (1.0 - position)).floor().clamp(0.0, 255.0) as u8
    };

    Rgb::new(
        blend(foreground.r, background.r),
        blend(foreground.g, background.g),
        blend(foreground.b, background.b),
    )
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::ascii::effects::{Effect, EffectFieldGenerator};
    use crate::image_pipeline::frame::Frame;

    fn random_color(rng: &mut StdRng) -> Rgb {
        Rgb::new(rng.gen(), rng.gen(), rng.gen())
    }

    #[test]
    fn contrast_endpoints_hit_the_configured_colours() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let fg = random_color(&mut rng);
            let bg = random_color(&mut rng);
            let max_level = rng.gen_range(1..80);
            assert_eq!(contrast_color(fg, bg, max_level, max_level), fg);
            assert_eq!(contrast_color(fg, bg, 0, max_level), bg);
        }
    }

    #[test]
    fn contrast_position_uses_one_decimal() {
        assert_eq!(contrast_position(4, 9), 0.4);
        assert_eq!(contrast_position(8, 9), 0.8);
        assert_eq!(contrast_position(9, 9), 1.0);
    }

    #[test]
    fn contrast_midpoint_blends() {
        let color = contrast_color(Rgb::new(200, 100, 0), Rgb::new(0, 0, 100), 5, 10);
        assert_eq!(color, Rgb::new(100, 50, 50));
    }

    #[test]
    fn policy_precedence() {
        let plain = RenderConfig::default();
        assert_eq!(ColorPolicy::select(&plain), ColorPolicy::Plain);

        let contrast = RenderConfig::builder().contrast(true).build().unwrap();
        assert_eq!(ColorPolicy::select(&contrast), ColorPolicy::Contrast);

        let both = RenderConfig::builder()
            .contrast(true)
            .effect(Some(Effect::RainbowVertical))
            .build()
            .unwrap();
        assert_eq!(ColorPolicy::select(&both), ColorPolicy::Effect);

        let gradual = RenderConfig::builder()
            .contrast(true)
            .effect(Some(Effect::VideoRainbowGradual))
            .build()
            .unwrap();
        assert_eq!(ColorPolicy::select(&gradual), ColorPolicy::Contrast);
    }

    #[test]
    fn plain_policy_ignores_levels() {
        let config = RenderConfig::default();
        let compositor = ColorCompositor::new(&config, None);
        assert_eq!(compositor.color_for(0, 0, 0), config.foreground());
        assert_eq!(compositor.color_for(9, 3, 1), config.foreground());
        assert_eq!(compositor.canvas_background(), config.background());
    }

    #[test]
    fn effect_policy_reads_the_field() {
        let config =
            RenderConfig::builder().effect(Some(Effect::RainbowHorizontal)).build().unwrap();
        let cells = Frame::from_rgb_image(&image::RgbImage::new(3, 1));
        let field = EffectFieldGenerator::generate(Effect::RainbowHorizontal, &cells).unwrap();
        let compositor = ColorCompositor::new(&config, Some(&field));

        assert_eq!(compositor.policy(), ColorPolicy::Effect);
        assert_eq!(compositor.canvas_background(), Rgb::BLACK);
        assert_eq!(compositor.color_for(0, 0, 0), Rgb::new(255, 0, 0));
        assert_eq!(compositor.color_for(0, 0, 1), field.color_at(0, 1));
    }

    #[test]
    fn missing_field_degrades_to_flags() {
        let config = RenderConfig::builder()
            .effect(Some(Effect::RainbowHorizontal))
            .contrast(true)
            .build()
            .unwrap();
        assert_eq!(ColorCompositor::new(&config, None).policy(), ColorPolicy::Contrast);
    }
}
