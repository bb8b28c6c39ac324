use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::image_pipeline::color::{hue_to_rgb, Rgb, HUE_RANGE};
use crate::image_pipeline::frame::Frame;

/// Colour effects replacing the plain and contrast policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    RainbowHorizontal,
    RainbowHorizontalRev,
    RainbowVertical,
    RainbowVerticalRev,
    RainbowRadial,
    RainbowRadialRev,
    OriginalColor,
    /// Original colours, photometrically inverted.
    OriginalColorInverted,
    /// Video only: the whole foreground cycles through hues, one step per frame.
    VideoRainbowGradual,
}

impl Effect {
    pub const ALL: [Effect; 9] = [
        Effect::RainbowHorizontal,
        Effect::RainbowHorizontalRev,
        Effect::RainbowVertical,
        Effect::RainbowVerticalRev,
        Effect::RainbowRadial,
        Effect::RainbowRadialRev,
        Effect::OriginalColor,
        Effect::OriginalColorInverted,
        Effect::VideoRainbowGradual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::RainbowHorizontal => "rainbow-horizontal",
            Effect::RainbowHorizontalRev => "rainbow-horizontal-rev",
            Effect::RainbowVertical => "rainbow-vertical",
            Effect::RainbowVerticalRev => "rainbow-vertical-rev",
            Effect::RainbowRadial => "rainbow-radial",
            Effect::RainbowRadialRev => "rainbow-radial-rev",
            Effect::OriginalColor => "original-color",
            Effect::OriginalColorInverted => "original-color-inverted",
            Effect::VideoRainbowGradual => "video-rainbow-gradual",
        }
    }

    /// Whether the effect produces a per-cell field.
    pub fn is_spatial(&self) -> bool {
        !matches!(self, Effect::VideoRainbowGradual)
    }

    /// Whole-frame foreground for time-driven effects.
    pub fn override_foreground(&self, frame_index: usize) -> Option<Rgb> {
        match self {
            Effect::VideoRainbowGradual => {
                let hue = (2 * frame_index) % (usize::from(HUE_RANGE) + 1);
                Some(hue_to_rgb(hue as u16))
            },
            _ => None,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Effect::ALL
            .into_iter()
            .find(|effect| effect.name() == normalized)
            .ok_or_else(|| ConfigError::UnknownEffect(value.to_owned()))
    }
}

/// Per-cell colour override grid, one entry per downsampled cell.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectField {
    /// Half-turn hues in `0..=180`.
    Hues { columns: u32, rows: u32, hues: Vec<u8> },
    Colors { columns: u32, rows: u32, colors: Vec<Rgb> },
}

impl EffectField {
    pub fn columns(&self) -> u32 {
        match self {
            EffectField::Hues { columns, .. } | EffectField::Colors { columns, .. } => *columns,
        }
    }

    pub fn rows(&self) -> u32 {
        match self {
            EffectField::Hues { rows, .. } | EffectField::Colors { rows, .. } => *rows,
        }
    }

    pub fn hue_at(&self, row: u32, col: u32) -> Option<u8> {
        match self {
            EffectField::Hues { hues, .. } => Some(hues[self.index(row, col)]),
            EffectField::Colors { .. } => None,
        }
    }

    pub fn color_at(&self, row: u32, col: u32) -> Rgb {
        let idx = self.index(row, col);
        match self {
            EffectField::Hues { hues, .. } => hue_to_rgb(u16::from(hues[idx])),
            EffectField::Colors { colors, .. } => colors[idx],
        }
    }

    fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.columns() as usize + col as usize
    }
}

#[derive(Clone, Copy, Debug)]
struct Shape {
    columns: u32,
    rows: u32,
}

type HueFn = fn(Shape, u32, u32) -> u8;

pub struct EffectFieldGenerator;

impl EffectFieldGenerator {
    /// Builds the field for `effect` over the downsampled `cells`. Time-driven
    /// effects have no field.
    pub fn generate(effect: Effect, cells: &Frame) -> Option<EffectField> {
        let shape = Shape { columns: cells.width(), rows: cells.height() };
        match effect {
            Effect::RainbowHorizontal => Some(hue_field(shape, horizontal_hue, false)),
            Effect::RainbowHorizontalRev => Some(hue_field(shape, horizontal_hue, true)),
            Effect::RainbowVertical => Some(hue_field(shape, vertical_hue, false)),
            Effect::RainbowVerticalRev => Some(hue_field(shape, vertical_hue, true)),
            Effect::RainbowRadial => Some(hue_field(shape, radial_hue, false)),
            Effect::RainbowRadialRev => Some(hue_field(shape, radial_hue, true)),
            Effect::OriginalColor => Some(color_field(cells, false)),
            Effect::OriginalColorInverted => Some(color_field(cells, true)),
            Effect::VideoRainbowGradual => None,
        }
    }
}

fn hue_field(shape: Shape, hue: HueFn, reverse: bool) -> EffectField {
    let mut hues = Vec::with_capacity(shape.columns as usize * shape.rows as usize);
    for row in 0..shape.rows {
        for col in 0..shape.columns {
            let value = hue(shape, row, col).min(HUE_RANGE as u8);
            hues.push(if reverse { HUE_RANGE as u8 - value } else { value });
        }
    }
    EffectField::Hues { columns: shape.columns, rows: shape.rows, hues }
}

fn horizontal_hue(shape: Shape, _row: u32, col: u32) -> u8 {
    (u32::from(HUE_RANGE) * col / shape.columns.max(1)) as u8
}

fn vertical_hue(shape: Shape, row: u32, _col: u32) -> u8 {
    (u32::from(HUE_RANGE) * row / shape.rows.max(1)) as u8
}

fn radial_hue(shape: Shape, row: u32, col: u32) -> u8 {
    let center_row = f64::from(shape.rows / 2);
    let center_col = f64::from(shape.columns / 2);
    let max_distance = center_row.hypot(center_col).ceil();
    if max_distance == 0.0 {
        return HUE_RANGE as u8;
    }

    let distance = (center_row - f64::from(row)).hypot(center_col - f64::from(col));
    let closeness = ((max_distance - distance) / max_distance).max(0.0);
    (closeness * f64::from(HUE_RANGE)).floor().min(f64::from(HUE_RANGE)) as u8
}

fn color_field(cells: &Frame, invert: bool) -> EffectField {
    let colors = cells
        .pixels()
        .iter()
        .map(|pixel| {
            let color = pixel.to_rgb();
            if invert {
                color.inverted()
            } else {
                color
            }
        })
        .collect();
    EffectField::Colors { columns: cells.width(), rows: cells.height(), colors }
}

#[cfg(test)]
mod tests {
    use image::{Rgb as Pixel, RgbImage};

    use super::*;

    fn cells(columns: u32, rows: u32) -> Frame {
        Frame::from_rgb_image(&RgbImage::new(columns, rows))
    }

    #[test]
    fn horizontal_spans_the_hue_range() {
        let field = EffectFieldGenerator::generate(Effect::RainbowHorizontal, &cells(10, 3)).unwrap();
        for row in 0..3 {
            assert_eq!(field.hue_at(row, 0), Some(0));
            assert_eq!(field.hue_at(row, 9), Some(162));
        }
    }

    #[test]
    fn reversed_variants_mirror_hues() {
        for (forward, reverse) in [
            (Effect::RainbowHorizontal, Effect::RainbowHorizontalRev),
            (Effect::RainbowVertical, Effect::RainbowVerticalRev),
            (Effect::RainbowRadial, Effect::RainbowRadialRev),
        ] {
            let frame = cells(7, 5);
            let forward = EffectFieldGenerator::generate(forward, &frame).unwrap();
            let reverse = EffectFieldGenerator::generate(reverse, &frame).unwrap();
            for row in 0..5 {
                for col in 0..7 {
                    let hue = forward.hue_at(row, col).unwrap();
                    assert_eq!(reverse.hue_at(row, col), Some(180 - hue));
                }
            }
        }
    }

    #[test]
    fn vertical_depends_on_row_only() {
        let field = EffectFieldGenerator::generate(Effect::RainbowVertical, &cells(4, 6)).unwrap();
        for col in 0..4 {
            assert_eq!(field.hue_at(0, col), Some(0));
            assert_eq!(field.hue_at(3, col), Some(90));
        }
    }

    #[test]
    fn radial_peaks_at_center() {
        let field = EffectFieldGenerator::generate(Effect::RainbowRadial, &cells(9, 7)).unwrap();
        let center = field.hue_at(3, 4).unwrap();
        assert_eq!(center, 180);

        for row in 0..7u32 {
            for col in 0..9u32 {
                assert!(field.hue_at(row, col).unwrap() <= center);
            }
        }

        // Moving outward along the centre row never increases the hue.
        let mut previous = center;
        for col in 5..9 {
            let hue = field.hue_at(3, col).unwrap();
            assert!(hue <= previous);
            previous = hue;
        }
    }

    #[test]
    fn single_cell_radial_is_center() {
        let field = EffectFieldGenerator::generate(Effect::RainbowRadial, &cells(1, 1)).unwrap();
        assert_eq!(field.hue_at(0, 0), Some(180));
    }

    #[test]
    fn original_color_passes_pixels_through() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Pixel([255, 0, 0]));
        image.put_pixel(1, 0, Pixel([0, 0, 255]));
        let frame = Frame::from_rgb_image(&image);

        let field = EffectFieldGenerator::generate(Effect::OriginalColor, &frame).unwrap();
        assert_eq!(field.color_at(0, 0), Rgb::new(255, 0, 0));
        assert_eq!(field.color_at(0, 1), Rgb::new(0, 0, 255));
        assert_eq!(field.hue_at(0, 0), None);

        let inverted = EffectFieldGenerator::generate(Effect::OriginalColorInverted, &frame).unwrap();
        assert_eq!(inverted.color_at(0, 0), Rgb::new(0, 255, 255));
    }

    #[test]
    fn gradual_rainbow_has_no_field() {
        assert!(EffectFieldGenerator::generate(Effect::VideoRainbowGradual, &cells(3, 3)).is_none());
        assert!(!Effect::VideoRainbowGradual.is_spatial());
    }

    #[test]
    fn gradual_rainbow_cycles_every_181_frames() {
        let effect = Effect::VideoRainbowGradual;
        assert_eq!(effect.override_foreground(0), Some(Rgb::new(255, 0, 0)));
        assert_eq!(effect.override_foreground(30), Some(hue_to_rgb(60)));
        assert_eq!(effect.override_foreground(181), effect.override_foreground(0));
        assert_eq!(Effect::RainbowRadial.override_foreground(3), None);
    }

    #[test]
    fn names_parse_back() {
        for effect in Effect::ALL {
            assert_eq!(effect.name().parse::<Effect>().unwrap(), effect);
        }
        assert_eq!("RAINBOW_VERTICAL_REV".parse::<Effect>().unwrap(), Effect::RainbowVerticalRev);
        assert!("sparkles".parse::<Effect>().is_err());
    }
}
