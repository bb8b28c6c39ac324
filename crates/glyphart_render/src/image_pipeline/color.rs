use log::warn;

use crate::error::ConfigError;

/// Hue range of the half-turn convention used by [`Hsv`] and the effect fields.
pub const HUE_RANGE: u16 = 180;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Strict conversion from wide integer components.
    pub fn from_components(name: &'static str, components: [i64; 3]) -> Result<Self, ConfigError> {
        let mut channels = [0u8; 3];
        for (channel, value) in channels.iter_mut().zip(components) {
            *channel =
                u8::try_from(value).map_err(|_| ConfigError::ColorOutOfRange { name, value })?;
        }
        Ok(Self::from(channels))
    }

    /// Lenient conversion: out-of-range components select `fallback` and log a warning.
    pub fn from_components_or(name: &'static str, components: [i64; 3], fallback: Rgb) -> Self {
        match Self::from_components(name, components) {
            Ok(color) => color,
            Err(err) => {
                warn!("{err}; using default {name} {:?}", fallback.to_array());
                fallback
            },
        }
    }

    /// Parses `R,G,B` into raw components without range checking.
    pub fn parse_components(text: &str) -> Result<[i64; 3], ConfigError> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ConfigError::MalformedColor(text.to_owned()));
        }

        let mut components = [0i64; 3];
        for (component, part) in components.iter_mut().zip(parts) {
            *component =
                part.parse().map_err(|_| ConfigError::MalformedColor(text.to_owned()))?;
        }
        Ok(components)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(color: Rgb) -> Self {
        image::Rgb(color.to_array())
    }
}

/// 8-bit HSV triple. Hue covers `0..180` (two degrees per step), saturation and
/// value cover `0..=255`, value being the brightest RGB channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    pub fn from_rgb(color: Rgb) -> Self {
        let (r, g, b) = (f32::from(color.r), f32::from(color.g), f32::from(color.b));
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

        let degrees = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };

        let h = (degrees.rem_euclid(360.0) / 2.0).round() as u16 % HUE_RANGE;
        Self { h: h as u8, s: s.round() as u8, v: max as u8 }
    }

    pub fn to_rgb(self) -> Rgb {
        hsv_to_rgb(
            f32::from(self.h) * 2.0,
            f32::from(self.s) / 255.0,
            f32::from(self.v) / 255.0,
        )
    }
}

/// Fully saturated, full value colour for a half-turn hue. Hue 180 wraps to red.
pub fn hue_to_rgb(hue: u16) -> Rgb {
    hsv_to_rgb(f32::from(hue) * 2.0, 1.0, 1.0)
}

fn hsv_to_rgb(degrees: f32, saturation: f32, value: f32) -> Rgb {
    let sector = degrees.rem_euclid(360.0) / 60.0;
    let chroma = value * saturation;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = value - chroma;

    let (r, g, b) = match sector as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let channel = |c: f32| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(hue_to_rgb(0), Rgb::new(255, 0, 0));
        assert_eq!(hue_to_rgb(60), Rgb::new(0, 255, 0));
        assert_eq!(hue_to_rgb(120), Rgb::new(0, 0, 255));
        assert_eq!(hue_to_rgb(180), hue_to_rgb(0));
    }

    #[test]
    fn value_channel_is_brightest_component() {
        let hsv = Hsv::from_rgb(Rgb::new(10, 200, 90));
        assert_eq!(hsv.v, 200);

        let gray = Hsv::from_rgb(Rgb::new(128, 128, 128));
        assert_eq!(gray, Hsv::new(0, 0, 128));
        assert_eq!(gray.to_rgb(), Rgb::new(128, 128, 128));
    }

    #[test]
    fn saturated_colours_survive_hsv() {
        for color in [Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255)] {
            assert_eq!(Hsv::from_rgb(color).to_rgb(), color);
        }
    }

    #[test]
    fn strict_components_reject_out_of_range() {
        assert!(matches!(
            Rgb::from_components("foreground", [0, 256, 3]),
            Err(ConfigError::ColorOutOfRange { value: 256, .. })
        ));
        assert_eq!(Rgb::from_components("foreground", [1, 2, 3]).unwrap(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn lenient_components_fall_back() {
        let fallback = Rgb::new(66, 5, 5);
        assert_eq!(Rgb::from_components_or("background", [-1, 0, 0], fallback), fallback);
    }

    #[test]
    fn parses_component_triples() {
        assert_eq!(Rgb::parse_components("64, 255,0").unwrap(), [64, 255, 0]);
        assert_eq!(Rgb::parse_components("300,0,-2").unwrap(), [300, 0, -2]);
        assert!(Rgb::parse_components("1,2").is_err());
        assert!(Rgb::parse_components("a,b,c").is_err());
    }
}
