use std::fmt;

use crate::error::ConfigError;

/// Ordered glyph ramp, darkest first. Brightness `b` selects glyph
/// `floor(b / step)` with `step = 255 / (len - 1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gradient {
    chars: Vec<char>,
}

impl Gradient {
    pub fn new(chars: impl Into<String>) -> Result<Self, ConfigError> {
        let chars: Vec<char> = chars.into().chars().collect();
        if chars.len() < 2 {
            return Err(ConfigError::GradientTooShort(chars.len()));
        }
        Ok(Self { chars })
    }

    fn preset(chars: &str) -> Self {
        Self { chars: chars.chars().collect() }
    }

    pub fn classic() -> Self {
        Self::preset(" .-;+=xX$█")
    }

    pub fn detailed() -> Self {
        Self::preset(" .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$")
    }

    pub fn standard() -> Self {
        Self::preset(" .:-=+*#%@")
    }

    pub fn blocks() -> Self {
        Self::preset(" ░▒▓█")
    }

    pub fn binary() -> Self {
        Self::preset("01")
    }

    pub fn reversed(mut self) -> Self {
        self.chars.reverse();
        self
    }

    /// Effective gradient for an inversion flag.
    pub fn oriented(self, invert: bool) -> Self {
        if invert {
            self.reversed()
        } else {
            self
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn max_index(&self) -> usize {
        self.chars.len() - 1
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn step(&self) -> f64 {
        255.0 / self.max_index() as f64
    }

    /// Quantizes a brightness value. Integer arithmetic keeps `255` on the last glyph.
    pub fn index(&self, brightness: u8) -> usize {
        let max_index = self.max_index();
        (usize::from(brightness) * max_index / 255).min(max_index)
    }

    pub fn char_at(&self, index: usize) -> char {
        self.chars[index.min(self.max_index())]
    }

    pub fn glyph_for(&self, brightness: u8) -> char {
        self.char_at(self.index(brightness))
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::classic()
    }
}

impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|ch| write!(f, "{ch}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presets() -> Vec<Gradient> {
        vec![
            Gradient::classic(),
            Gradient::detailed(),
            Gradient::standard(),
            Gradient::blocks(),
            Gradient::binary(),
        ]
    }

    #[test]
    fn rejects_degenerate_gradients() {
        assert!(matches!(Gradient::new(""), Err(ConfigError::GradientTooShort(0))));
        assert!(matches!(Gradient::new("#"), Err(ConfigError::GradientTooShort(1))));
        assert!(Gradient::new("█ ").is_ok());
    }

    #[test]
    fn index_is_monotonic() {
        for gradient in presets() {
            let mut previous = 0;
            for brightness in 0..=255u8 {
                let index = gradient.index(brightness);
                assert!(index >= previous, "{gradient}: {brightness} went backwards");
                previous = index;
            }
        }
    }

    #[test]
    fn index_covers_both_ends() {
        for gradient in presets() {
            assert_eq!(gradient.index(0), 0);
            assert_eq!(gradient.index(255), gradient.len() - 1);
        }
    }

    #[test]
    fn mid_gray_on_classic_ramp() {
        let gradient = Gradient::classic();
        assert!((gradient.step() - 28.333).abs() < 1e-3);
        assert_eq!(gradient.index(128), 4);
        assert_eq!(gradient.glyph_for(128), '+');
    }

    #[test]
    fn orientation_reverses_only_when_inverted() {
        let gradient = Gradient::new("ab").unwrap();
        assert_eq!(gradient.clone().oriented(false).to_string(), "ab");
        assert_eq!(gradient.oriented(true).to_string(), "ba");
    }

    #[test]
    fn multibyte_glyphs_count_once() {
        assert_eq!(Gradient::classic().len(), 10);
        assert_eq!(Gradient::blocks().char_at(4), '█');
    }
}
