use image::{DynamicImage, RgbImage};

use super::color::{Hsv, Rgb};

/// HSV raster in row-major order. The value channel drives glyph selection,
/// hue and saturation are kept for the original-colour effect.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Hsv>,
}

impl Frame {
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let pixels = image.pixels().map(|pixel| Hsv::from_rgb(Rgb::from(pixel.0))).collect();
        Self { width: image.width(), height: image.height(), pixels }
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from_rgb_image(&image.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Hsv] {
        &self.pixels
    }

    pub fn pixel(&self, row: u32, col: u32) -> Hsv {
        self.pixels[row as usize * self.width as usize + col as usize]
    }

    pub fn brightness(&self, row: u32, col: u32) -> u8 {
        self.pixel(row, col).v
    }
}
