use image::DynamicImage;

use super::frame::Frame;
use crate::error::InvalidInput;

/// Size of the downsampled cell grid, before horizontal glyph repetition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetGeometry {
    pub columns: u32,
    pub rows: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// One cell per `n`x`n` pixel block.
    GlyphSize(u32),
    /// Fit `columns` characters of text, each cell spanning `repeat` characters.
    FitColumns { columns: u32, repeat: u32 },
}

impl LayoutPolicy {
    pub fn derive(&self, source_width: u32, source_height: u32) -> Result<TargetGeometry, InvalidInput> {
        match *self {
            LayoutPolicy::GlyphSize(glyph_size) => {
                let glyph_size = glyph_size.max(1);
                let columns = source_width / glyph_size;
                let rows = source_height / glyph_size;
                if columns == 0 || rows == 0 {
                    return Err(InvalidInput::FrameTooSmall {
                        width: source_width,
                        height: source_height,
                        glyph_size,
                    });
                }
                Ok(TargetGeometry { columns, rows })
            },
            LayoutPolicy::FitColumns { columns, repeat } => {
                let cells = columns / repeat.max(1);
                let too_few = InvalidInput::TooFewColumns {
                    columns,
                    width: source_width,
                    height: source_height,
                };
                if cells == 0 || source_width == 0 {
                    return Err(too_few);
                }

                // Rows scale by the same width/cells factor, kept in integers.
                let rows = u64::from(source_height) * u64::from(cells) / u64::from(source_width);
                let rows = u32::try_from(rows).unwrap_or(u32::MAX);
                if rows == 0 {
                    return Err(too_few);
                }
                Ok(TargetGeometry { columns: cells, rows })
            },
        }
    }
}

/// Area-averages the frame down to one pixel per glyph cell.
pub fn downsample(image: &DynamicImage, geometry: TargetGeometry) -> Frame {
    let resized = image.thumbnail_exact(geometry.columns, geometry.rows);
    Frame::from_image(&resized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_size_floors_dimensions() {
        let geometry = LayoutPolicy::GlyphSize(8).derive(100, 61).unwrap();
        assert_eq!(geometry, TargetGeometry { columns: 12, rows: 7 });
    }

    #[test]
    fn frame_smaller_than_a_glyph_is_rejected() {
        let err = LayoutPolicy::GlyphSize(8).derive(7, 100).unwrap_err();
        assert!(matches!(err, InvalidInput::FrameTooSmall { width: 7, .. }));
        assert!(LayoutPolicy::GlyphSize(8).derive(100, 0).is_err());
    }

    #[test]
    fn fit_columns_accounts_for_repeat() {
        let geometry =
            LayoutPolicy::FitColumns { columns: 120, repeat: 3 }.derive(400, 200).unwrap();
        assert_eq!(geometry, TargetGeometry { columns: 40, rows: 20 });
    }

    #[test]
    fn fit_columns_always_yields_every_cell() {
        for columns in [80, 120, 160, 220] {
            let cells = columns / 3;
            for width in 1..2000 {
                let layout = LayoutPolicy::FitColumns { columns, repeat: 3 };
                let geometry = layout.derive(width, 2000).unwrap();
                assert_eq!(geometry.columns, cells, "width {width}, columns {columns}");
                assert_eq!(geometry.rows as u64, 2000 * u64::from(cells) / u64::from(width));
            }
        }
        let geometry = LayoutPolicy::FitColumns { columns: 80, repeat: 3 }.derive(1, 1).unwrap();
        assert_eq!(geometry, TargetGeometry { columns: 26, rows: 26 });
    }

    #[test]
    fn fit_columns_needs_one_cell() {
        let layout = LayoutPolicy::FitColumns { columns: 2, repeat: 3 };
        assert!(matches!(layout.derive(400, 200), Err(InvalidInput::TooFewColumns { .. })));
    }

    #[test]
    fn uniform_frames_keep_brightness_when_downsampled() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            100,
            100,
            image::Rgb([128, 128, 128]),
        ));
        let frame = downsample(&image, TargetGeometry { columns: 12, rows: 12 });
        assert!(frame.pixels().iter().all(|pixel| pixel.v == 128));
    }
}
