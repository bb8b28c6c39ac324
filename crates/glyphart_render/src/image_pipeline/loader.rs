use std::path::Path;

use image::{DynamicImage, GenericImageView};
use log::debug;

use crate::error::{RenderError, Result};

/// Anything that yields frames one after another: a still image, a camera.
pub trait FrameSource {
    fn dimensions(&self) -> (u32, u32);
    /// `None` once the source is exhausted or has failed.
    fn next_frame(&mut self) -> Option<DynamicImage>;
}

pub struct StaticFrame {
    image: DynamicImage,
}

impl StaticFrame {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }
}

impl FrameSource for StaticFrame {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn next_frame(&mut self) -> Option<DynamicImage> {
        Some(self.image.clone())
    }
}

/// Decodes an image file, failing fast when the path does not exist.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(RenderError::ResourceNotFound { path: path.to_path_buf() });
    }

    let image = image::open(path)?;
    let (width, height) = image.dimensions();
    debug!("loaded image {}x{} from {}", width, height, path.display());
    Ok(image)
}
