#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use glyphart_render::{
    AudioClip, AudioSource, FontMetrics, GlyphPainter, RenderError, Result, Rgb, VideoMetadata,
    VideoSink, VideoSource, VideoStream,
};
use image::{DynamicImage, Rgb as Pixel, RgbImage};

/// Fills a `size`x`size` square at every glyph origin.
pub struct BlockPainter {
    pub size: u32,
}

impl GlyphPainter for BlockPainter {
    fn metrics(&self) -> FontMetrics {
        FontMetrics { advance: 4.0, line_height: 8.0 }
    }

    fn draw_glyph(&self, canvas: &mut RgbImage, x: i32, y: i32, _glyph: char, color: Rgb) {
        for dy in 0..self.size as i32 {
            for dx in 0..self.size as i32 {
                let (px, py) = (x + dx, y + dy);
                if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                    canvas.put_pixel(px as u32, py as u32, color.into());
                }
            }
        }
    }
}

pub fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Pixel(color)))
}

/// In-memory video: frame `i` is white when `i` is odd and black otherwise.
pub struct MockVideo {
    pub metadata: VideoMetadata,
    pub requested: Mutex<Vec<f64>>,
}

impl MockVideo {
    pub fn new(width: u32, height: u32, fps: f64, duration: f64) -> Self {
        Self { metadata: VideoMetadata { width, height, fps, duration }, requested: Mutex::new(Vec::new()) }
    }

    pub fn requested(&self) -> Vec<f64> {
        let mut timestamps = self.requested.lock().unwrap().clone();
        timestamps.sort_by(f64::total_cmp);
        timestamps
    }
}

impl VideoSource for MockVideo {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn frame_at(&self, timestamp: f64) -> Result<DynamicImage> {
        self.requested.lock().unwrap().push(timestamp);
        let index = (timestamp * self.metadata.fps).round() as usize;
        let value = if index % 2 == 1 { 255 } else { 0 };
        Ok(solid(self.metadata.width, self.metadata.height, [value; 3]))
    }
}

pub struct MockAudio {
    pub duration: Option<f64>,
}

impl AudioSource for MockAudio {
    fn load_audio(&self) -> Result<Option<AudioClip>> {
        match self.duration {
            Some(duration) => Ok(Some(AudioClip::new("source.mp4", duration)?)),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MockSink {
    pub format: Option<(u32, u32, f64)>,
    pub frames: Vec<RgbImage>,
    pub finished: bool,
    pub audio: Option<AudioClip>,
    pub written: Option<PathBuf>,
    pub aborted: bool,
    pub fail_write: bool,
}

impl VideoSink for MockSink {
    fn begin(&mut self, width: u32, height: u32, fps: f64) -> Result<()> {
        self.format = Some((width, height, fps));
        Ok(())
    }

    fn push_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<VideoStream> {
        self.finished = true;
        let fps = self.format.map(|(_, _, fps)| fps).unwrap_or_default();
        Ok(VideoStream {
            location: PathBuf::from("memory.mp4"),
            frame_count: self.frames.len(),
            fps,
            audio: None,
        })
    }

    fn attach_audio(&mut self, video: VideoStream, audio: &AudioClip) -> Result<VideoStream> {
        self.audio = Some(audio.clone());
        Ok(VideoStream { audio: Some(audio.window), ..video })
    }

    fn write_file(&mut self, _video: VideoStream, destination: &Path) -> Result<()> {
        if self.fail_write {
            return Err(RenderError::Encode { stage: "video", message: "disk full".into() });
        }
        self.written = Some(destination.to_path_buf());
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}
