//! Video, audio and camera collaborators backed by `ffmpeg`/`ffprobe`
//! sidecar processes.

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Output, Stdio};

use image::{DynamicImage, RgbImage};
use log::{debug, info, warn};
use tempfile::TempDir;

use super::source::{AudioClip, AudioSource, VideoMetadata, VideoSink, VideoSource, VideoStream};
use crate::error::{RenderError, Result};
use crate::image_pipeline::loader::FrameSource;

const FFMPEG: &str = "ffmpeg";
const FFPROBE: &str = "ffprobe";

fn ensure_in_path(bin: &str) -> Result<()> {
    which::which(bin).map_err(|_| RenderError::ResourceNotFound { path: PathBuf::from(bin) })?;
    Ok(())
}

fn spawn_error(bin: &'static str, err: std::io::Error) -> RenderError {
    if err.kind() == ErrorKind::NotFound {
        RenderError::ResourceNotFound { path: PathBuf::from(bin) }
    } else {
        RenderError::Io { stage: "spawning ffmpeg", source: err }
    }
}

/// Runs a short-lived tool to completion, mapping failures with `fail`.
fn run(
    command: &mut Command,
    bin: &'static str,
    stage: &'static str,
    fail: fn(&'static str, String) -> RenderError,
) -> Result<Output> {
    debug!("running {command:?}");
    let output = command.stdin(Stdio::null()).output().map_err(|err| spawn_error(bin, err))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fail(stage, format!("{bin} exited with {}: {}", output.status, stderr.trim())));
    }
    Ok(output)
}

fn decode_failure(stage: &'static str, message: String) -> RenderError {
    RenderError::decode(stage, message)
}

fn encode_failure(stage: &'static str, message: String) -> RenderError {
    RenderError::encode(stage, message)
}

/// Parses `key=value` lines printed by `ffprobe -of default=noprint_wrappers=1`.
pub(crate) fn parse_probe_output(text: &str) -> Result<VideoMetadata> {
    let mut width = None;
    let mut height = None;
    let mut fps = None;
    let mut duration = None;

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "r_frame_rate" => fps = parse_rate(value),
            "duration" => duration = duration.or_else(|| value.parse::<f64>().ok()),
            _ => {},
        }
    }

    match (width, height, fps, duration) {
        (Some(width), Some(height), Some(fps), Some(duration)) => {
            Ok(VideoMetadata { width, height, fps, duration })
        },
        _ => Err(RenderError::decode("video metadata", format!("incomplete ffprobe output: {text:?}"))),
    }
}

fn parse_rate(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then(|| num / den)
        },
        None => value.parse().ok(),
    }
}

/// A video file decoded one frame at a time.
pub struct FfmpegSource {
    path: PathBuf,
    metadata: VideoMetadata,
    has_audio: bool,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RenderError::ResourceNotFound { path: path.to_path_buf() });
        }
        ensure_in_path(FFMPEG)?;
        ensure_in_path(FFPROBE)?;

        let probe = run(
            Command::new(FFPROBE)
                .args(["-v", "error", "-select_streams", "v:0"])
                .args(["-show_entries", "stream=width,height,r_frame_rate:format=duration"])
                .args(["-of", "default=noprint_wrappers=1"])
                .arg(path),
            FFPROBE,
            "video metadata",
            decode_failure,
        )?;
        let metadata = parse_probe_output(&String::from_utf8_lossy(&probe.stdout))?;

        let audio = run(
            Command::new(FFPROBE)
                .args(["-v", "error", "-select_streams", "a"])
                .args(["-show_entries", "stream=index", "-of", "csv=p=0"])
                .arg(path),
            FFPROBE,
            "audio metadata",
            decode_failure,
        )?;
        let has_audio = !String::from_utf8_lossy(&audio.stdout).trim().is_empty();

        info!(
            "opened {}: {}x{}, {:.3} fps, {:.3}s, audio: {}",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.duration,
            has_audio
        );
        Ok(Self { path: path.to_path_buf(), metadata, has_audio })
    }
}

impl VideoSource for FfmpegSource {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn frame_at(&self, timestamp: f64) -> Result<DynamicImage> {
        let output = run(
            Command::new(FFMPEG)
                .args(["-hide_banner", "-loglevel", "error"])
                .args(["-ss", &format!("{timestamp:.6}")])
                .arg("-i")
                .arg(&self.path)
                .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"]),
            FFMPEG,
            "video frame",
            decode_failure,
        )?;

        let VideoMetadata { width, height, .. } = self.metadata;
        let expected = width as usize * height as usize * 3;
        if output.stdout.len() != expected {
            return Err(RenderError::decode(
                "video frame",
                format!(
                    "frame at {timestamp:.3}s has {} bytes, expected {expected}",
                    output.stdout.len()
                ),
            ));
        }

        RgbImage::from_raw(width, height, output.stdout)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| RenderError::decode("video frame", "raw frame buffer size mismatch"))
    }
}

impl AudioSource for FfmpegSource {
    fn load_audio(&self) -> Result<Option<AudioClip>> {
        if !self.has_audio {
            return Ok(None);
        }
        Ok(Some(AudioClip::new(&self.path, self.metadata.duration)?))
    }
}

struct Encoder {
    child: Child,
    stdin: ChildStdin,
    frame_size: usize,
}

/// Encodes frames to H.264 in a scratch directory; nothing reaches the
/// destination until `write_file`.
pub struct FfmpegSink {
    scratch: TempDir,
    encoder: Option<Encoder>,
    fps: f64,
    frames: usize,
    partial: Option<PathBuf>,
}

impl FfmpegSink {
    pub fn new() -> Result<Self> {
        ensure_in_path(FFMPEG)?;
        let scratch = tempfile::tempdir().map_err(RenderError::io("creating scratch directory"))?;
        Ok(Self { scratch, encoder: None, fps: 0.0, frames: 0, partial: None })
    }

    fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }
}

impl VideoSink for FfmpegSink {
    fn begin(&mut self, width: u32, height: u32, fps: f64) -> Result<()> {
        let output = self.scratch_path("frames.mp4");
        let mut command = Command::new(FFMPEG);
        command
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s:v", &format!("{width}x{height}")])
            .args(["-r", &format!("{fps}")])
            .args(["-i", "-", "-an"])
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(&output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        debug!("spawning encoder {command:?}");
        let mut child = command.spawn().map_err(|err| spawn_error(FFMPEG, err))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::encode("video", "failed to capture ffmpeg stdin"))?;

        self.encoder = Some(Encoder { child, stdin, frame_size: width as usize * height as usize * 3 });
        self.fps = fps;
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| RenderError::encode("video", "frame pushed before the encoder started"))?;

        let bytes = frame.as_raw();
        if bytes.len() != encoder.frame_size {
            return Err(RenderError::encode(
                "video",
                format!("frame has {} bytes, expected {}", bytes.len(), encoder.frame_size),
            ));
        }
        encoder
            .stdin
            .write_all(bytes)
            .map_err(|err| RenderError::encode("video", format!("ffmpeg stopped accepting frames: {err}")))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<VideoStream> {
        let Encoder { mut child, stdin, .. } = self
            .encoder
            .take()
            .ok_or_else(|| RenderError::encode("video", "no frames were assembled"))?;
        drop(stdin);

        let status = child.wait().map_err(RenderError::io("waiting for ffmpeg"))?;
        if !status.success() {
            return Err(RenderError::encode("video", format!("ffmpeg exited with {status}")));
        }

        Ok(VideoStream {
            location: self.scratch_path("frames.mp4"),
            frame_count: self.frames,
            fps: self.fps,
            audio: None,
        })
    }

    fn attach_audio(&mut self, video: VideoStream, audio: &AudioClip) -> Result<VideoStream> {
        let output = self.scratch_path("muxed.mp4");
        run(
            Command::new(FFMPEG)
                .args(["-hide_banner", "-loglevel", "error", "-y"])
                .arg("-i")
                .arg(&video.location)
                .args(["-ss", &format!("{:.6}", audio.window.start)])
                .args(["-t", &format!("{:.6}", audio.window.duration())])
                .arg("-i")
                .arg(&audio.source)
                .args(["-map", "0:v:0", "-map", "1:a:0"])
                .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
                .arg(&output),
            FFMPEG,
            "muxed audio",
            encode_failure,
        )?;

        Ok(VideoStream { location: output, audio: Some(audio.window), ..video })
    }

    fn write_file(&mut self, video: VideoStream, destination: &Path) -> Result<()> {
        let partial = destination.with_extension("part");
        self.partial = Some(partial.clone());
        fs::copy(&video.location, &partial).map_err(RenderError::io("writing output"))?;
        fs::rename(&partial, destination).map_err(RenderError::io("writing output"))?;
        self.partial = None;
        info!("saved {} frames to {}", video.frame_count, destination.display());
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(mut encoder) = self.encoder.take() {
            let _ = encoder.child.kill();
            let _ = encoder.child.wait();
        }
        if let Some(partial) = self.partial.take() {
            let _ = fs::remove_file(partial);
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(target_os = "linux")]
const CAPTURE_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const CAPTURE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAPTURE_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CAPTURE_FORMAT: &str = "v4l2";

/// Camera frames read from an ffmpeg capture-device pipe.
pub struct FfmpegCapture {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
}

impl FfmpegCapture {
    pub fn open(device: &str, width: u32, height: u32, fps: u32) -> Result<Self> {
        ensure_in_path(FFMPEG)?;
        let mut command = Command::new(FFMPEG);
        command
            .args(["-hide_banner", "-loglevel", "error"])
            .args(["-f", CAPTURE_FORMAT])
            .args(["-video_size", &format!("{width}x{height}")])
            .args(["-framerate", &fps.to_string()])
            .args(["-i", device])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-s", &format!("{width}x{height}")])
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        debug!("spawning capture {command:?}");
        let mut child = command.spawn().map_err(|err| spawn_error(FFMPEG, err))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::decode("camera", "failed to capture ffmpeg stdout"))?;

        info!("capturing {device} at {width}x{height}");
        Ok(Self { child, stdout, width, height })
    }
}

impl FrameSource for FfmpegCapture {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Option<DynamicImage> {
        let mut buffer = vec![0u8; self.width as usize * self.height as usize * 3];
        if let Err(err) = self.stdout.read_exact(&mut buffer) {
            warn!("camera stream ended: {err}");
            return None;
        }
        RgbImage::from_raw(self.width, self.height, buffer).map(DynamicImage::ImageRgb8)
    }
}

impl Drop for FfmpegCapture {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
