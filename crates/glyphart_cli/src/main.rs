mod settings;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use glyphart_render::image::DynamicImage;
use glyphart_render::{
    load_image, CancelToken, FfmpegCapture, FfmpegSink, FfmpegSource, FontdueRasterizer,
    GlyphArtRenderer, GlyphPainter, LiveSession, PipelineOptions, RenderConfig, RenderError, TextOptions,
    TextRenderer, VideoPipeline, DEFAULT_POLL_INTERVAL, TEXT_REPEAT,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use walkdir::WalkDir;

use settings::{RenderArgs, ResolvedSettings};

const IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "ico", "pnm", "ppm", "pgm", "tif", "tiff", "webp"];

#[derive(Parser, Debug)]
#[command(author, version, about = "Render images, videos and camera feeds as glyph art")]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a still image to a PNG
    Image(ImageArgs),
    /// Print an image as text in the terminal
    Preview(PreviewArgs),
    /// Render every image in a directory tree
    Batch(BatchArgs),
    /// Convert a video, keeping its audio
    Video(VideoArgs),
    /// Show a camera feed as text in the terminal, optionally keeping a PNG raster
    Live(LiveArgs),
}

#[derive(Parser, Debug)]
struct ImageArgs {
    /// Input image path
    input: PathBuf,
    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input image path
    input: PathBuf,
    /// Text width in characters
    #[arg(long, default_value_t = 220)]
    columns: u32,
    /// Characters per downsampled cell
    #[arg(long, default_value_t = TEXT_REPEAT)]
    repeat: u32,
    /// Colour the text with 24-bit ANSI escapes
    #[arg(long, default_value_t = false)]
    color: bool,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory searched recursively for images
    input: PathBuf,
    /// Output directory; the input tree is mirrored as PNG files
    #[arg(short, long)]
    output: PathBuf,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    /// Input video path
    input: PathBuf,
    /// Output video path
    #[arg(short, long)]
    output: PathBuf,
    /// Start time in seconds
    #[arg(long)]
    start: Option<f64>,
    /// End time in seconds
    #[arg(long)]
    end: Option<f64>,
    /// Frames converted in parallel (defaults to the number of CPUs)
    #[arg(long)]
    workers: Option<usize>,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct LiveArgs {
    /// Capture device passed to ffmpeg
    #[arg(long, default_value = default_device())]
    device: String,
    #[arg(long, default_value_t = 640)]
    width: u32,
    #[arg(long, default_value_t = 480)]
    height: u32,
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Minimum milliseconds between two rendered frames
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    interval_ms: u64,
    /// Text width in characters
    #[arg(long, default_value_t = 160)]
    columns: u32,
    /// Colour the text with 24-bit ANSI escapes
    #[arg(long, default_value_t = false)]
    color: bool,
    /// Also draw every rendered frame with --font and keep the latest one in this PNG
    #[arg(long)]
    png: Option<PathBuf>,
    #[command(flatten)]
    render: RenderArgs,
}

fn default_device() -> &'static str {
    if cfg!(target_os = "macos") {
        "0"
    } else if cfg!(target_os = "windows") {
        "video=Integrated Camera"
    } else {
        "/dev/video0"
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Image(args) => image(args),
        Commands::Preview(args) => preview(args),
        Commands::Batch(args) => batch(args),
        Commands::Video(args) => video(args),
        Commands::Live(args) => live(args),
    }
}

fn load_painter(settings: &ResolvedSettings) -> Result<FontdueRasterizer> {
    let path = settings.font()?;
    let config = &settings.config;
    let mut painter = FontdueRasterizer::load(path, config.glyph_size() as f32)
        .with_context(|| format!("failed to load font {:?}", path))?;
    painter.prepare(config.gradient().chars());
    Ok(painter)
}

fn image(args: ImageArgs) -> Result<()> {
    let settings = args.render.resolve()?;
    let painter = load_painter(&settings)?;
    let renderer = GlyphArtRenderer::new(&settings.config, &painter);

    let frame = renderer
        .render_path(&args.input)
        .with_context(|| format!("failed to render {:?}", args.input))?;
    frame.save(&args.output).with_context(|| format!("failed to write {:?}", args.output))?;

    let (width, height) = frame.dimensions();
    info!("wrote {}x{} {:?} render to {:?}", width, height, frame.policy, args.output);
    Ok(())
}

fn preview(args: PreviewArgs) -> Result<()> {
    let settings = args.render.resolve()?;
    let options = TextOptions { columns: args.columns, repeat: args.repeat, ansi: args.color };
    let image = load_image(&args.input).with_context(|| format!("failed to open {:?}", args.input))?;

    let text = TextRenderer::new(&settings.config, options)
        .render(&image)
        .with_context(|| format!("failed to render {:?}", args.input))?;
    print!("{text}");
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn batch(args: BatchArgs) -> Result<()> {
    let settings = args.render.resolve()?;
    let painter = load_painter(&settings)?;
    let renderer = GlyphArtRenderer::new(&settings.config, &painter);

    let mut inputs: Vec<PathBuf> = WalkDir::new(&args.input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
        .map(|entry| entry.path().to_path_buf())
        .collect();
    inputs.sort();
    if inputs.is_empty() {
        anyhow::bail!("no image files found in {:?}", args.input);
    }

    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images")?
            .progress_chars("=> "),
    );

    let mut failed = 0;
    for input in &inputs {
        let relative = input.strip_prefix(&args.input).unwrap_or(input);
        let output = args.output.join(relative).with_extension("png");
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {:?}", parent))?;
        }

        match renderer.render_path(input).and_then(|frame| frame.save(&output)) {
            Ok(()) => {},
            Err(err) => {
                warn!("skipping {:?}: {err}", input);
                failed += 1;
            },
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("Renders written to {:?}", args.output));
    info!("converted {} of {} images", inputs.len() - failed, inputs.len());
    Ok(())
}

fn cancel_on_ctrlc() -> Result<CancelToken> {
    let cancel = CancelToken::new();
    let handler = cancel.clone();
    ctrlc::set_handler(move || handler.cancel()).context("failed to install Ctrl-C handler")?;
    Ok(cancel)
}

fn video(args: VideoArgs) -> Result<()> {
    let settings = args.render.resolve()?;
    let painter = load_painter(&settings)?;
    let cancel = cancel_on_ctrlc()?;

    let mut options = PipelineOptions { start: args.start, end: args.end, cancel, ..Default::default() };
    if let Some(workers) = args.workers {
        options.workers = workers;
    }

    let source = FfmpegSource::open(&args.input)
        .with_context(|| format!("failed to open video {:?}", args.input))?;
    let mut sink = FfmpegSink::new()?;
    let mut pipeline = VideoPipeline::new(&settings.config, &painter, options)?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames {msg}",
        )?
        .progress_chars("=> "),
    );

    let report = pipeline.run(&source, &source, &mut sink, &args.output, |update| {
        progress.set_length(update.total as u64);
        progress.set_position(update.completed as u64);
        progress.set_message(update.state.to_string());
    });

    match report {
        Ok(report) => {
            progress.finish_with_message(format!("saved to {:?}", report.destination));
            info!(
                "{} frames of {}x{} at {:.3} fps, audio {:?}",
                report.frame_count, report.frame_size.0, report.frame_size.1, report.fps, report.audio
            );
            Ok(())
        },
        Err(err) => {
            progress.abandon();
            if matches!(err.root_cause(), RenderError::Cancelled) {
                warn!("conversion cancelled, nothing was written");
            }
            Err(err).with_context(|| format!("failed to convert {:?}", args.input))
        },
    }
}

fn live(args: LiveArgs) -> Result<()> {
    let settings = args.render.resolve()?;
    let cancel = cancel_on_ctrlc()?;
    let config: &RenderConfig = &settings.config;

    let mut capture = FfmpegCapture::open(&args.device, args.width, args.height, args.fps)
        .with_context(|| format!("failed to open camera {}", args.device))?;
    let options = TextOptions { columns: args.columns, ansi: args.color, ..Default::default() };
    let renderer = TextRenderer::new(config, options);
    let session = LiveSession::new(cancel).with_interval(Duration::from_millis(args.interval_ms));

    let painter = match &args.png {
        Some(_) => Some(load_painter(&settings)?),
        None => None,
    };
    let raster = painter.as_ref().map(|painter| GlyphArtRenderer::new(config, painter));

    print!("\x1b[2J");
    let stats = session.run(&mut capture, |frame| {
        if let (Some(raster), Some(path)) = (&raster, &args.png) {
            write_live_raster(raster, frame, path)?;
        }
        let text = renderer.render(frame)?;
        let mut stdout = io::stdout().lock();
        write!(stdout, "\x1b[H{text}")
            .and_then(|()| stdout.flush())
            .map_err(|source| RenderError::Io { stage: "writing to the terminal", source })
    })?;

    info!("rendered {} of {} camera frames", stats.rendered, stats.polled);
    Ok(())
}

/// Renders a camera frame with the glyph painter and swaps it in at `path`.
fn write_live_raster<P: GlyphPainter + ?Sized>(
    renderer: &GlyphArtRenderer<'_, P>,
    frame: &DynamicImage,
    path: &Path,
) -> glyphart_render::Result<()> {
    let rendered = renderer.render_image(frame)?;
    let partial = path.with_extension("part.png");
    rendered.save(&partial)?;
    fs::rename(&partial, path)
        .map_err(|source| RenderError::Io { stage: "writing the live raster", source })
}
