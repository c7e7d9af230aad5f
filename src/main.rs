mod capture;
mod display;
mod error;
mod pipeline;
mod pixelate;

use anyhow::{Context, Result};
use capture::{FfmpegCapture, FfmpegConfig};
use clap::Parser;
use display::{Placement, WindowDisplay};
use pipeline::{run_pipeline, PipelineConfig};
use pixelate::BlockSize;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera device handed to ffmpeg's `-i`
    #[arg(short, long, default_value = "/dev/video0")]
    device: String,

    /// ffmpeg input format (video4linux2, avfoundation, dshow, ...)
    #[arg(long, default_value = "video4linux2")]
    input_format: String,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// Capture resolution as WIDTHxHEIGHT; device default when omitted
    #[arg(long, value_parser = parse_size)]
    capture_size: Option<(u32, u32)>,

    /// Window width
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Window height
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Window title
    #[arg(long, default_value = "Webcam")]
    title: String,

    /// Pixelation block size in pixels
    #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    block_size: u32,

    /// Minimum time per frame in milliseconds (0 = unpaced)
    #[arg(long, default_value_t = 1)]
    min_frame_interval_ms: u64,

    /// Draw frames with their top-left corner at X,Y instead of centred
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    origin: Option<(i32, i32)>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{}`", s))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    if w == 0 || h == 0 {
        return Err("width and height must be non-zero".to_string());
    }
    Ok((w, h))
}

fn parse_point(s: &str) -> std::result::Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{}`", s))?;
    let x: i32 = x.trim().parse().map_err(|e| format!("bad x: {}", e))?;
    let y: i32 = y.trim().parse().map_err(|e| format!("bad y: {}", e))?;
    Ok((x, y))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Blockcam starting");
    tracing::info!("Window: {}x{}", args.width, args.height);
    tracing::info!("Block size: {}", args.block_size);

    let block_size = BlockSize::new(args.block_size).context("Invalid block size")?;

    let mut capture = FfmpegCapture::new(FfmpegConfig {
        program: args.ffmpeg,
        input_format: args.input_format,
        device: args.device,
        video_size: args.capture_size,
    });

    let mut display = WindowDisplay::new(&args.title, args.width, args.height)
        .context("Failed to open display window")?;

    let config = PipelineConfig {
        block_size,
        min_frame_interval: Duration::from_millis(args.min_frame_interval_ms),
        placement: args
            .origin
            .map_or(Placement::Centered, |(x, y)| Placement::At { x, y }),
        ..PipelineConfig::default()
    };

    let summary =
        run_pipeline(&mut capture, &mut display, &config).context("Pipeline stopped")?;

    tracing::info!(
        "Rendered {} frames in {:.1}s",
        summary.frames,
        summary.elapsed.as_secs_f64()
    );

    Ok(())
}
