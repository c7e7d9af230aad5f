use super::CaptureSource;
use crate::error::{PipelineError, Result};
use std::process::{Command, Stdio};

/// Lines of ffmpeg stderr kept in a capture error.
const STDERR_TAIL_LINES: usize = 5;

/// How to invoke ffmpeg for a single-frame grab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegConfig {
    /// ffmpeg executable, looked up on PATH when not absolute
    pub program: String,
    /// Input demuxer, e.g. `video4linux2`, `avfoundation`, `dshow`
    pub input_format: String,
    /// Device handed to `-i`
    pub device: String,
    /// Requested capture size; the device default when `None`
    pub video_size: Option<(u32, u32)>,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            input_format: "video4linux2".to_string(),
            device: "/dev/video0".to_string(),
            video_size: None,
        }
    }
}

/// Grabs one frame per call by running ffmpeg to completion and reading the
/// encoded image from its stdout.
pub struct FfmpegCapture {
    config: FfmpegConfig,
}

impl FfmpegCapture {
    pub fn new(config: FfmpegConfig) -> Self {
        tracing::info!(
            "Capturing from {} ({}) via {}",
            config.device,
            config.input_format,
            config.program
        );

        Self { config }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            self.config.input_format.clone(),
        ];

        if let Some((width, height)) = self.config.video_size {
            args.push("-video_size".to_string());
            args.push(format!("{}x{}", width, height));
        }

        args.extend(
            ["-i", self.config.device.as_str(), "-vframes", "1", "-f", "image2pipe", "-"]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }
}

impl CaptureSource for FfmpegCapture {
    fn capture_frame(&mut self) -> Result<Vec<u8>> {
        let _span = tracing::debug_span!("capture").entered();

        let output = Command::new(&self.config.program)
            .args(self.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PipelineError::CaptureSpawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PipelineError::CaptureExit {
                status: output.status,
                stderr: stderr_tail(&output.stderr),
            });
        }

        if output.stdout.is_empty() {
            return Err(PipelineError::Capture(
                "capture command produced no frame data".to_string(),
            ));
        }

        tracing::debug!("Captured {} bytes", output.stdout.len());
        Ok(output.stdout)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
