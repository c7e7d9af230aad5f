use crate::capture::{decode_frame, CaptureSource};
use crate::display::{DisplaySurface, Placement};
use crate::error::Result;
use crate::pixelate::{pixelate, BlockSize};
use image::Rgb;
use std::time::{Duration, Instant};

/// Averaged timings are logged once per this many frames.
const STATS_INTERVAL: u64 = 30;

/// Per-run settings for the capture/render loop
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Side of the pixelation blocks, fixed for the whole run
    pub block_size: BlockSize,
    /// Minimum wall time per iteration; zero disables pacing
    pub min_frame_interval: Duration,
    /// Colour the surface is cleared to before each frame
    pub background: Rgb<u8>,
    pub placement: Placement,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: BlockSize::DEFAULT,
            min_frame_interval: Duration::from_millis(1),
            background: Rgb([0, 0, 0]),
            placement: Placement::Centered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closed,
}

/// Time spent in each stage of one frame (or summed over many)
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameTimings {
    pub capture: Duration,
    pub decode: Duration,
    pub pixelate: Duration,
    pub display: Duration,
}

impl FrameTimings {
    pub fn total(&self) -> Duration {
        self.capture + self.decode + self.pixelate + self.display
    }

    fn accumulate(&mut self, frame: &FrameTimings) {
        self.capture += frame.capture;
        self.decode += frame.decode;
        self.pixelate += frame.pixelate;
        self.display += frame.display;
    }
}

/// Outcome of a loop that ended because the display was closed
#[derive(Debug, Clone, Copy)]
pub struct PipelineSummary {
    pub frames: u64,
    pub elapsed: Duration,
}

/// Run capture -> decode -> pixelate -> display until the display closes.
///
/// Strictly sequential, one frame at a time. The first error from any stage
/// ends the loop and is returned as is; nothing is retried.
pub fn run_pipeline<C, D>(
    capture: &mut C,
    display: &mut D,
    config: &PipelineConfig,
) -> Result<PipelineSummary>
where
    C: CaptureSource,
    D: DisplaySurface,
{
    let started = Instant::now();
    let mut totals = FrameTimings::default();
    let mut frames = 0u64;

    tracing::info!(
        "Starting pipeline loop: block size {}, min frame interval {:?}",
        config.block_size,
        config.min_frame_interval
    );
    tracing::info!("Close the window or press Escape to stop");

    let mut state = if display.is_closed() {
        LoopState::Closed
    } else {
        LoopState::Running
    };

    while state == LoopState::Running {
        let loop_start = Instant::now();

        let (timings, (width, height)) = render_frame(capture, display, config)?;
        if frames == 0 {
            let (cols, rows) = config.block_size.grid(width, height);
            tracing::info!(
                "First frame {}x{}, {}x{} blocks",
                width,
                height,
                cols,
                rows
            );

            let (surface_w, surface_h) = display.size();
            if width > surface_w || height > surface_h {
                tracing::warn!(
                    "Frame {}x{} exceeds the {}x{} display and will be clipped",
                    width,
                    height,
                    surface_w,
                    surface_h
                );
            }
        }

        totals.accumulate(&timings);
        frames += 1;

        tracing::debug!(
            "Frame {}: capture={:?}, decode={:?}, pixelate={:?}, display={:?}",
            frames,
            timings.capture,
            timings.decode,
            timings.pixelate,
            timings.display
        );

        if frames % STATS_INTERVAL == 0 {
            log_stats(frames, &totals);
        }

        state = if display.is_closed() {
            LoopState::Closed
        } else {
            LoopState::Running
        };

        if state == LoopState::Running {
            let elapsed = loop_start.elapsed();
            if elapsed < config.min_frame_interval {
                std::thread::sleep(config.min_frame_interval - elapsed);
            }
        }
    }

    tracing::info!("Display closed after {} frames", frames);

    Ok(PipelineSummary {
        frames,
        elapsed: started.elapsed(),
    })
}

/// One pass through every stage. Returns the stage timings and the size of
/// the captured frame.
fn render_frame<C, D>(
    capture: &mut C,
    display: &mut D,
    config: &PipelineConfig,
) -> Result<(FrameTimings, (u32, u32))>
where
    C: CaptureSource,
    D: DisplaySurface,
{
    let mut timings = FrameTimings::default();

    let start = Instant::now();
    let encoded = capture.capture_frame()?;
    timings.capture = start.elapsed();

    let start = Instant::now();
    let frame = decode_frame(&encoded)?;
    timings.decode = start.elapsed();

    let start = Instant::now();
    let pixelated = pixelate(&frame, config.block_size);
    timings.pixelate = start.elapsed();

    let start = Instant::now();
    display.clear(config.background);
    display.draw(&pixelated, config.placement);
    display.present()?;
    timings.display = start.elapsed();

    Ok((timings, frame.dimensions()))
}

fn log_stats(frames: u64, totals: &FrameTimings) {
    let avg_ms = |d: Duration| d.as_secs_f64() * 1000.0 / frames as f64;

    let total_ms = avg_ms(totals.total());
    let fps = if total_ms > 0.0 { 1000.0 / total_ms } else { 0.0 };

    tracing::info!(
        "Frame {}: capture={:.1}ms, decode={:.1}ms, pixelate={:.1}ms, display={:.1}ms, total={:.1}ms, fps={:.1}",
        frames,
        avg_ms(totals.capture),
        avg_ms(totals.decode),
        avg_ms(totals.pixelate),
        avg_ms(totals.display),
        total_ms,
        fps
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Hands out canned encoded frames, then fails.
    struct CannedCapture {
        frames: VecDeque<Vec<u8>>,
        calls: usize,
    }

    impl CannedCapture {
        fn new(frames: Vec<Vec<u8>>) -> Self {
            Self {
                frames: frames.into(),
                calls: 0,
            }
        }
    }

    impl CaptureSource for CannedCapture {
        fn capture_frame(&mut self) -> Result<Vec<u8>> {
            self.calls += 1;
            self.frames
                .pop_front()
                .ok_or_else(|| PipelineError::Capture("no more canned frames".to_string()))
        }
    }

    /// Records what was drawn and reports closed after `close_after` presents.
    struct RecordingDisplay {
        close_after: usize,
        fail_present: bool,
        clears: Vec<Rgb<u8>>,
        drawn: Vec<(RgbaImage, Placement)>,
        presents: usize,
    }

    impl RecordingDisplay {
        fn closing_after(close_after: usize) -> Self {
            Self {
                close_after,
                fail_present: false,
                clears: Vec::new(),
                drawn: Vec::new(),
                presents: 0,
            }
        }
    }

    impl DisplaySurface for RecordingDisplay {
        fn size(&self) -> (u32, u32) {
            (640, 480)
        }

        fn clear(&mut self, color: Rgb<u8>) {
            self.clears.push(color);
        }

        fn draw(&mut self, frame: &RgbaImage, placement: Placement) {
            self.drawn.push((frame.clone(), placement));
        }

        fn present(&mut self) -> Result<()> {
            if self.fail_present {
                return Err(PipelineError::Display("surface lost".to_string()));
            }
            self.presents += 1;
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.presents >= self.close_after
        }
    }

    fn checker(width: u32, height: u32, seed: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x / 3 + y / 2) % 2 == 0 {
                Rgba([seed, 0, 0, 255])
            } else {
                Rgba([0, seed, 255, 255])
            }
        })
    }

    fn png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn unpaced() -> PipelineConfig {
        PipelineConfig {
            min_frame_interval: Duration::ZERO,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn renders_pixelated_frames_until_closed() {
        let sources: Vec<_> = (1..=3).map(|seed| checker(20, 12, seed * 50)).collect();
        let mut capture = CannedCapture::new(sources.iter().map(png).collect());
        let mut display = RecordingDisplay::closing_after(3);
        let config = unpaced();

        let summary = run_pipeline(&mut capture, &mut display, &config).unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(capture.calls, 3);
        assert_eq!(display.presents, 3);
        for (source, (drawn, placement)) in sources.iter().zip(&display.drawn) {
            assert_eq!(*drawn, pixelate(source, config.block_size));
            assert_eq!(*placement, Placement::Centered);
        }
    }

    #[test]
    fn closed_display_never_captures() {
        let mut capture = CannedCapture::new(vec![png(&checker(4, 4, 1))]);
        let mut display = RecordingDisplay::closing_after(0);

        let summary = run_pipeline(&mut capture, &mut display, &unpaced()).unwrap();

        assert_eq!(summary.frames, 0);
        assert_eq!(capture.calls, 0);
        assert!(display.drawn.is_empty());
    }

    #[test]
    fn capture_failure_is_fatal() {
        let mut capture = CannedCapture::new(vec![png(&checker(4, 4, 1))]);
        let mut display = RecordingDisplay::closing_after(10);

        let err = run_pipeline(&mut capture, &mut display, &unpaced()).unwrap_err();

        assert!(matches!(err, PipelineError::Capture(_)));
        assert_eq!(capture.calls, 2);
        assert_eq!(display.presents, 1);
    }

    #[test]
    fn decode_failure_is_fatal() {
        let mut capture = CannedCapture::new(vec![b"not a jpeg".to_vec()]);
        let mut display = RecordingDisplay::closing_after(10);

        let err = run_pipeline(&mut capture, &mut display, &unpaced()).unwrap_err();

        assert!(matches!(err, PipelineError::Decode(_)));
        assert!(display.drawn.is_empty());
    }

    #[test]
    fn display_failure_is_fatal() {
        let mut capture = CannedCapture::new(vec![png(&checker(4, 4, 1))]);
        let mut display = RecordingDisplay::closing_after(10);
        display.fail_present = true;

        let err = run_pipeline(&mut capture, &mut display, &unpaced()).unwrap_err();
        assert!(matches!(err, PipelineError::Display(_)));
    }

    #[test]
    fn uses_configured_background_block_and_placement() {
        let source = checker(10, 10, 200);
        let mut capture = CannedCapture::new(vec![png(&source)]);
        let mut display = RecordingDisplay::closing_after(1);
        let config = PipelineConfig {
            block_size: BlockSize::new(5).unwrap(),
            background: Rgb([9, 8, 7]),
            placement: Placement::At { x: 3, y: 4 },
            ..unpaced()
        };

        run_pipeline(&mut capture, &mut display, &config).unwrap();

        assert_eq!(display.clears, vec![Rgb([9, 8, 7])]);
        let (drawn, placement) = &display.drawn[0];
        assert_eq!(*drawn, pixelate(&source, BlockSize::new(5).unwrap()));
        assert_eq!(*placement, Placement::At { x: 3, y: 4 });
    }

    #[test]
    fn min_frame_interval_paces_iterations() {
        let frames = (0..3).map(|_| png(&checker(2, 2, 1))).collect();
        let mut capture = CannedCapture::new(frames);
        let mut display = RecordingDisplay::closing_after(3);
        let config = PipelineConfig {
            min_frame_interval: Duration::from_millis(15),
            ..PipelineConfig::default()
        };

        let summary = run_pipeline(&mut capture, &mut display, &config).unwrap();

        // No sleep after the final frame.
        assert_eq!(summary.frames, 3);
        assert!(summary.elapsed >= Duration::from_millis(30));
    }

    #[test]
    fn timings_sum_every_stage() {
        let mut totals = FrameTimings::default();
        let frame = FrameTimings {
            capture: Duration::from_millis(4),
            decode: Duration::from_millis(3),
            pixelate: Duration::from_millis(2),
            display: Duration::from_millis(1),
        };
        totals.accumulate(&frame);
        totals.accumulate(&frame);
        assert_eq!(totals.total(), Duration::from_millis(20));
    }
}
