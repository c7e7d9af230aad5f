use super::{DisplaySurface, FrameBuffer, Placement};
use crate::error::{PipelineError, Result};
use image::{Rgb, RgbaImage};
use minifb::{Key, Window, WindowOptions};

/// Fixed-size desktop window backed by minifb
pub struct WindowDisplay {
    window: Window,
    buffer: FrameBuffer,
}

impl WindowDisplay {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        tracing::info!("Opening window \"{}\" ({}x{})", title, width, height);

        let mut window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PipelineError::DisplayInit(e.to_string()))?;

        // Pacing belongs to the pipeline loop.
        window.set_target_fps(0);

        Ok(Self {
            window,
            buffer: FrameBuffer::new(width, height),
        })
    }
}

impl DisplaySurface for WindowDisplay {
    fn size(&self) -> (u32, u32) {
        (self.buffer.width(), self.buffer.height())
    }

    fn clear(&mut self, color: Rgb<u8>) {
        self.buffer.clear(color);
    }

    fn draw(&mut self, frame: &RgbaImage, placement: Placement) {
        self.buffer.blit(frame, placement);
    }

    fn present(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(
                self.buffer.pixels(),
                self.buffer.width() as usize,
                self.buffer.height() as usize,
            )
            .map_err(|e| PipelineError::Display(e.to_string()))
    }

    fn is_closed(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Escape)
    }
}
