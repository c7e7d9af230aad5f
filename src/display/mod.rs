mod framebuffer;
mod window;

pub use framebuffer::FrameBuffer;
pub use window::WindowDisplay;

use crate::error::Result;
use image::{Rgb, RgbaImage};

/// Where a frame is drawn on the display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Centre the frame on the surface
    #[default]
    Centered,
    /// Put the frame's top-left corner at the given surface coordinate
    At { x: i32, y: i32 },
}

impl Placement {
    /// Top-left corner of a `frame` sized image on a `surface` sized target.
    /// May be negative or past the edge; drawing clips.
    pub fn origin(self, surface: (u32, u32), frame: (u32, u32)) -> (i64, i64) {
        match self {
            Placement::Centered => (
                (surface.0 as i64 - frame.0 as i64) / 2,
                (surface.1 as i64 - frame.1 as i64) / 2,
            ),
            Placement::At { x, y } => (x as i64, y as i64),
        }
    }
}

/// Trait for presentation targets
pub trait DisplaySurface {
    /// Fixed surface size as (width, height)
    fn size(&self) -> (u32, u32);

    /// Fill the whole back buffer with one colour
    fn clear(&mut self, color: Rgb<u8>);

    /// Draw a frame into the back buffer
    fn draw(&mut self, frame: &RgbaImage, placement: Placement);

    /// Show the back buffer and pump window events
    fn present(&mut self) -> Result<()>;

    /// Whether the user asked to close the display
    fn is_closed(&self) -> bool;
}
