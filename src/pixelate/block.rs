use crate::error::{PipelineError, Result};
use std::fmt;

/// Side length, in pixels, of the square tiles an image is partitioned into.
///
/// Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSize(u32);

impl BlockSize {
    pub const DEFAULT: BlockSize = BlockSize(8);

    pub fn new(size: u32) -> Result<Self> {
        if size == 0 {
            return Err(PipelineError::InvalidBlockSize);
        }
        Ok(Self(size))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Number of block columns and rows needed to cover a `width` x `height`
    /// image, counting clipped trailing blocks.
    pub fn grid(self, width: u32, height: u32) -> (u32, u32) {
        (width.div_ceil(self.0), height.div_ceil(self.0))
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tile of the block grid, already clipped to the image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Iterate the block grid of a `width` x `height` image in row-major order.
///
/// Blocks start at (0, 0) and advance by the block size on both axes; the
/// last row and column are clipped to the image, so every yielded rect is
/// non-empty.
pub fn blocks(width: u32, height: u32, block: BlockSize) -> impl Iterator<Item = BlockRect> {
    let size = block.get();
    let step = size as usize;

    (0..height).step_by(step).flat_map(move |y| {
        (0..width).step_by(step).map(move |x| BlockRect {
            x,
            y,
            width: size.min(width - x),
            height: size.min(height - y),
        })
    })
}
