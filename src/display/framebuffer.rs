use super::Placement;
use image::{Rgb, RgbaImage};

/// Fixed-size 0RGB framebuffer in the packed `u32` layout window backends
/// expect.
///
/// Alpha is dropped when blitting.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn clear(&mut self, color: Rgb<u8>) {
        let packed = pack(color[0], color[1], color[2]);
        self.pixels.fill(packed);
    }

    /// Copy `image` in at `placement`, clipping whatever falls outside.
    pub fn blit(&mut self, image: &RgbaImage, placement: Placement) {
        let (img_w, img_h) = image.dimensions();
        let (ox, oy) = placement.origin((self.width, self.height), (img_w, img_h));

        // Source columns/rows that land inside the buffer.
        let x_start = (-ox).clamp(0, img_w as i64) as u32;
        let x_end = (self.width as i64 - ox).clamp(0, img_w as i64) as u32;
        let y_start = (-oy).clamp(0, img_h as i64) as u32;
        let y_end = (self.height as i64 - oy).clamp(0, img_h as i64) as u32;

        for sy in y_start..y_end {
            let row = ((oy + sy as i64) as u32 * self.width) as usize;
            for sx in x_start..x_end {
                let p = image.get_pixel(sx, sy);
                let dx = (ox + sx as i64) as usize;
                self.pixels[row + dx] = pack(p[0], p[1], p[2]);
            }
        }
    }
}

fn pack(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}
