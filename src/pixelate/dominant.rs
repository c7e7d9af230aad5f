use super::block::{blocks, BlockSize};
use image::{GenericImageView, ImageBuffer, Pixel};
use std::collections::HashMap;
use std::hash::Hash;

/// Owned image with the same pixel type as the source view.
pub type PixelatedImage<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Most frequent exact pixel value in `[x, x+block) x [y, y+block)`, clipped
/// to the image bounds.
///
/// Pixels are visited once in row-major order and the running winner only
/// changes on a strictly greater count, so among colours tied for the
/// maximum the one that reached that count first wins.
///
/// Returns `None` when the clipped region holds no pixels (`x` or `y` at or
/// past the image edge).
pub fn dominant_color<I>(image: &I, x: u32, y: u32, block: BlockSize) -> Option<I::Pixel>
where
    I: GenericImageView,
    I::Pixel: Eq + Hash,
{
    let (width, height) = image.dimensions();
    let x_end = x.saturating_add(block.get()).min(width);
    let y_end = y.saturating_add(block.get()).min(height);

    let mut counts: HashMap<I::Pixel, u32> = HashMap::new();
    let mut best: Option<(I::Pixel, u32)> = None;

    for py in y..y_end {
        for px in x..x_end {
            let pixel = image.get_pixel(px, py);
            let count = counts.entry(pixel).or_insert(0);
            *count += 1;

            if best.map_or(true, |(_, max)| *count > max) {
                best = Some((pixel, *count));
            }
        }
    }

    best.map(|(pixel, _)| pixel)
}

/// Replace every block of `image` with its dominant colour.
///
/// The result is a freshly allocated image of identical dimensions. Trailing
/// blocks are clipped, so sizes that are not a multiple of `block` are still
/// fully painted.
pub fn pixelate<I>(image: &I, block: BlockSize) -> PixelatedImage<I::Pixel>
where
    I: GenericImageView,
    I::Pixel: Eq + Hash,
{
    let _span = tracing::debug_span!("pixelate", block = block.get()).entered();

    let (width, height) = image.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for rect in blocks(width, height, block) {
        // Grid rects are never empty.
        let Some(color) = dominant_color(image, rect.x, rect.y, block) else {
            continue;
        };

        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                output.put_pixel(x, y, color);
            }
        }
    }

    output
}
