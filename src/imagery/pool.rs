//! Per-image pool of chip pixel buffers.

use crate::error::{Error, Result};
use crate::imagery::ChipWindow;
use image::RgbImage;

const CHANNELS: usize = 3;

/// Recycles chip buffers across inference batches of one image.
///
/// Buffers handed out by [`ChipPool::cut`] go back with [`ChipPool::release`]
/// and are reused for the next batch. Dropping the pool frees everything.
#[derive(Debug, Default)]
pub struct ChipPool {
    free: Vec<Vec<u8>>,
    allocations: usize,
}

impl ChipPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the pixels under `window` out of `parent` into a pooled buffer.
    pub fn cut(&mut self, parent: &RgbImage, window: ChipWindow) -> Result<RgbImage> {
        window.ensure_within(parent.width(), parent.height())?;

        let mut buffer = self.free.pop().unwrap_or_else(|| {
            self.allocations += 1;
            Vec::new()
        });
        buffer.clear();

        let parent_stride = parent.width() as usize * CHANNELS;
        let row_len = window.width as usize * CHANNELS;
        buffer.reserve(row_len * window.height as usize);

        let raw = parent.as_raw();
        for row in window.offset_y..window.offset_y + window.height {
            let start = row as usize * parent_stride + window.offset_x as usize * CHANNELS;
            buffer.extend_from_slice(&raw[start..start + row_len]);
        }

        RgbImage::from_raw(window.width, window.height, buffer).ok_or_else(|| {
            Error::GeometryInvariant {
                message: format!(
                    "chip buffer does not match {}x{} window",
                    window.width, window.height
                ),
            }
        })
    }

    /// Return a chip buffer to the pool.
    pub fn release(&mut self, chip: RgbImage) {
        self.free.push(chip.into_raw());
    }

    /// Number of distinct buffers allocated so far.
    pub const fn allocations(&self) -> usize {
        self.allocations
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    #[allow(clippy::cast_possible_truncation)]
    fn indexed(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 7]))
    }

    #[test]
    fn test_cut_matches_parent_pixels() {
        let parent = indexed(40, 30);
        let mut pool = ChipPool::new();
        let window = ChipWindow {
            offset_x: 12,
            offset_y: 5,
            width: 10,
            height: 8,
        };
        let chip = pool.cut(&parent, window).unwrap();
        assert_eq!(chip.dimensions(), (10, 8));
        for (x, y, pixel) in chip.enumerate_pixels() {
            assert_eq!(pixel, parent.get_pixel(x + 12, y + 5));
        }
    }

    #[test]
    fn test_released_buffers_are_reused() {
        let parent = indexed(64, 64);
        let mut pool = ChipPool::new();
        let window = ChipWindow {
            offset_x: 0,
            offset_y: 0,
            width: 32,
            height: 32,
        };
        for _ in 0..5 {
            let a = pool.cut(&parent, window).unwrap();
            let b = pool.cut(&parent, window).unwrap();
            pool.release(a);
            pool.release(b);
        }
        assert_eq!(pool.allocations(), 2);
    }

    #[test]
    fn test_cut_rejects_window_outside_parent() {
        let parent = indexed(16, 16);
        let mut pool = ChipPool::new();
        let window = ChipWindow {
            offset_x: 10,
            offset_y: 10,
            width: 8,
            height: 8,
        };
        assert!(matches!(
            pool.cut(&parent, window),
            Err(Error::GeometryInvariant { .. })
        ));
    }
}
