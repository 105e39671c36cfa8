//! Overlapping chip grid over an image.
//!
//! The last chip on each axis is anchored to the far edge at
//! `dimension - chip_size` instead of being stepped past it. Every chip is
//! then exactly `chip_size x chip_size` whenever the image is at least that
//! large, at the cost of extra overlap between the last two chips of a row or
//! column. No chip is ever padded or cropped.

use crate::error::{Error, Result};

/// Position and size of one chip within its parent image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChipWindow {
    /// Left edge in parent pixels.
    pub offset_x: u32,
    /// Top edge in parent pixels.
    pub offset_y: u32,
    /// Chip width in pixels.
    pub width: u32,
    /// Chip height in pixels.
    pub height: u32,
}

impl ChipWindow {
    /// Whether the parent pixel `(x, y)` falls inside this window.
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.offset_x
            && y >= self.offset_y
            && x - self.offset_x < self.width
            && y - self.offset_y < self.height
    }

    /// Check that this window lies within a `width x height` parent.
    pub fn ensure_within(&self, width: u32, height: u32) -> Result<()> {
        let right = u64::from(self.offset_x) + u64::from(self.width);
        let bottom = u64::from(self.offset_y) + u64::from(self.height);
        if self.width == 0
            || self.height == 0
            || right > u64::from(width)
            || bottom > u64::from(height)
        {
            return Err(Error::GeometryInvariant {
                message: format!(
                    "chip {}x{} at ({}, {}) exceeds parent {width}x{height}",
                    self.width, self.height, self.offset_x, self.offset_y
                ),
            });
        }
        Ok(())
    }
}

/// Regular grid of chip windows covering an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    image_width: u32,
    image_height: u32,
    chip_width: u32,
    chip_height: u32,
    x_offsets: Vec<u32>,
    y_offsets: Vec<u32>,
}

/// Build the chip grid for an image.
///
/// # Arguments
///
/// * `image_width`, `image_height` - Parent image size in pixels
/// * `chip_size` - Chip edge length in pixels
/// * `overlap` - Overlap between neighboring chips in pixels, less than `chip_size`
pub fn tile(image_width: u32, image_height: u32, chip_size: u32, overlap: u32) -> Result<TileGrid> {
    if image_width == 0 || image_height == 0 {
        return Err(Error::InvalidDimension {
            width: image_width,
            height: image_height,
        });
    }
    if chip_size == 0 || overlap >= chip_size {
        return Err(Error::InvalidChipLayout { chip_size, overlap });
    }
    let stride = chip_size - overlap;

    let grid = TileGrid {
        image_width,
        image_height,
        chip_width: chip_size.min(image_width),
        chip_height: chip_size.min(image_height),
        x_offsets: axis_offsets(image_width, chip_size, stride),
        y_offsets: axis_offsets(image_height, chip_size, stride),
    };
    grid.check_invariants()?;
    Ok(grid)
}

/// Chip offsets along one axis.
fn axis_offsets(dimension: u32, chip_size: u32, stride: u32) -> Vec<u32> {
    if dimension <= chip_size {
        return vec![0];
    }

    let last = dimension - chip_size;
    let mut offsets = Vec::with_capacity((last / stride) as usize + 2);
    let mut pos = 0;
    while pos < last {
        offsets.push(pos);
        pos += stride;
    }
    offsets.push(last);
    offsets
}

impl TileGrid {
    /// Number of chip columns.
    pub fn columns(&self) -> usize {
        self.x_offsets.len()
    }

    /// Number of chip rows.
    pub fn rows(&self) -> usize {
        self.y_offsets.len()
    }

    /// Total number of chips.
    pub fn len(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Whether the grid has no chips. Never true for a grid built by [`tile`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parent image size.
    pub const fn image_dimensions(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Size shared by every chip in the grid.
    pub const fn chip_dimensions(&self) -> (u32, u32) {
        (self.chip_width, self.chip_height)
    }

    /// Iterate over chip windows in row-major order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ChipWindow> + '_ {
        let columns = self.columns();
        (0..self.len()).map(move |index| ChipWindow {
            offset_x: self.x_offsets[index % columns],
            offset_y: self.y_offsets[index / columns],
            width: self.chip_width,
            height: self.chip_height,
        })
    }

    fn check_invariants(&self) -> Result<()> {
        for (offsets, extent, dimension, axis) in [
            (&self.x_offsets, self.chip_width, self.image_width, "x"),
            (&self.y_offsets, self.chip_height, self.image_height, "y"),
        ] {
            let covered_to_end = offsets
                .last()
                .is_some_and(|&last| last + extent == dimension);
            let starts_at_zero = offsets.first() == Some(&0);
            let gap_free = offsets.windows(2).all(|w| w[1] > w[0] && w[1] <= w[0] + extent);
            let in_bounds = offsets.iter().all(|&o| o + extent <= dimension);

            if !(covered_to_end && starts_at_zero && gap_free && in_bounds) {
                return Err(Error::GeometryInvariant {
                    message: format!(
                        "{axis} offsets {offsets:?} with extent {extent} do not tile {dimension}px"
                    ),
                });
            }
        }
        Ok(())
    }
}
