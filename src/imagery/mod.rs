//! Image geometry pipeline: decoding, GSD normalization and chipping.

mod decode;
pub mod gsd;
mod pool;
mod resample;
mod tiler;

pub use decode::{DecodedImage, decode_image_bytes, decode_image_file, is_supported_format};
pub use gsd::{FlightParameters, GsdEstimate, GsdEstimator};
pub use pool::ChipPool;
pub use resample::{RESAMPLE_FILTER, resample, resampled_dimensions, scaled_dimensions};
pub use tiler::{ChipWindow, TileGrid, tile};

use image::RgbImage;

/// A chip cut from a parent image, ready for inference.
#[derive(Debug, Clone)]
pub struct Chip {
    /// Identifier of the parent image.
    pub source_id: String,
    /// Placement of this chip in the parent image.
    pub window: ChipWindow,
    /// Chip pixels, exactly `window.width x window.height`.
    pub pixels: RgbImage,
}
