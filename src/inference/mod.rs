//! Detection model adapter.

mod labels;
mod onnx;

pub use labels::LabelMap;
pub use onnx::OnnxDetector;

use crate::detection::Detection;
use crate::error::Result;
use image::RgbImage;

/// Batch object detector consumed by the pipeline.
///
/// Implementations return one detection list per input chip, in the same
/// order, with boxes in chip-local pixel coordinates. No suppression is
/// expected; the pipeline applies its own score filter and NMS.
pub trait DetectionModel {
    /// Fixed square input size in pixels.
    fn input_size(&self) -> u32;

    /// Run detection on a batch of chips.
    fn infer(&mut self, chips: &[&RgbImage], min_confidence: f32) -> Result<Vec<Vec<Detection>>>;
}

impl<M: DetectionModel + ?Sized> DetectionModel for Box<M> {
    fn input_size(&self) -> u32 {
        (**self).input_size()
    }

    fn infer(&mut self, chips: &[&RgbImage], min_confidence: f32) -> Result<Vec<Vec<Detection>>> {
        (**self).infer(chips, min_confidence)
    }
}
