//! Detection value types.

use crate::imagery::ChipWindow;
use serde::{Deserialize, Serialize};

/// Model class identifier (1-based in TF Object Detection label maps).
pub type ClassId = u32;

/// Axis-aligned box in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    /// Left edge.
    pub xmin: f32,
    /// Top edge.
    pub ymin: f32,
    /// Right edge.
    pub xmax: f32,
    /// Bottom edge.
    pub ymax: f32,
}

impl BBox {
    /// Create a box from its corners.
    pub const fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Box area, zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        (self.xmax - self.xmin).max(0.0) * (self.ymax - self.ymin).max(0.0)
    }

    /// Intersection over union with `other`, in `[0, 1]`.
    pub fn iou(&self, other: &Self) -> f32 {
        let ix = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let iy = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Shift both corners by `(dx, dy)`.
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.xmin + dx, self.ymin + dy, self.xmax + dx, self.ymax + dy)
    }

    /// Divide x coordinates by `sx` and y coordinates by `sy`.
    pub fn unscale(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.xmin / sx, self.ymin / sy, self.xmax / sx, self.ymax / sy)
    }

    /// Finite coordinates with `min <= max` on both axes.
    pub fn is_well_formed(&self) -> bool {
        [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite())
            && self.xmin <= self.xmax
            && self.ymin <= self.ymax
    }
}

impl From<[f32; 4]> for BBox {
    fn from([xmin, ymin, xmax, ymax]: [f32; 4]) -> Self {
        Self::new(xmin, ymin, xmax, ymax)
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

/// One detected object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Box in chip-local or parent pixel coordinates, depending on stage.
    pub bbox: BBox,
    /// Predicted class.
    pub class_id: ClassId,
    /// Confidence score in `[0, 1]`.
    pub score: f32,
}

impl Detection {
    /// Create a detection.
    pub const fn new(bbox: BBox, class_id: ClassId, score: f32) -> Self {
        Self {
            bbox,
            class_id,
            score,
        }
    }
}

/// Raw model output for one chip, in chip-local coordinates.
#[derive(Debug, Clone)]
pub struct ChipDetections {
    /// Identifier of the parent image.
    pub source_id: String,
    /// Where the chip sits in the parent image.
    pub window: ChipWindow,
    /// Detections relative to the chip's top-left corner.
    pub detections: Vec<Detection>,
}

/// Deduplicated detections for a whole image, as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReassembledResult {
    /// Boxes as `[xmin, ymin, xmax, ymax]`.
    pub bboxes: Vec<BBox>,
    /// Class id per box.
    pub classes: Vec<ClassId>,
    /// Score per box.
    pub scores: Vec<f32>,
}

impl ReassembledResult {
    /// Number of detections.
    pub fn len(&self) -> usize {
        self.bboxes.len()
    }

    /// Whether there are no detections.
    pub fn is_empty(&self) -> bool {
        self.bboxes.is_empty()
    }

    /// Append one detection.
    pub fn push(&mut self, detection: Detection) {
        self.bboxes.push(detection.bbox);
        self.classes.push(detection.class_id);
        self.scores.push(detection.score);
    }

    /// Iterate detections in stored order.
    pub fn iter(&self) -> impl Iterator<Item = Detection> + '_ {
        self.bboxes
            .iter()
            .zip(&self.classes)
            .zip(&self.scores)
            .map(|((&bbox, &class_id), &score)| Detection::new(bbox, class_id, score))
    }

    /// Map boxes from a resampled image back to the image it was resampled from.
    ///
    /// `scale_x`/`scale_y` are resampled size divided by original size.
    pub fn unscaled(&self, scale_x: f32, scale_y: f32) -> Self {
        Self {
            bboxes: self
                .bboxes
                .iter()
                .map(|b| b.unscale(scale_x, scale_y))
                .collect(),
            classes: self.classes.clone(),
            scores: self.scores.clone(),
        }
    }
}

impl FromIterator<Detection> for ReassembledResult {
    fn from_iter<I: IntoIterator<Item = Detection>>(iter: I) -> Self {
        let mut result = Self::default();
        for detection in iter {
            result.push(detection);
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&a), 1.0);
        let b = BBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let point = BBox::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(point.iou(&point), 0.0);
    }

    #[test]
    fn test_translate_exact() {
        let b = BBox::new(0.0, 0.0, 10.0, 10.0).translate(50.0, 50.0);
        assert_eq!(b, BBox::new(50.0, 50.0, 60.0, 60.0));
    }

    #[test]
    fn test_well_formed() {
        assert!(BBox::new(1.0, 1.0, 2.0, 2.0).is_well_formed());
        assert!(!BBox::new(3.0, 1.0, 2.0, 2.0).is_well_formed());
        assert!(!BBox::new(f32::NAN, 1.0, 2.0, 2.0).is_well_formed());
    }

    #[test]
    fn test_result_serializes_as_parallel_arrays() {
        let result: ReassembledResult = [
            Detection::new(BBox::new(1.0, 2.0, 3.0, 4.0), 2, 0.9),
            Detection::new(BBox::new(5.0, 6.0, 7.0, 8.0), 1, 0.5),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "bboxes": [[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]],
                "classes": [2, 1],
                "scores": [0.9f32, 0.5]
            })
        );
    }

    #[test]
    fn test_unscaled_divides_per_axis() {
        let result: ReassembledResult =
            std::iter::once(Detection::new(BBox::new(20.0, 10.0, 40.0, 30.0), 1, 0.8)).collect();
        let native = result.unscaled(2.0, 0.5);
        assert_eq!(native.bboxes[0], BBox::new(10.0, 20.0, 20.0, 60.0));
        assert_eq!(native.scores, result.scores);
    }
}
