//! Merge per-chip detections into per-image results.

use crate::constants::{DEFAULT_IOU_THRESHOLD, DEFAULT_MIN_CONFIDENCE};
use crate::detection::{ChipDetections, Detection, ReassembledResult, non_max_suppression};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Translates chip-local detections into parent coordinates and deduplicates them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reassembler {
    iou_threshold: f32,
    min_confidence: f32,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl Reassembler {
    /// Create a reassembler with explicit thresholds.
    pub fn new(iou_threshold: f32, min_confidence: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&iou_threshold) {
            return Err(Error::InvalidIouThreshold {
                value: iou_threshold,
            });
        }
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(Error::InvalidConfidence {
                value: min_confidence,
            });
        }
        Ok(Self {
            iou_threshold,
            min_confidence,
        })
    }

    /// IoU above which same-class detections are merged.
    pub const fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Minimum score a detection needs to survive.
    pub const fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Reassemble every chip of one or more images.
    ///
    /// Takes the complete chip set. Detections are shifted by their chip
    /// offset, filtered by score, grouped by source image and suppressed
    /// per class.
    pub fn reassemble(
        &self,
        chips: Vec<ChipDetections>,
    ) -> BTreeMap<String, ReassembledResult> {
        let mut grouped: BTreeMap<String, Vec<Detection>> = BTreeMap::new();

        for chip in chips {
            let dx = chip.window.offset_x as f32;
            let dy = chip.window.offset_y as f32;
            let entry = grouped.entry(chip.source_id).or_default();

            for detection in chip.detections {
                if !detection.bbox.is_well_formed() || !detection.score.is_finite() {
                    trace!("Dropping malformed detection {:?}", detection);
                    continue;
                }
                if detection.score < self.min_confidence {
                    continue;
                }
                entry.push(Detection {
                    bbox: detection.bbox.translate(dx, dy),
                    ..detection
                });
            }
        }

        grouped
            .into_iter()
            .map(|(source_id, detections)| {
                let kept = non_max_suppression(&detections, self.iou_threshold);
                debug!(
                    "{}: {} detections after translation, {} after NMS (IoU > {})",
                    source_id,
                    detections.len(),
                    kept.len(),
                    self.iou_threshold
                );
                (source_id, kept.into_iter().collect())
            })
            .collect()
    }
}
