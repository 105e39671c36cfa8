//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "aerochip";

/// Default target ground sampling distance in centimeters per pixel.
pub const DEFAULT_TARGET_GSD_CM: f64 = 2.0;

/// Default chip edge length in pixels (`EfficientDet-D0` input size).
pub const DEFAULT_CHIP_SIZE: u32 = 512;

/// Default overlap between neighboring chips in pixels.
pub const DEFAULT_CHIP_OVERLAP: u32 = 64;

/// Default minimum confidence threshold for detections.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

/// Default IoU above which overlapping same-class detections are suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;

/// Default number of chips per inference call.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Maximum allowed batch size.
pub const MAX_BATCH_SIZE: usize = 512;

/// Two GSD values closer than this (cm/px) are treated as equal.
pub const GSD_EPSILON: f64 = 1e-6;

/// Supported flight altitude band above ground level, in meters.
pub mod altitude {
    /// Lowest accepted altitude.
    pub const MIN_M: f64 = 3.0;
    /// Highest accepted altitude (400 ft).
    pub const MAX_M: f64 = 121.92;
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places for score formatting.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Built-in sensor platforms: `(id, focal_length_mm, sensor_height_cm, sensor_width_cm)`.
pub const BUILTIN_SENSORS: &[(&str, f64, f64, f64)] = &[
    ("skydio2", 3.7, 0.462_196, 0.616_666),
    ("phantom4pro", 8.8, 0.88, 1.32),
];

/// Supported image file extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// Output file suffixes by format.
pub mod output_extensions {
    /// JSON results suffix.
    pub const JSON: &str = "_inference_results.json";
    /// CSV results suffix.
    pub const CSV: &str = "_inference_results.csv";
}

/// Default ONNX tensor names for TF Object Detection API exports.
pub mod tensor_names {
    /// Image input tensor.
    pub const INPUT: &str = "input_tensor";
    /// Normalized `[ymin, xmin, ymax, xmax]` boxes.
    pub const BOXES: &str = "detection_boxes";
    /// Class ids (1-based, float encoded).
    pub const CLASSES: &str = "detection_classes";
    /// Scores.
    pub const SCORES: &str = "detection_scores";
    /// Number of valid detections.
    pub const NUM_DETECTIONS: &str = "num_detections";
}
