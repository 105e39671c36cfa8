//! Configuration type definitions.

use crate::config::SensorProfile;
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHIP_OVERLAP, DEFAULT_CHIP_SIZE, DEFAULT_IOU_THRESHOLD,
    DEFAULT_MIN_CONFIDENCE, DEFAULT_TARGET_GSD_CM, tensor_names,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configured detection models by name.
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Additional or overriding sensor platforms by identifier.
    #[serde(default)]
    pub sensors: BTreeMap<String, SensorProfile>,

    /// Default settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Inference settings.
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Configuration for a single detection model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Optional label map, one class name per line (line 1 is class id 1).
    #[serde(default)]
    pub labels: Option<PathBuf>,

    /// Fixed square input size of the model in pixels.
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Tensor names of the exported graph.
    #[serde(default)]
    pub tensors: TensorNames,
}

const fn default_input_size() -> u32 {
    DEFAULT_CHIP_SIZE
}

/// Input and output tensor names of a detection graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorNames {
    /// uint8 `[1, H, W, 3]` image input.
    pub input: String,
    /// `[1, N, 4]` normalized boxes.
    pub boxes: String,
    /// `[1, N]` class ids.
    pub classes: String,
    /// `[1, N]` scores.
    pub scores: String,
    /// `[1]` count of valid rows.
    pub num_detections: String,
}

impl Default for TensorNames {
    fn default() -> Self {
        Self {
            input: tensor_names::INPUT.to_string(),
            boxes: tensor_names::BOXES.to_string(),
            classes: tensor_names::CLASSES.to_string(),
            scores: tensor_names::SCORES.to_string(),
            num_detections: tensor_names::NUM_DETECTIONS.to_string(),
        }
    }
}

/// Default analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Default model name to use.
    pub model: Option<String>,

    /// Target ground sampling distance in cm/px.
    pub target_gsd_cm: f64,

    /// Chip edge length in pixels.
    pub chip_size: u32,

    /// Overlap between neighboring chips in pixels.
    pub chip_overlap: u32,

    /// Minimum confidence threshold.
    pub min_confidence: f32,

    /// IoU above which same-class detections are merged.
    pub iou_threshold: f32,

    /// Chips per inference call.
    pub batch_size: usize,

    /// Output formats.
    pub formats: Vec<OutputFormat>,

    /// Coordinate space of written boxes.
    pub coordinates: CoordinateSpace,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: None,
            target_gsd_cm: DEFAULT_TARGET_GSD_CM,
            chip_size: DEFAULT_CHIP_SIZE,
            chip_overlap: DEFAULT_CHIP_OVERLAP,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            formats: vec![OutputFormat::Json],
            coordinates: CoordinateSpace::Resampled,
        }
    }
}

/// Inference device configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    /// Try CUDA, silently fall back to CPU.
    #[default]
    Auto,
    /// Require CUDA, fail if unavailable.
    Gpu,
    /// Force CPU inference.
    Cpu,
}

/// Inference settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device to use for inference.
    pub device: InferenceDevice,
    /// Intra-op thread count (runtime default if unset).
    pub intra_threads: Option<usize>,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Per-image JSON with `bboxes`, `classes` and `scores` arrays.
    Json,
    /// One row per detection.
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Pixel space that written boxes are expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// The GSD-normalized image that was chipped.
    #[default]
    Resampled,
    /// The image as it was uploaded.
    Native,
}

impl std::fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resampled => write!(f, "resampled"),
            Self::Native => write!(f, "native"),
        }
    }
}
