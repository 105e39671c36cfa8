//! CLI argument definitions.

use crate::cli::validators::{
    parse_altitude, parse_confidence, parse_gsd, parse_iou_threshold,
};
use crate::config::{CoordinateSpace, OutputFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GSD-normalized chipping and object detection for aerial imagery.
#[derive(Debug, Parser)]
#[command(name = "aerochip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input images or directories to analyze.
    pub inputs: Vec<PathBuf>,

    /// Common options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect sensor platforms.
    Sensors {
        /// Sensors action to perform.
        #[command(subcommand)]
        action: SensorsAction,
    },
    /// Manage models.
    Models {
        /// Models action to perform.
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Show GSD, resampled size and chip grid for an image without inference.
    Plan {
        /// Image to plan.
        image: PathBuf,

        /// Flight geometry and chipping options.
        #[command(flatten)]
        geometry: GeometryArgs,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Sensors subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum SensorsAction {
    /// List built-in and configured sensor platforms.
    List,
}

/// Models subcommand actions.
#[derive(Debug, Subcommand)]
pub enum ModelsAction {
    /// List configured models.
    List,
    /// Add a new model to configuration.
    Add {
        /// Name for this model (e.g., "efficientdet-d0").
        name: String,
        /// Path to the ONNX model file.
        #[arg(long)]
        path: PathBuf,
        /// Path to the label map (.pbtxt or one name per line).
        #[arg(long)]
        labels: Option<PathBuf>,
        /// Model input size in pixels.
        #[arg(long)]
        input_size: Option<u32>,
        /// Set as the default model.
        #[arg(long)]
        default: bool,
    },
    /// Verify model files exist and are valid.
    Check,
}

/// Flight geometry and chip layout.
#[derive(Debug, Clone, Args)]
pub struct GeometryArgs {
    /// Flight altitude above ground level in meters (3-121.92).
    #[arg(long, value_parser = parse_altitude, env = "AEROCHIP_ALTITUDE")]
    pub altitude: Option<f64>,

    /// Sensor platform identifier (see `aerochip sensors list`).
    #[arg(long, env = "AEROCHIP_SENSOR")]
    pub sensor: Option<String>,

    /// Chip at native resolution; altitude and sensor become optional.
    #[arg(long)]
    pub skip_resampling: bool,

    /// Target ground sampling distance in cm/px.
    #[arg(long, value_parser = parse_gsd, env = "AEROCHIP_TARGET_GSD")]
    pub target_gsd: Option<f64>,

    /// Chip edge length in pixels.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), env = "AEROCHIP_CHIP_SIZE")]
    pub chip_size: Option<u32>,

    /// Overlap between neighboring chips in pixels.
    #[arg(long, env = "AEROCHIP_OVERLAP")]
    pub overlap: Option<u32>,
}

/// Arguments for the analyze command.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalyzeArgs {
    /// Flight geometry and chipping options.
    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// Model name from configuration.
    #[arg(short, long, env = "AEROCHIP_MODEL")]
    pub model: Option<String>,

    /// Path to ONNX model file (overrides config).
    #[arg(long, env = "AEROCHIP_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to label map file (overrides config).
    #[arg(long, env = "AEROCHIP_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Output formats (comma-separated: json,csv).
    #[arg(short, long, value_delimiter = ',', env = "AEROCHIP_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Output directory (default: same as input).
    #[arg(short, long, env = "AEROCHIP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Package every result file of this run into a zip archive.
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Pixel space of written boxes.
    #[arg(long, value_enum, env = "AEROCHIP_COORDINATES")]
    pub coordinates: Option<CoordinateSpace>,

    /// Minimum confidence threshold (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_confidence, env = "AEROCHIP_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// IoU above which same-class detections are merged (0.0-1.0).
    #[arg(long, value_parser = parse_iou_threshold, env = "AEROCHIP_IOU_THRESHOLD")]
    pub iou_threshold: Option<f32>,

    /// Chips per inference call.
    #[arg(short, long, env = "AEROCHIP_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Reprocess images even if output exists.
    #[arg(long)]
    pub force: bool,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace everything).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable progress bars.
    #[arg(long)]
    pub no_progress: bool,

    /// Require CUDA GPU acceleration.
    #[arg(long, conflicts_with = "cpu")]
    pub gpu: bool,

    /// Force CPU inference.
    #[arg(long, conflicts_with = "gpu")]
    pub cpu: bool,
}
