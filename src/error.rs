//! Error types for aerochip.

/// Result type alias for aerochip operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for aerochip.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Model not found in configuration.
    #[error("model '{name}' not found in configuration")]
    ModelNotFound {
        /// Name of the missing model.
        name: String,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: std::path::PathBuf,
    },

    /// Model already exists in configuration.
    #[error("model '{name}' already exists in configuration")]
    ModelAlreadyExists {
        /// Name of the existing model.
        name: String,
    },

    /// No supported image files found.
    #[error("no supported image files found in the provided paths")]
    NoValidImageFiles,

    /// Sensor platform is not in the registry.
    #[error("unknown sensor platform '{id}' (known: {known})")]
    UnknownSensor {
        /// Requested sensor identifier.
        id: String,
        /// Comma-separated list of registered identifiers.
        known: String,
    },

    /// Required flight parameter was not supplied.
    #[error("{name} is required unless resampling is skipped")]
    MissingFlightParameter {
        /// Name of the missing parameter.
        name: &'static str,
    },

    /// Flight altitude outside the supported band.
    #[error("invalid flight altitude: {value} m (must be {min} to {max})")]
    InvalidAltitude {
        /// Invalid altitude in meters.
        value: f64,
        /// Lower bound in meters.
        min: f64,
        /// Upper bound in meters.
        max: f64,
    },

    /// A camera or sensor geometry input is non-positive or not finite.
    #[error("invalid {name}: {value} (must be a positive finite number)")]
    InvalidGeometryInput {
        /// Name of the input.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// An image dimension is zero.
    #[error("invalid image dimensions {width}x{height} (both must be positive)")]
    InvalidDimension {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// Ground sampling distance is non-positive or not finite.
    #[error("invalid {name} GSD: {value} cm/px")]
    InvalidGsd {
        /// Which GSD value (measured or target).
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Chip size and overlap do not produce a positive stride.
    #[error("invalid chip layout: chip size {chip_size}px with overlap {overlap}px")]
    InvalidChipLayout {
        /// Chip edge length in pixels.
        chip_size: u32,
        /// Overlap in pixels.
        overlap: u32,
    },

    /// Confidence threshold outside [0, 1].
    #[error("invalid confidence threshold: {value} (must be 0.0 to 1.0)")]
    InvalidConfidence {
        /// Offending value.
        value: f32,
    },

    /// IoU threshold outside [0, 1].
    #[error("invalid IoU threshold: {value} (must be 0.0 to 1.0)")]
    InvalidIouThreshold {
        /// Offending value.
        value: f32,
    },

    /// Failed to open image file.
    #[error("failed to open image file '{path}'")]
    ImageOpen {
        /// Path to the image file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to decode image.
    #[error("failed to decode image '{name}'")]
    ImageDecode {
        /// Image name or path.
        name: String,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Chip geometry violated an internal invariant.
    #[error("geometry invariant violated: {message}")]
    GeometryInvariant {
        /// Description of the violation.
        message: String,
    },

    /// Failed to build detection model.
    #[error("failed to build detection model: {reason}")]
    ModelBuild {
        /// Description of the build failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Two inputs would write to the same result files.
    #[error(
        "'{first}' and '{second}' would both write results to '{output}' (rename one or use separate output directories)"
    )]
    OutputNameCollision {
        /// Input that claimed the output name first.
        first: std::path::PathBuf,
        /// Input that collides with it.
        second: std::path::PathBuf,
        /// Shared output path.
        output: std::path::PathBuf,
    },

    /// Failed to write JSON output file.
    #[error("failed to write JSON output file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write CSV output file.
    #[error("failed to write CSV output file '{path}'")]
    CsvWrite {
        /// Path to the CSV file.
        path: std::path::PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write result archive.
    #[error("failed to write archive '{path}'")]
    Archive {
        /// Path to the archive.
        path: std::path::PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },
}

impl Error {
    /// Whether this error is a validation failure of caller-supplied input.
    ///
    /// Validation errors are always surfaced to the caller and are never
    /// replaced by defaults inside the pipeline.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ConfigValidation { .. }
                | Self::UnknownSensor { .. }
                | Self::MissingFlightParameter { .. }
                | Self::InvalidAltitude { .. }
                | Self::InvalidGeometryInput { .. }
                | Self::InvalidDimension { .. }
                | Self::InvalidGsd { .. }
                | Self::InvalidChipLayout { .. }
                | Self::InvalidConfidence { .. }
                | Self::InvalidIouThreshold { .. }
                | Self::OutputNameCollision { .. }
        )
    }

    /// Whether this error only affects the image being processed.
    pub const fn is_per_image(&self) -> bool {
        matches!(
            self,
            Self::ImageOpen { .. }
                | Self::ImageDecode { .. }
                | Self::Inference { .. }
                | Self::InvalidDimension { .. }
                | Self::InvalidGsd { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        let err = Error::UnknownSensor {
            id: "mavic".to_string(),
            known: "phantom4pro, skydio2".to_string(),
        };
        assert!(err.is_validation());
        assert!(err.to_string().contains("mavic"));

        let err = Error::GeometryInvariant {
            message: "chip outside image".to_string(),
        };
        assert!(!err.is_validation());
    }

    #[test]
    fn test_inference_error_is_per_image() {
        let err = Error::Inference {
            reason: "session failed".to_string(),
        };
        assert!(err.is_per_image());
        assert!(!err.is_validation());
    }
}
