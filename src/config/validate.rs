//! Configuration validation.

use crate::config::{Config, ModelConfig, SensorProfile};
use crate::constants::{MAX_BATCH_SIZE, confidence};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    validate_sensors(config)?;
    Ok(())
}

/// Validate default settings.
fn validate_defaults(config: &Config) -> Result<()> {
    let defaults = &config.defaults;

    if !(confidence::MIN..=confidence::MAX).contains(&defaults.min_confidence) {
        return Err(invalid(format!(
            "min_confidence must be between {} and {}, got {}",
            confidence::MIN,
            confidence::MAX,
            defaults.min_confidence
        )));
    }

    if !(0.0..=1.0).contains(&defaults.iou_threshold) {
        return Err(invalid(format!(
            "iou_threshold must be between 0.0 and 1.0, got {}",
            defaults.iou_threshold
        )));
    }

    if !defaults.target_gsd_cm.is_finite() || defaults.target_gsd_cm <= 0.0 {
        return Err(invalid(format!(
            "target_gsd_cm must be positive, got {}",
            defaults.target_gsd_cm
        )));
    }

    if defaults.chip_size == 0 || defaults.chip_overlap >= defaults.chip_size {
        return Err(invalid(format!(
            "chip_overlap ({}) must be smaller than chip_size ({})",
            defaults.chip_overlap, defaults.chip_size
        )));
    }

    if defaults.batch_size == 0 || defaults.batch_size > MAX_BATCH_SIZE {
        return Err(invalid(format!(
            "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
            defaults.batch_size
        )));
    }

    if let Some(ref model_name) = defaults.model
        && !config.models.contains_key(model_name)
    {
        return Err(Error::ModelNotFound {
            name: model_name.clone(),
        });
    }

    Ok(())
}

/// Validate configured sensor platforms.
fn validate_sensors(config: &Config) -> Result<()> {
    for (id, profile) in &config.sensors {
        let SensorProfile {
            focal_length_mm,
            sensor_height_cm,
            sensor_width_cm,
        } = *profile;
        for (field, value) in [
            ("focal_length_mm", focal_length_mm),
            ("sensor_height_cm", sensor_height_cm),
            ("sensor_width_cm", sensor_width_cm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!(
                    "sensor '{id}' {field} must be positive, got {value}"
                )));
            }
        }
    }
    Ok(())
}

/// Validate a model configuration and check files exist.
pub fn validate_model_config(model: &ModelConfig) -> Result<()> {
    if !model.path.exists() {
        return Err(Error::ModelFileNotFound {
            path: model.path.clone(),
        });
    }

    if let Some(labels) = &model.labels
        && !labels.exists()
    {
        return Err(Error::LabelsFileNotFound {
            path: labels.clone(),
        });
    }

    if model.input_size == 0 {
        return Err(invalid("model input_size must be positive".to_string()));
    }

    Ok(())
}

/// Get a model by name from the config.
pub fn get_model<'a>(config: &'a Config, name: &str) -> Result<&'a ModelConfig> {
    config.models.get(name).ok_or_else(|| Error::ModelNotFound {
        name: name.to_string(),
    })
}

const fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}
