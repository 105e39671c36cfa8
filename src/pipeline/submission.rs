//! Per-run request parameters and their validation.

use crate::constants::{DEFAULT_MIN_CONFIDENCE, altitude, confidence};
use crate::error::{Error, Result};
use crate::imagery::{FlightParameters, GsdEstimator};

/// Parameters supplied alongside a batch of images.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Tile at native resolution and ignore flight geometry.
    pub skip_resampling: bool,
    /// Flight altitude above ground level in meters.
    pub altitude_agl_m: Option<f64>,
    /// Sensor platform identifier, looked up in the registry.
    pub sensor_platform: Option<String>,
    /// Minimum detection score.
    pub min_confidence: f32,
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            skip_resampling: false,
            altitude_agl_m: None,
            sensor_platform: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// How images of a submission are brought to the working resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResamplePlan {
    /// Chip the image as decoded.
    Native,
    /// Estimate GSD from the flight and resample to the target GSD.
    ToGsd(FlightParameters),
}

impl Submission {
    /// Check every field and resolve the sensor platform.
    ///
    /// Altitude and sensor are required unless resampling is skipped.
    /// Values that are supplied are range-checked even when they are not
    /// needed. Unknown platforms are an error; there is no fallback sensor.
    pub fn validate(&self, estimator: &GsdEstimator) -> Result<ResamplePlan> {
        if !(confidence::MIN..=confidence::MAX).contains(&self.min_confidence) {
            return Err(Error::InvalidConfidence {
                value: self.min_confidence,
            });
        }

        if let Some(value) = self.altitude_agl_m
            && !(altitude::MIN_M..=altitude::MAX_M).contains(&value)
        {
            return Err(Error::InvalidAltitude {
                value,
                min: altitude::MIN_M,
                max: altitude::MAX_M,
            });
        }

        if let Some(platform) = &self.sensor_platform {
            estimator.registry().lookup(platform)?;
        }

        if self.skip_resampling {
            return Ok(ResamplePlan::Native);
        }

        let altitude_agl_m = self.altitude_agl_m.ok_or(Error::MissingFlightParameter {
            name: "flight altitude (--altitude)",
        })?;
        let platform = self
            .sensor_platform
            .as_deref()
            .ok_or(Error::MissingFlightParameter {
                name: "sensor platform (--sensor)",
            })?;

        Ok(ResamplePlan::ToGsd(
            estimator.flight(altitude_agl_m, platform)?,
        ))
    }
}
