//! Ground sampling distance estimation from flight and camera geometry.

use crate::config::{SensorProfile, SensorRegistry};
use crate::constants::altitude;
use crate::error::{Error, Result};

/// Per-axis ground sampling distance in centimeters per pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GsdEstimate {
    /// Ground distance covered by one pixel row, vertically.
    pub height_cm_per_px: f64,
    /// Ground distance covered by one pixel column, horizontally.
    pub width_cm_per_px: f64,
}

impl GsdEstimate {
    /// The coarser of the two axes.
    ///
    /// Resampling to this value keeps both axes at or above target resolution.
    pub fn effective(&self) -> f64 {
        self.height_cm_per_px.max(self.width_cm_per_px)
    }
}

/// Flight parameters for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightParameters {
    /// Altitude above ground level in meters.
    pub altitude_agl_m: f64,
    /// Camera geometry, if known.
    pub sensor: Option<SensorProfile>,
}

impl FlightParameters {
    /// Build flight parameters, rejecting altitudes outside the supported band.
    pub fn new(altitude_agl_m: f64, sensor: Option<SensorProfile>) -> Result<Self> {
        if !altitude_agl_m.is_finite()
            || !(altitude::MIN_M..=altitude::MAX_M).contains(&altitude_agl_m)
        {
            return Err(Error::InvalidAltitude {
                value: altitude_agl_m,
                min: altitude::MIN_M,
                max: altitude::MAX_M,
            });
        }
        Ok(Self {
            altitude_agl_m,
            sensor,
        })
    }
}

/// Estimate per-axis GSD with a pinhole camera model.
///
/// `gsd = (altitude_m * 100 * sensor_cm) / (focal_mm / 10 * pixels)`, which is
/// ground centimeters per pixel. Altitude is converted m → cm and focal length
/// mm → cm so that every length in the ratio is in centimeters.
pub fn estimate(
    altitude_agl_m: f64,
    focal_length_mm: f64,
    image_height_px: u32,
    image_width_px: u32,
    sensor_height_cm: f64,
    sensor_width_cm: f64,
) -> Result<GsdEstimate> {
    require_positive("altitude_agl_m", altitude_agl_m)?;
    require_positive("focal_length_mm", focal_length_mm)?;
    require_positive("sensor_height_cm", sensor_height_cm)?;
    require_positive("sensor_width_cm", sensor_width_cm)?;
    if image_height_px == 0 || image_width_px == 0 {
        return Err(Error::InvalidDimension {
            width: image_width_px,
            height: image_height_px,
        });
    }

    let altitude_cm = altitude_agl_m * 100.0;
    let focal_length_cm = focal_length_mm / 10.0;

    let height_cm_per_px =
        (altitude_cm * sensor_height_cm) / (focal_length_cm * f64::from(image_height_px));
    let width_cm_per_px =
        (altitude_cm * sensor_width_cm) / (focal_length_cm * f64::from(image_width_px));

    let estimate = GsdEstimate {
        height_cm_per_px,
        width_cm_per_px,
    };
    // Overflow to infinity or underflow to zero is still possible with extreme inputs.
    for (name, value) in [
        ("estimated height", height_cm_per_px),
        ("estimated width", width_cm_per_px),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::InvalidGsd { name, value });
        }
    }
    Ok(estimate)
}

fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidGeometryInput { name, value })
    }
}

/// GSD estimator bound to a sensor registry.
#[derive(Debug, Clone)]
pub struct GsdEstimator {
    registry: SensorRegistry,
}

impl GsdEstimator {
    /// Create an estimator over the given sensor registry.
    pub const fn new(registry: SensorRegistry) -> Self {
        Self { registry }
    }

    /// The registry this estimator resolves platforms against.
    pub const fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Build flight parameters for a named platform.
    pub fn flight(&self, altitude_agl_m: f64, platform: &str) -> Result<FlightParameters> {
        let sensor = self.registry.lookup(platform)?;
        FlightParameters::new(altitude_agl_m, Some(*sensor))
    }

    /// Estimate GSD for an image of the given size taken with `flight`.
    pub fn estimate_for(
        &self,
        flight: &FlightParameters,
        image_width_px: u32,
        image_height_px: u32,
    ) -> Result<GsdEstimate> {
        let sensor = flight.sensor.ok_or(Error::MissingFlightParameter {
            name: "sensor platform",
        })?;
        estimate(
            flight.altitude_agl_m,
            sensor.focal_length_mm,
            image_height_px,
            image_width_px,
            sensor.sensor_height_cm,
            sensor.sensor_width_cm,
        )
    }
}
