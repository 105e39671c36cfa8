//! Sensor platform registry.

use crate::constants::BUILTIN_SENSORS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Camera geometry of a sensor platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorProfile {
    /// Lens focal length in millimeters.
    pub focal_length_mm: f64,
    /// Physical sensor height in centimeters.
    pub sensor_height_cm: f64,
    /// Physical sensor width in centimeters.
    pub sensor_width_cm: f64,
}

/// Lookup table from platform identifier to [`SensorProfile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorRegistry {
    sensors: BTreeMap<String, SensorProfile>,
}

impl SensorRegistry {
    /// Registry containing only the built-in platforms.
    pub fn builtin() -> Self {
        let sensors = BUILTIN_SENSORS
            .iter()
            .map(|&(id, focal_length_mm, sensor_height_cm, sensor_width_cm)| {
                (
                    id.to_string(),
                    SensorProfile {
                        focal_length_mm,
                        sensor_height_cm,
                        sensor_width_cm,
                    },
                )
            })
            .collect();
        Self { sensors }
    }

    /// Built-in platforms overlaid with user-configured ones.
    ///
    /// Configured entries replace built-ins with the same identifier.
    pub fn with_overrides(overrides: &BTreeMap<String, SensorProfile>) -> Self {
        let mut registry = Self::builtin();
        for (id, profile) in overrides {
            registry.sensors.insert(id.to_lowercase(), *profile);
        }
        registry
    }

    /// Look up a platform by identifier (case-insensitive).
    pub fn lookup(&self, id: &str) -> Result<&SensorProfile> {
        self.sensors
            .get(&id.to_lowercase())
            .ok_or_else(|| Error::UnknownSensor {
                id: id.to_string(),
                known: self.ids().collect::<Vec<_>>().join(", "),
            })
    }

    /// Registered identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }

    /// Registered platforms in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SensorProfile)> {
        self.sensors.iter().map(|(id, p)| (id.as_str(), p))
    }
}
