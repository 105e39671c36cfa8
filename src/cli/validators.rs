//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

use crate::constants::altitude;

/// Parse and validate confidence value (0.0-1.0).
pub fn parse_confidence(s: &str) -> Result<f32, String> {
    parse_unit_interval(s, "confidence")
}

/// Parse and validate an IoU threshold (0.0-1.0).
pub fn parse_iou_threshold(s: &str) -> Result<f32, String> {
    parse_unit_interval(s, "IoU threshold")
}

fn parse_unit_interval(s: &str, name: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{name} must be between 0.0 and 1.0, got {value}"));
    }

    Ok(value)
}

/// Parse and validate a bounded float value.
///
/// # Arguments
///
/// * `s` - The string to parse
/// * `min` - Minimum allowed value (inclusive)
/// * `max` - Maximum allowed value (inclusive)
/// * `name` - Name of the parameter for error messages
pub fn parse_bounded_float(s: &str, min: f64, max: f64, name: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(min..=max).contains(&value) {
        return Err(format!(
            "{name} must be between {min} and {max}, got {value}"
        ));
    }

    Ok(value)
}

/// Parse and validate flight altitude above ground level in meters.
pub fn parse_altitude(s: &str) -> Result<f64, String> {
    parse_bounded_float(s, altitude::MIN_M, altitude::MAX_M, "altitude (m)")
}

/// Parse a strictly positive, finite GSD in cm/px.
pub fn parse_gsd(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !value.is_finite() || value <= 0.0 {
        return Err(format!("GSD must be a positive number, got {value}"));
    }

    Ok(value)
}
