//! GSD-driven image resampling using `image::imageops`.

use crate::constants::GSD_EPSILON;
use crate::error::{Error, Result};
use image::RgbImage;
use image::imageops::{self, FilterType};

/// Interpolation used for all resampling.
///
/// `Triangle` is bilinear interpolation.
pub const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Resample `image` so that its GSD goes from `measured_gsd_cm` to `target_gsd_cm`.
///
/// Both axes are scaled by `measured / target`, so a coarser measured GSD
/// upsamples and a finer one downsamples. Returns the input unchanged if the
/// two GSDs are equal within [`GSD_EPSILON`].
pub fn resample(image: RgbImage, measured_gsd_cm: f64, target_gsd_cm: f64) -> Result<RgbImage> {
    let (width, height) =
        resampled_dimensions(image.width(), image.height(), measured_gsd_cm, target_gsd_cm)?;
    if (width, height) == image.dimensions() {
        return Ok(image);
    }

    Ok(imageops::resize(&image, width, height, RESAMPLE_FILTER))
}

/// Dimensions [`resample`] produces for an image of `width x height`.
pub fn resampled_dimensions(
    width: u32,
    height: u32,
    measured_gsd_cm: f64,
    target_gsd_cm: f64,
) -> Result<(u32, u32)> {
    validate_gsd("measured", measured_gsd_cm)?;
    validate_gsd("target", target_gsd_cm)?;

    if (measured_gsd_cm - target_gsd_cm).abs() <= GSD_EPSILON {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        return Ok((width, height));
    }

    scaled_dimensions(width, height, measured_gsd_cm / target_gsd_cm)
}

/// Compute output dimensions for a uniform scale factor.
///
/// Each dimension is rounded half up and clamped to at least one pixel.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimension { width, height });
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::InvalidGeometryInput {
            name: "resample scale",
            value: scale,
        });
    }
    Ok((
        round_half_up(width, scale, "width")?,
        round_half_up(height, scale, "height")?,
    ))
}

fn round_half_up(dim: u32, scale: f64, name: &'static str) -> Result<u32> {
    let scaled = (f64::from(dim) * scale + 0.5).floor().max(1.0);
    if scaled > f64::from(u32::MAX) {
        return Err(Error::GeometryInvariant {
            message: format!("resampled {name} {scaled} does not fit in u32"),
        });
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(scaled as u32)
}

fn validate_gsd(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidGsd { name, value })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        #[allow(clippy::cast_possible_truncation)]
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_resample_equal_gsd_returns_input() {
        let image = gradient(40, 30);
        let result = resample(image.clone(), 2.0, 2.0 + 1e-9).unwrap();
        assert_eq!(result, image);
    }

    #[test]
    fn test_resample_coarser_measured_upsamples() {
        let result = resample(gradient(100, 50), 3.0, 2.0).unwrap();
        assert_eq!(result.dimensions(), (150, 75));
    }

    #[test]
    fn test_resample_finer_measured_downsamples() {
        let result = resample(gradient(100, 50), 1.0, 2.0).unwrap();
        assert_eq!(result.dimensions(), (50, 25));
    }

    #[test]
    fn test_resampled_dimensions_match_resample() {
        let (w, h) = resampled_dimensions(101, 67, 1.37, 2.0).unwrap();
        assert_eq!(resample(gradient(101, 67), 1.37, 2.0).unwrap().dimensions(), (w, h));
        assert_eq!(resampled_dimensions(101, 67, 2.0, 2.0).unwrap(), (101, 67));
    }

    #[test]
    fn test_scaled_dimensions_round_half_up() {
        // 5 * 0.5 = 2.5 -> 3, 3 * 0.5 = 1.5 -> 2
        assert_eq!(scaled_dimensions(5, 3, 0.5).unwrap(), (3, 2));
        // 7 * 0.3 = 2.1 -> 2
        assert_eq!(scaled_dimensions(7, 7, 0.3).unwrap(), (2, 2));
    }

    #[test]
    fn test_scaled_dimensions_never_zero() {
        assert_eq!(scaled_dimensions(3, 3, 0.01).unwrap(), (1, 1));
    }

    #[test]
    fn test_resample_round_trip_within_one_pixel() {
        let pairs = [(1.37, 2.0), (2.0, 0.8), (3.3, 2.0), (0.9, 1.7)];
        for (width, height) in [(101, 67), (640, 480), (33, 517)] {
            for (g1, g2) in pairs {
                let there = resample(gradient(width, height), g1, g2).unwrap();
                let back = resample(there, g2, g1).unwrap();
                let (bw, bh) = back.dimensions();
                assert!(
                    bw.abs_diff(width) <= 1 && bh.abs_diff(height) <= 1,
                    "{width}x{height} via {g1}/{g2} came back as {bw}x{bh}"
                );
            }
        }
    }

    #[test]
    fn test_resample_uniform_image_preserves_pixels() {
        let image = RgbImage::from_pixel(64, 48, Rgb([120, 60, 30]));
        let up = resample(image, 2.5, 2.0).unwrap();
        let down = resample(up, 2.0, 2.5).unwrap();
        for pixel in down.pixels() {
            for (got, want) in pixel.0.iter().zip([120u8, 60, 30]) {
                assert!(got.abs_diff(want) <= 1);
            }
        }
    }

    #[test]
    fn test_resample_rejects_invalid_gsd() {
        assert!(matches!(
            resample(gradient(4, 4), 0.0, 2.0),
            Err(Error::InvalidGsd {
                name: "measured",
                ..
            })
        ));
        assert!(matches!(
            resample(gradient(4, 4), 2.0, f64::INFINITY),
            Err(Error::InvalidGsd { name: "target", .. })
        ));
    }
}
