//! Image decoding using the `image` crate.

use crate::error::{Error, Result};
use image::{ImageFormat, RgbImage};
use std::path::Path;

/// Decoded image data.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixels converted to 8-bit RGB.
    pub pixels: RgbImage,
    /// Container format the bytes were decoded from.
    pub format: ImageFormat,
}

/// Decode an image file to RGB8.
///
/// Supports JPEG, PNG, and TIFF.
pub fn decode_image_file(path: &Path) -> Result<DecodedImage> {
    let bytes = std::fs::read(path).map_err(|e| Error::ImageOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    decode_image_bytes(&bytes, &path.display().to_string())
}

/// Decode in-memory image bytes to RGB8.
///
/// `name` is only used in error messages.
pub fn decode_image_bytes(bytes: &[u8], name: &str) -> Result<DecodedImage> {
    let decode_error = |source| Error::ImageDecode {
        name: name.to_string(),
        source,
    };

    let format = image::guess_format(bytes).map_err(decode_error)?;
    if !is_supported_format(format) {
        return Err(decode_error(image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                format.into(),
                image::error::UnsupportedErrorKind::Format(format.into()),
            ),
        )));
    }

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(decode_error)?;

    Ok(DecodedImage {
        pixels: decoded.into_rgb8(),
        format,
    })
}

/// Whether the format is one the pipeline accepts.
pub const fn is_supported_format(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_png_round_trip() {
        let image = RgbImage::from_pixel(12, 9, Rgb([10, 20, 30]));
        let decoded = decode_image_bytes(&encode(&image, ImageFormat::Png), "mem.png").unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(decoded.pixels, image);
    }

    #[test]
    fn test_decode_tiff() {
        let image = RgbImage::from_pixel(5, 4, Rgb([1, 2, 3]));
        let decoded = decode_image_bytes(&encode(&image, ImageFormat::Tiff), "mem.tif").unwrap();
        assert_eq!(decoded.pixels.dimensions(), (5, 4));
    }

    #[test]
    fn test_decode_corrupt_bytes_is_decode_error() {
        let result = decode_image_bytes(b"definitely not an image", "junk.jpg");
        assert!(matches!(result, Err(Error::ImageDecode { .. })));
    }

    #[test]
    fn test_decode_truncated_png_is_decode_error() {
        let image = RgbImage::from_pixel(32, 32, Rgb([200, 100, 50]));
        let bytes = encode(&image, ImageFormat::Png);
        let result = decode_image_bytes(&bytes[..bytes.len() / 2], "half.png");
        assert!(matches!(result, Err(Error::ImageDecode { .. })));
    }

    #[test]
    fn test_decode_missing_file_is_open_error() {
        let result = decode_image_file(Path::new("/nonexistent/aerial.jpg"));
        assert!(matches!(result, Err(Error::ImageOpen { .. })));
    }
}
