//! Image decoding, pixel-format checks and grayscale conversion.
//!
//! The stage pipeline accepts 8-bit single-channel or 3/4-channel frames;
//! the grower and descriptor stages need single-channel intensity. This
//! module is where frames cross between the two.

use image::{DynamicImage, GrayImage, Luma};

use crate::types::AnalysisError;

/// Decode raw image bytes (PNG, JPEG, BMP, WebP, TIFF).
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `bytes` is empty.
/// Returns [`AnalysisError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Convert any frame to 8-bit grayscale.
///
/// Colour frames use the BT.601 luminance weights
/// (`0.299*R + 0.587*G + 0.114*B`, rounded) and alpha is ignored.
/// Single-channel frames are copied unchanged.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(frame: &DynamicImage) -> GrayImage {
    match frame {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            frame.to_luma8()
        }
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([bt601_luma(r, g, b)])
            })
        }
    }
}

/// Fixed-point BT.601 weights scaled by `1 << LUMA_SHIFT`; they sum to
/// exactly `1 << LUMA_SHIFT` so white stays 255.
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    let rounded = (weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT;
    u8::try_from(rounded).unwrap_or(u8::MAX)
}

/// Borrow a frame as single-channel 8-bit intensity.
///
/// # Errors
///
/// Returns [`AnalysisError::UnsupportedPixelFormat`] for any other layout.
pub fn require_gray(frame: &DynamicImage) -> Result<&GrayImage, AnalysisError> {
    match frame {
        DynamicImage::ImageLuma8(gray) => Ok(gray),
        other => Err(unsupported(other)),
    }
}

/// Check that a frame is one of the 8-bit layouts the stage pipeline
/// handles: `Luma8`, `Rgb8` or `Rgba8`.
///
/// # Errors
///
/// Returns [`AnalysisError::UnsupportedPixelFormat`] otherwise.
pub fn require_supported(frame: &DynamicImage) -> Result<(), AnalysisError> {
    match frame {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
            Ok(())
        }
        other => Err(unsupported(other)),
    }
}

fn unsupported(frame: &DynamicImage) -> AnalysisError {
    AnalysisError::UnsupportedPixelFormat(format!("{:?}", frame.color()))
}
