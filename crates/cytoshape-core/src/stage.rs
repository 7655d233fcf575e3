//! Processing stages: the tagged variants a [`ProcessingPipeline`] runs.
//!
//! Each stage reads one frame and writes another. Pixelwise stages
//! (contrast, linear, threshold) write straight into the destination
//! buffer when its layout already matches, so the pipeline's second slot
//! is reused from stage to stage.
//!
//! [`ProcessingPipeline`]: crate::pipeline::ProcessingPipeline

use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};

use crate::morphology::{self, ElementShape, Operator};
use crate::types::AnalysisError;

/// How [`Stage::Threshold`] maps intensities.
///
/// With `v` the pixel intensity and `t` the level:
///
/// | mode               | `v > t` | `v <= t` |
/// |--------------------|---------|----------|
/// | `Binary`           | 255     | 0        |
/// | `BinaryInverted`   | 0       | 255      |
/// | `ToZero`           | v       | 0        |
/// | `ToZeroInverted`   | 0       | v        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Above the level becomes white, the rest black.
    Binary,
    /// Above the level becomes black, the rest white.
    BinaryInverted,
    /// Values at or below the level are zeroed.
    #[default]
    ToZero,
    /// Values above the level are zeroed.
    ToZeroInverted,
}

impl ThresholdMode {
    /// Map a single intensity.
    #[must_use]
    pub const fn map(self, value: u8, level: u8) -> u8 {
        let above = value > level;
        match self {
            Self::Binary => {
                if above {
                    255
                } else {
                    0
                }
            }
            Self::BinaryInverted => {
                if above {
                    0
                } else {
                    255
                }
            }
            Self::ToZero => {
                if above {
                    value
                } else {
                    0
                }
            }
            Self::ToZeroInverted => {
                if above {
                    0
                } else {
                    value
                }
            }
        }
    }
}

/// One step of a processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stage {
    /// Multiply every channel by `level`, saturating to `0..=255`.
    Contrast {
        /// Gain; must be finite and non-negative.
        level: f64,
    },
    /// `gain * v + offset` on every channel, saturating to `0..=255`.
    Linear {
        /// Gain; must be finite and non-negative.
        gain: f64,
        /// Brightness offset added after the gain.
        offset: f64,
    },
    /// Threshold the grayscale intensity. Always produces a single-channel
    /// frame.
    Threshold {
        /// Threshold level.
        level: u8,
        /// Mapping applied on either side of the level.
        #[serde(default)]
        mode: ThresholdMode,
    },
    /// Morphological erosion.
    Erode {
        /// Element radius; the element spans `2 * radius + 1` pixels.
        radius: u32,
        /// Element shape.
        #[serde(default)]
        shape: ElementShape,
    },
    /// Morphological dilation.
    Dilate {
        /// Element radius; the element spans `2 * radius + 1` pixels.
        radius: u32,
        /// Element shape.
        #[serde(default)]
        shape: ElementShape,
    },
    /// Histogram equalisation. Not implemented: copies its input.
    Equalize,
}

impl Stage {
    /// Short human-readable name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Contrast { .. } => "contrast",
            Self::Linear { .. } => "linear",
            Self::Threshold { .. } => "threshold",
            Self::Erode { .. } => "erode",
            Self::Dilate { .. } => "dilate",
            Self::Equalize => "equalize",
        }
    }

    /// Check the stage's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] for a negative or
    /// non-finite gain, or a non-finite offset.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match *self {
            Self::Contrast { level } if !(level.is_finite() && level >= 0.0) => Err(
                AnalysisError::InvalidConfig(format!("contrast level must be >= 0, got {level}")),
            ),
            Self::Linear { gain, .. } if !(gain.is_finite() && gain >= 0.0) => Err(
                AnalysisError::InvalidConfig(format!("linear gain must be >= 0, got {gain}")),
            ),
            Self::Linear { offset, .. } if !offset.is_finite() => Err(AnalysisError::InvalidConfig(
                format!("linear offset must be finite, got {offset}"),
            )),
            _ => Ok(()),
        }
    }

    /// Read `src` and write the result into `dst`.
    ///
    /// `max_radius` caps the element radius of morphological stages.
    /// Zero-sized frames pass through unchanged.
    pub fn apply(&self, src: &DynamicImage, dst: &mut DynamicImage, max_radius: u8) {
        if src.width() == 0 || src.height() == 0 {
            dst.clone_from(src);
            return;
        }

        match *self {
            Self::Contrast { level } => scale_into(src, dst, level, 0.0),
            Self::Linear { gain, offset } => scale_into(src, dst, gain, offset),
            Self::Threshold { level, mode } => threshold_into(src, dst, level, mode),
            Self::Erode { radius, shape } => {
                *dst = morphology::apply(src, Operator::Erode, shape, clamp_radius(radius, max_radius));
            }
            Self::Dilate { radius, shape } => {
                *dst = morphology::apply(src, Operator::Dilate, shape, clamp_radius(radius, max_radius));
            }
            Self::Equalize => {
                log::debug!("equalize stage is a stub; frame copied unchanged");
                dst.clone_from(src);
            }
        }
    }
}

fn clamp_radius(radius: u32, max_radius: u8) -> u8 {
    u8::try_from(radius).map_or(max_radius, |r| r.min(max_radius))
}

/// Returns `true` if both frames share a colour layout and size.
fn same_layout(a: &DynamicImage, b: &DynamicImage) -> bool {
    a.color() == b.color() && a.dimensions() == b.dimensions()
}

/// Zero frame with the same layout and size as `frame`.
pub(crate) fn blank_like(frame: &DynamicImage) -> DynamicImage {
    DynamicImage::new(frame.width(), frame.height(), frame.color())
}

/// Saturating `gain * v + offset`, rounded to nearest.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn saturate(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn scale_into(src: &DynamicImage, dst: &mut DynamicImage, gain: f64, offset: f64) {
    if !same_layout(src, dst) {
        *dst = blank_like(src);
    }
    match (src, dst) {
        (DynamicImage::ImageLuma8(s), DynamicImage::ImageLuma8(d)) => scale_buffer(s, d, gain, offset),
        (DynamicImage::ImageRgb8(s), DynamicImage::ImageRgb8(d)) => scale_buffer(s, d, gain, offset),
        (DynamicImage::ImageRgba8(s), DynamicImage::ImageRgba8(d)) => scale_buffer(s, d, gain, offset),
        // Other layouts are rejected before a pipeline runs.
        _ => {}
    }
}

fn scale_buffer<P: Pixel<Subpixel = u8>>(
    src: &ImageBuffer<P, Vec<u8>>,
    dst: &mut ImageBuffer<P, Vec<u8>>,
    gain: f64,
    offset: f64,
) {
    for (out, &v) in dst.iter_mut().zip(src.iter()) {
        *out = saturate(gain.mul_add(f64::from(v), offset));
    }
}

fn threshold_into(src: &DynamicImage, dst: &mut DynamicImage, level: u8, mode: ThresholdMode) {
    let (w, h) = src.dimensions();
    let reuse = matches!(dst, DynamicImage::ImageLuma8(d) if d.dimensions() == (w, h));
    if !reuse {
        *dst = DynamicImage::ImageLuma8(image::GrayImage::new(w, h));
    }

    let converted;
    let gray = if let DynamicImage::ImageLuma8(g) = src {
        g
    } else {
        converted = crate::grayscale::to_grayscale(src);
        &converted
    };

    if let DynamicImage::ImageLuma8(d) = dst {
        for (out, &v) in d.iter_mut().zip(gray.iter()) {
            *out = mode.map(v, level);
        }
    }
}
