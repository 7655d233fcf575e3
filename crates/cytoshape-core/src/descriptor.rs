//! Shape descriptors of a segmented region.
//!
//! Given the region's boundary contour, its interior mask and the
//! grayscale source, [`analyze`] computes:
//!
//! 1. an intensity-weighted centroid (darker pixels weigh more),
//! 2. the contour recentred on the centroid with the y axis pointing up,
//!    closed by repeating its first point,
//! 3. the polar signature (angle, normalised radius) of every contour point,
//! 4. a descriptor vector: radius variance, number of radius peaks above
//!    the median, and the Fourier harmonics of the tangent-angle
//!    differential sampled every [`FOURIER_STRIDE`] points.
//!
//! [`extract`] returns just the descriptor.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::fourier::real_dft_packed;
use crate::stats;
use crate::types::{AnalysisError, BoundaryContour, Dimensions, PixelPoint, Point, Polyline, RegionMask};

/// Spacing, in contour points, between tangent samples.
pub const FOURIER_STRIDE: usize = 3;

/// Contour points in polar form about the centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarSignature {
    /// `atan2(y, x)` of each point, in `(-π, π]`.
    pub angles: Vec<f64>,
    /// Distance of each point from the centroid, scaled so the largest is 1.
    pub magnitudes: Vec<f64>,
}

/// Tangent direction sampled along the closed outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TangentProfile {
    /// Sample position mapped onto `[0, 2π)`: `i * 2π / len`.
    pub abscissa: Vec<f64>,
    /// Direction of the chord from sample `i` to sample `i + 1`.
    pub angles: Vec<f64>,
    /// Change in chord direction from the previous sample. The first entry
    /// is measured against the first chord itself, the last is always 0.
    pub differential: Vec<f64>,
}

/// Descriptor vector of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    /// Variance of the normalised polar magnitudes.
    pub magnitude_variance: f64,
    /// Number of contiguous runs of magnitudes above their median, counting
    /// a run that wraps from the last point to the first once.
    pub peak_count: usize,
    /// Mean number of contour points per polar angle. Not computed yet;
    /// always 1.0.
    pub mean_points_per_angle: f64,
    /// Leading packed DFT coefficients of the tangent differential.
    pub harmonics: Vec<f64>,
}

/// Descriptor plus the intermediate curves it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeAnalysis {
    /// Intensity-weighted centroid, truncated to whole pixels.
    pub centroid: PixelPoint,
    /// Contour relative to the centroid, y up, first point repeated last.
    pub outline: Polyline,
    /// Polar form of the open contour.
    pub signature: PolarSignature,
    /// `None` when the closed outline has [`FOURIER_STRIDE`] points or fewer.
    pub tangent: Option<TangentProfile>,
    /// The descriptor vector.
    pub descriptor: ShapeDescriptor,
}

/// Compute the descriptor vector of a region, keeping at most `harmonics`
/// Fourier coefficients.
///
/// # Errors
///
/// See [`analyze`].
pub fn extract(
    contour: &BoundaryContour,
    mask: &RegionMask,
    gray: &GrayImage,
    harmonics: usize,
) -> Result<ShapeDescriptor, AnalysisError> {
    analyze(contour, mask, gray, harmonics).map(|analysis| analysis.descriptor)
}

/// Compute the descriptor and every intermediate curve.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `contour` is empty,
/// [`AnalysisError::DimensionMismatch`] if `mask` and `gray` differ in
/// size, and [`AnalysisError::DivideByZero`] if every contour point lies on
/// the centroid.
pub fn analyze(
    contour: &BoundaryContour,
    mask: &RegionMask,
    gray: &GrayImage,
    harmonics: usize,
) -> Result<ShapeAnalysis, AnalysisError> {
    if contour.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let centroid = centroid(mask, gray)?;
    let outline = recentre(contour, centroid);
    let signature = polar_signature(&outline)?;

    let tangent = tangent_profile(&outline);
    let coefficients = tangent.as_ref().map_or_else(Vec::new, |profile| {
        let mut spectrum = real_dft_packed(&profile.differential);
        spectrum.truncate(harmonics);
        spectrum
    });

    let descriptor = ShapeDescriptor {
        magnitude_variance: stats::variance(&signature.magnitudes)?,
        peak_count: peak_count(&signature.magnitudes)?,
        mean_points_per_angle: 1.0,
        harmonics: coefficients,
    };
    log::debug!(
        "described {}-point contour about ({}, {}): variance {:.4}, {} peak(s), {} harmonic(s)",
        contour.len(),
        centroid.x,
        centroid.y,
        descriptor.magnitude_variance,
        descriptor.peak_count,
        descriptor.harmonics.len(),
    );

    Ok(ShapeAnalysis {
        centroid,
        outline,
        signature,
        tangent,
        descriptor,
    })
}

/// Centroid of the mask's member pixels weighted by `255 - intensity`.
///
/// Coordinates are truncated to whole pixels. A mask with zero total weight
/// (empty, or every member pixel white) yields the origin.
///
/// # Errors
///
/// Returns [`AnalysisError::DimensionMismatch`] if `mask` and `gray` differ
/// in size.
pub fn centroid(mask: &RegionMask, gray: &GrayImage) -> Result<PixelPoint, AnalysisError> {
    let expected = mask.dimensions();
    let actual = Dimensions::of(gray);
    if expected != actual {
        return Err(AnalysisError::DimensionMismatch { expected, actual });
    }

    let (mut sum_x, mut sum_y, mut total) = (0_u64, 0_u64, 0_u64);
    for (x, y, m) in mask.as_image().enumerate_pixels() {
        if m.0[0] == 0 {
            continue;
        }
        let weight = u64::from(255 - gray.get_pixel(x, y).0[0]);
        sum_x += weight * u64::from(x);
        sum_y += weight * u64::from(y);
        total += weight;
    }

    if total == 0 {
        return Ok(PixelPoint::new(0, 0));
    }
    Ok(PixelPoint::new(coord(sum_x / total), coord(sum_y / total)))
}

fn coord(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Translate the contour so the centroid is the origin, flip y to point
/// up, and close it.
fn recentre(contour: &BoundaryContour, centroid: PixelPoint) -> Polyline {
    let mut points: Vec<Point> = contour
        .points()
        .iter()
        .map(|p| Point::new(f64::from(p.x - centroid.x), -f64::from(p.y - centroid.y)))
        .collect();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    Polyline::new(points)
}

/// Polar form of the open contour (the closing point is skipped).
fn polar_signature(outline: &Polyline) -> Result<PolarSignature, AnalysisError> {
    let open = &outline.points()[..outline.len().saturating_sub(1)];
    let angles = open.iter().map(|p| p.angle()).collect();
    let mut magnitudes: Vec<f64> = open.iter().map(|p| p.norm()).collect();
    stats::normalize(&mut magnitudes, 1.0)?;
    Ok(PolarSignature { angles, magnitudes })
}

/// Count maximal runs of values strictly above the median, scanning in
/// order. A run touching both the last and the first index is one peak.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `magnitudes` is empty.
pub fn peak_count(magnitudes: &[f64]) -> Result<usize, AnalysisError> {
    let med = stats::median(magnitudes)?;
    let mut peaks = 0_usize;
    let mut in_peak = false;
    for &m in magnitudes {
        if !in_peak && m > med {
            peaks += 1;
            in_peak = true;
        } else if in_peak && m <= med {
            in_peak = false;
        }
    }
    if in_peak && magnitudes[0] > med {
        peaks = peaks.saturating_sub(1);
    }
    Ok(peaks)
}

/// Chord directions between every [`FOURIER_STRIDE`]-th outline point and
/// their successive differences.
#[allow(clippy::cast_precision_loss)]
fn tangent_profile(outline: &Polyline) -> Option<TangentProfile> {
    let pts = outline.points();
    let d = FOURIER_STRIDE;
    if pts.len() <= d {
        return None;
    }

    let size = pts.len() / d;
    let chord = |i: usize| {
        let (a, b) = (pts[i * d], pts[i * d + d]);
        (b.y - a.y).atan2(b.x - a.x)
    };

    let mut abscissa = vec![0.0; size];
    let mut angles = vec![0.0; size];
    let mut differential = vec![0.0; size];
    let mut previous = chord(0);
    // The last sample has no successor chord inside the outline; it stays 0.
    for i in 0..size - 1 {
        let angle = chord(i);
        abscissa[i] = i as f64 * (std::f64::consts::TAU / size as f64);
        angles[i] = angle;
        differential[i] = angle - previous;
        previous = angle;
    }

    Some(TangentProfile {
        abscissa,
        angles,
        differential,
    })
}
