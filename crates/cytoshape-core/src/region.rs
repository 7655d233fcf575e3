//! Seeded region growing.
//!
//! A [`RegionGrower`] floods outward from a seed pixel over 4-connected
//! neighbours, admitting each candidate whose intensity passes a
//! [`Homogeneity`] predicate. The frontier is a LIFO stack and every pixel
//! is admitted at most once, so a full growth is `O(width * height)`.
//!
//! Candidates must lie strictly inside the image (`0 < x < width`,
//! `0 < y < height`): row 0 and column 0 are never reached through a
//! neighbour. The seed itself is always a member, wherever it sits.
//!
//! [`segment`] chains two growth passes: the first finds the region, its
//! outer border is traced and redrawn onto a blank frame, and a second pass
//! from the same seed fills everything enclosed by that border.

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};

use crate::contour;
use crate::types::{AnalysisError, BoundaryContour, Dimensions, PixelPoint, RegionMask};

/// Per-pixel membership test for region growing.
///
/// Predicates may carry state across calls, so each growth needs a fresh
/// one; [`RegionGrower::new`] takes it by value.
pub trait Homogeneity {
    /// Whether a candidate pixel with this intensity joins the region.
    fn accepts(&mut self, intensity: u8) -> bool;
}

/// Accept pixels close to the running mean of every intensity evaluated.
///
/// The candidate is folded into the running sum and count *before* the
/// comparison, so the first candidate is always within distance zero of the
/// mean. Rejected candidates still contribute to the mean, and a pixel
/// rejected from one neighbour may be evaluated again from another.
#[derive(Debug, Clone)]
pub struct MeanAdaptive {
    threshold: i32,
    sum: i64,
    count: i64,
}

impl MeanAdaptive {
    /// A predicate with an empty running mean.
    #[must_use]
    pub const fn new(threshold: i32) -> Self {
        Self {
            threshold,
            sum: 0,
            count: 0,
        }
    }
}

impl Homogeneity for MeanAdaptive {
    fn accepts(&mut self, intensity: u8) -> bool {
        let value = i64::from(intensity);
        self.sum += value;
        self.count += 1;
        let mean = self.sum / self.count;
        (value - mean).abs() < i64::from(self.threshold)
    }
}

/// Accept pixels within `threshold` of a fixed reference intensity.
#[derive(Debug, Clone, Copy)]
pub struct FixedValue {
    reference: i32,
    threshold: i32,
}

impl FixedValue {
    /// Compare against `reference`.
    #[must_use]
    pub const fn new(reference: i32, threshold: i32) -> Self {
        Self {
            reference,
            threshold,
        }
    }
}

impl Homogeneity for FixedValue {
    fn accepts(&mut self, intensity: u8) -> bool {
        (i32::from(intensity) - self.reference).abs() < self.threshold
    }
}

/// Which homogeneity predicate a segmentation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// [`MeanAdaptive`] over the intensities seen so far.
    #[default]
    MeanAdaptive,
    /// [`FixedValue`] with the seed's own intensity as the reference.
    SeedValue,
}

impl std::fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeanAdaptive => write!(f, "mean"),
            Self::SeedValue => write!(f, "value"),
        }
    }
}

/// Lifecycle of a [`RegionGrower`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthState {
    /// No seed yet.
    NotStarted,
    /// The frontier may still hold pixels.
    Growing,
    /// The frontier is exhausted; the mask is final.
    Done,
}

/// Incremental seeded flood fill over a single-channel frame.
///
/// ```rust
/// # use cytoshape_core::region::{FixedValue, RegionGrower};
/// # use cytoshape_core::types::{GrayImage, PixelPoint};
/// # fn run() -> Result<(), cytoshape_core::AnalysisError> {
/// let source = GrayImage::from_pixel(8, 8, image::Luma([90]));
/// let mut grower = RegionGrower::new(&source, FixedValue::new(90, 3));
/// grower.start(PixelPoint::new(4, 4))?;
/// while grower.step() {}
/// let mask = grower.finish();
/// assert_eq!(mask.area(), 49);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RegionGrower<'a, H> {
    source: &'a GrayImage,
    predicate: H,
    visited: Vec<bool>,
    frontier: Vec<(u32, u32)>,
    mask: RegionMask,
    state: GrowthState,
}

impl<'a, H: Homogeneity> RegionGrower<'a, H> {
    /// Prepare a growth over `source`. Nothing is visited until
    /// [`start`](Self::start).
    #[must_use]
    pub fn new(source: &'a GrayImage, predicate: H) -> Self {
        let dimensions = Dimensions::of(source);
        Self {
            source,
            predicate,
            visited: vec![false; source.as_raw().len()],
            frontier: Vec::new(),
            mask: RegionMask::empty(dimensions),
            state: GrowthState::NotStarted,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> GrowthState {
        self.state
    }

    /// Seed the frontier.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidSeed`] if `seed` is outside the
    /// source image.
    pub fn start(&mut self, seed: PixelPoint) -> Result<(), AnalysisError> {
        let dimensions = Dimensions::of(self.source);
        let (x, y) = seed
            .to_unsigned()
            .filter(|_| seed.is_within(dimensions))
            .ok_or(AnalysisError::InvalidSeed {
                x: seed.x,
                y: seed.y,
                width: dimensions.width,
                height: dimensions.height,
            })?;

        let idx = self.index(x, y);
        self.visited[idx] = true;
        self.frontier.push((x, y));
        self.state = GrowthState::Growing;
        Ok(())
    }

    /// Pop one frontier pixel, mark it and queue its admissible neighbours.
    ///
    /// Returns `false` once the frontier is empty (or the grower was never
    /// started).
    pub fn step(&mut self) -> bool {
        if self.state != GrowthState::Growing {
            return false;
        }
        let Some((x, y)) = self.frontier.pop() else {
            self.state = GrowthState::Done;
            return false;
        };
        self.mask.mark(x, y);

        let (width, height) = self.source.dimensions();
        for (qx, qy) in neighbours(x, y, width, height) {
            let idx = self.index(qx, qy);
            if !self.visited[idx] && self.predicate.accepts(self.source.get_pixel(qx, qy).0[0]) {
                self.visited[idx] = true;
                self.frontier.push((qx, qy));
            }
        }
        true
    }

    /// Run to completion and return the grown mask.
    #[must_use]
    pub fn finish(mut self) -> RegionMask {
        while self.step() {}
        self.state = GrowthState::Done;
        self.mask
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.source.width() as usize + x as usize
    }
}

/// The 4-neighbours of `(x, y)` in `+x, +y, -x, -y` order that lie
/// strictly inside a `width` x `height` grid.
fn neighbours(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let (x, y) = (i64::from(x), i64::from(y));
    [(1, 0), (0, 1), (-1, 0), (0, -1)]
        .into_iter()
        .filter_map(move |(dx, dy)| {
            let qx = u32::try_from(x + dx).ok()?;
            let qy = u32::try_from(y + dy).ok()?;
            (qx > 0 && qy > 0 && qx < width && qy < height).then_some((qx, qy))
        })
}

/// Grow a region from `seed` in one call.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidSeed`] if `seed` is outside `source`.
pub fn grow<H: Homogeneity>(
    source: &GrayImage,
    seed: PixelPoint,
    predicate: H,
) -> Result<RegionMask, AnalysisError> {
    let mut grower = RegionGrower::new(source, predicate);
    grower.start(seed)?;
    let mask = grower.finish();
    log::debug!(
        "grew {} pixel(s) from ({}, {}) in {}x{} frame",
        mask.area(),
        seed.x,
        seed.y,
        source.width(),
        source.height(),
    );
    Ok(mask)
}

/// [`grow`] over a decoded frame.
///
/// # Errors
///
/// Returns [`AnalysisError::UnsupportedPixelFormat`] unless the frame is
/// single-channel 8-bit, and [`AnalysisError::InvalidSeed`] as [`grow`].
pub fn grow_frame<H: Homogeneity>(
    frame: &DynamicImage,
    seed: PixelPoint,
    predicate: H,
) -> Result<RegionMask, AnalysisError> {
    grow(crate::grayscale::require_gray(frame)?, seed, predicate)
}

/// Reduce a grown region to its outer border and the area it encloses.
///
/// The first outer border of `mask` is drawn one pixel wide onto a zero
/// frame, which is then grown again from `seed` accepting only zero pixels.
/// The returned interior mask therefore excludes the border itself and any
/// holes are filled.
///
/// # Errors
///
/// Returns [`AnalysisError::NoContours`] when `mask` has no member pixels
/// and [`AnalysisError::InvalidSeed`] when `seed` is outside the mask.
pub fn reduce_to_boundary(
    mask: &RegionMask,
    seed: PixelPoint,
) -> Result<(BoundaryContour, RegionMask), AnalysisError> {
    let boundary = contour::first_outer(mask.as_image()).ok_or(AnalysisError::NoContours)?;
    let drawn = contour::rasterize(&boundary, mask.dimensions());
    let interior = grow(&drawn, seed, FixedValue::new(0, 1))?;
    Ok((boundary, interior))
}

/// Output of [`segment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// First-pass mask: every pixel admitted by the predicate.
    pub region: RegionMask,
    /// Outer border of `region`, in tracing order.
    pub contour: BoundaryContour,
    /// Second-pass mask: the area enclosed by `contour`.
    pub interior: RegionMask,
}

/// Grow from `seed` with a fresh predicate of `kind`, then reduce the
/// result to its boundary.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidSeed`] for an out-of-bounds seed and
/// [`AnalysisError::NoContours`] if the region has no traceable border.
pub fn segment(
    source: &GrayImage,
    seed: PixelPoint,
    kind: PredicateKind,
    threshold: i32,
) -> Result<Segmentation, AnalysisError> {
    let region = match kind {
        PredicateKind::MeanAdaptive => grow(source, seed, MeanAdaptive::new(threshold))?,
        PredicateKind::SeedValue => {
            let reference = seed
                .to_unsigned()
                .filter(|_| seed.is_within(Dimensions::of(source)))
                .map_or(0, |(x, y)| i32::from(source.get_pixel(x, y).0[0]));
            grow(source, seed, FixedValue::new(reference, threshold))?
        }
    };
    let (contour, interior) = reduce_to_boundary(&region, seed)?;
    log::debug!(
        "{kind} segmentation: region {} px, border {} px, interior {} px",
        region.area(),
        contour.len(),
        interior.area(),
    );
    Ok(Segmentation {
        region,
        contour,
        interior,
    })
}

/// Settings for one seeded segmentation and shape description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Homogeneity predicate for the first growth pass.
    pub predicate: PredicateKind,

    /// Strict upper bound on the accepted intensity distance.
    pub threshold: i32,

    /// Number of Fourier harmonics to keep in the descriptor.
    pub harmonics: usize,
}

impl GrowthConfig {
    /// Default homogeneity predicate.
    pub const DEFAULT_PREDICATE: PredicateKind = PredicateKind::MeanAdaptive;

    /// Default intensity distance threshold.
    pub const DEFAULT_THRESHOLD: i32 = 10;

    /// Default number of Fourier harmonics.
    pub const DEFAULT_HARMONICS: usize = 10;
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            predicate: Self::DEFAULT_PREDICATE,
            threshold: Self::DEFAULT_THRESHOLD,
            harmonics: Self::DEFAULT_HARMONICS,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uniform(w: u32, h: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, image::Luma([value]))
    }

    /// 20x20 frame of 200 with a 10x10 square of 50 at (5..15, 5..15).
    fn dark_square() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                image::Luma([50])
            } else {
                image::Luma([200])
            }
        })
    }

    /// 6x2 frame whose only reachable row climbs by 4 per column.
    fn ramp() -> GrayImage {
        GrayImage::from_fn(6, 2, |x, _| image::Luma([u8::try_from(96 + 4 * x).unwrap()]))
    }

    #[test]
    fn uniform_fill_reaches_every_interior_pixel() {
        let source = uniform(10, 10, 100);
        let mask = grow(&source, PixelPoint::new(5, 5), FixedValue::new(100, 5)).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                let expected = x >= 1 && y >= 1;
                assert_eq!(
                    mask.contains(PixelPoint::new(x, y)),
                    expected,
                    "pixel ({x}, {y})",
                );
            }
        }
        assert_eq!(mask.area(), 81);
    }

    #[test]
    fn zero_threshold_keeps_only_the_seed() {
        let source = uniform(10, 10, 100);
        let mask = grow(&source, PixelPoint::new(5, 5), FixedValue::new(100, 0)).unwrap();
        assert_eq!(mask.area(), 1);
        assert!(mask.contains(PixelPoint::new(5, 5)));

        let mask = grow(&source, PixelPoint::new(5, 5), MeanAdaptive::new(0)).unwrap();
        assert_eq!(mask.area(), 1);
    }

    #[test]
    fn seed_on_edge_is_still_marked() {
        let source = uniform(4, 4, 7);
        let mask = grow(&source, PixelPoint::new(0, 0), FixedValue::new(7, 1)).unwrap();
        assert_eq!(mask.area(), 1);
        assert!(mask.contains(PixelPoint::new(0, 0)));
    }

    #[test]
    fn out_of_bounds_seed_is_rejected() {
        let source = uniform(10, 10, 100);
        for seed in [
            PixelPoint::new(-1, 0),
            PixelPoint::new(0, -1),
            PixelPoint::new(10, 0),
            PixelPoint::new(0, 10),
        ] {
            assert!(
                matches!(
                    grow(&source, seed, FixedValue::new(100, 5)),
                    Err(AnalysisError::InvalidSeed { .. })
                ),
                "seed {seed:?}",
            );
        }
    }

    #[test]
    fn mean_adaptive_follows_a_gradual_ramp_further() {
        let source = ramp();
        let seed = PixelPoint::new(1, 1);

        // Running means 104, 106, 108 admit columns 2..=4; 116 vs mean 110 fails.
        let adaptive = grow(&source, seed, MeanAdaptive::new(5)).unwrap();
        assert_eq!(adaptive.area(), 4);
        assert!(!adaptive.contains(PixelPoint::new(5, 1)));

        // Fixed reference 100: only 104 is within 5.
        let fixed = grow(&source, seed, FixedValue::new(100, 5)).unwrap();
        assert_eq!(fixed.area(), 2);
    }

    #[test]
    fn mean_adaptive_updates_before_comparing() {
        let mut predicate = MeanAdaptive::new(1);
        assert!(predicate.accepts(200), "first sample is its own mean");
        // sum 210, count 2, mean 105: |10 - 105| >= 1
        assert!(!predicate.accepts(10));
        // sum 315, count 3, mean 105
        assert!(predicate.accepts(105));
    }

    #[test]
    fn grower_state_machine() {
        let source = uniform(5, 5, 1);
        let mut grower = RegionGrower::new(&source, FixedValue::new(1, 1));
        assert_eq!(grower.state(), GrowthState::NotStarted);
        assert!(!grower.step(), "stepping before start is a no-op");

        grower.start(PixelPoint::new(2, 2)).unwrap();
        assert_eq!(grower.state(), GrowthState::Growing);

        let mut steps = 0;
        while grower.step() {
            steps += 1;
        }
        assert_eq!(steps, 16);
        assert_eq!(grower.state(), GrowthState::Done);
        assert_eq!(grower.finish().area(), 16);
    }

    #[test]
    fn grow_frame_requires_single_channel() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        assert!(matches!(
            grow_frame(&rgb, PixelPoint::new(1, 1), FixedValue::new(0, 1)),
            Err(AnalysisError::UnsupportedPixelFormat(_))
        ));

        let gray = DynamicImage::ImageLuma8(uniform(4, 4, 0));
        assert_eq!(
            grow_frame(&gray, PixelPoint::new(1, 1), FixedValue::new(0, 1))
                .unwrap()
                .area(),
            9
        );
    }

    #[test]
    fn boundary_of_square_encloses_its_interior() {
        let source = dark_square();
        let seed = PixelPoint::new(10, 10);
        let region = grow(&source, seed, FixedValue::new(50, 10)).unwrap();
        assert_eq!(region.area(), 100);

        let (contour, interior) = reduce_to_boundary(&region, seed).unwrap();
        assert_eq!(contour.len(), 36);
        assert_eq!(interior.area(), 64);
        assert!(!interior.contains(PixelPoint::new(5, 5)), "border is excluded");
        assert!(interior.contains(PixelPoint::new(6, 6)));
    }

    #[test]
    fn boundary_fills_holes() {
        let mut source = dark_square();
        source.put_pixel(9, 9, image::Luma([200]));
        let seed = PixelPoint::new(7, 7);
        let region = grow(&source, seed, FixedValue::new(50, 10)).unwrap();
        assert_eq!(region.area(), 99);

        let (_, interior) = reduce_to_boundary(&region, seed).unwrap();
        assert!(interior.contains(PixelPoint::new(9, 9)));
        assert_eq!(interior.area(), 64);
    }

    #[test]
    fn empty_mask_has_no_boundary() {
        let mask = RegionMask::empty(Dimensions {
            width: 6,
            height: 6,
        });
        assert!(matches!(
            reduce_to_boundary(&mask, PixelPoint::new(3, 3)),
            Err(AnalysisError::NoContours)
        ));
    }

    #[test]
    fn segment_with_seed_value_runs_both_passes() {
        let seg = segment(&dark_square(), PixelPoint::new(10, 10), PredicateKind::SeedValue, 10).unwrap();
        assert_eq!(seg.region.area(), 100);
        assert_eq!(seg.contour.len(), 36);
        assert_eq!(seg.interior.area(), 64);
    }

    #[test]
    fn segment_with_mean_stays_inside_the_square() {
        let seed = PixelPoint::new(10, 10);
        let seg = segment(&dark_square(), seed, PredicateKind::MeanAdaptive, 10).unwrap();
        assert!(seg.region.contains(seed));
        assert!(!seg.contour.is_empty());
        for y in 0..20 {
            for x in 0..20 {
                let p = PixelPoint::new(x, y);
                let inside = (5..15).contains(&x) && (5..15).contains(&y);
                if !inside {
                    assert!(!seg.region.contains(p), "({x}, {y}) leaked into the region");
                    assert!(!seg.interior.contains(p), "({x}, {y}) leaked into the interior");
                }
            }
        }
    }

    #[test]
    fn segment_rejects_bad_seed() {
        let source = dark_square();
        assert!(matches!(
            segment(&source, PixelPoint::new(20, 3), PredicateKind::SeedValue, 10),
            Err(AnalysisError::InvalidSeed { .. })
        ));
    }

    #[test]
    fn growth_config_defaults_and_serde() {
        let config = GrowthConfig::default();
        assert_eq!(config.predicate, PredicateKind::MeanAdaptive);
        assert_eq!(config.threshold, 10);
        assert_eq!(config.harmonics, 10);

        let parsed: GrowthConfig = serde_json::from_str(r#"{"predicate":"seed_value"}"#).unwrap();
        assert_eq!(parsed.predicate, PredicateKind::SeedValue);
        assert_eq!(parsed.threshold, GrowthConfig::DEFAULT_THRESHOLD);
    }
}
