//! Shared types for the cytoshape analysis core.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can hand frames to the
/// grower without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `DynamicImage`, the frame type the stage pipeline operates on.
pub use image::DynamicImage;

/// Re-export `RgbaImage` for overlay rendering.
pub use image::RgbaImage;

/// A discrete pixel coordinate.
///
/// Signed so that hosts can pass raw cursor positions (which may fall
/// left of or above the image) and get an [`AnalysisError::InvalidSeed`]
/// back instead of a wrapped index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Column, counted from the left edge.
    pub x: i32,
    /// Row, counted from the top edge.
    pub y: i32,
}

impl PixelPoint {
    /// Create a new pixel coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns `true` if the point lies inside a `width` x `height` grid.
    #[must_use]
    pub fn is_within(self, dimensions: Dimensions) -> bool {
        self.x >= 0
            && self.y >= 0
            && u32::try_from(self.x).is_ok_and(|x| x < dimensions.width)
            && u32::try_from(self.y).is_ok_and(|y| y < dimensions.height)
    }

    /// Unsigned coordinates, or `None` if either axis is negative.
    #[must_use]
    pub fn to_unsigned(self) -> Option<(u32, u32)> {
        Some((u32::try_from(self.x).ok()?, u32::try_from(self.y).ok()?))
    }
}

/// A 2D point in floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance from the origin.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Angle from the positive x axis, in `(-π, π]`.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
}

/// A sequence of connected points forming a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of any `image` buffer.
    #[must_use]
    pub fn of<I: image::GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Ordered, closed sequence of pixels tracing the outer border of a blob.
///
/// The first point is 8-adjacent to the last; the closing point is not
/// repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryContour(Vec<PixelPoint>);

impl BoundaryContour {
    /// Wrap an ordered list of border pixels.
    #[must_use]
    pub const fn new(points: Vec<PixelPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of border pixels.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[PixelPoint] {
        &self.0
    }
}

impl From<imageproc::contours::Contour<u32>> for BoundaryContour {
    fn from(contour: imageproc::contours::Contour<u32>) -> Self {
        let points = contour
            .points
            .into_iter()
            .filter_map(|p| Some(PixelPoint::new(i32::try_from(p.x).ok()?, i32::try_from(p.y).ok()?)))
            .collect();
        Self(points)
    }
}

/// Value written into a [`RegionMask`] for member pixels.
pub const MEMBER: u8 = 255;

/// Binary mask of grown pixels: [`MEMBER`] inside the region, 0 elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMask(GrayImage);

impl RegionMask {
    /// An all-zero mask.
    #[must_use]
    pub fn empty(dimensions: Dimensions) -> Self {
        Self(GrayImage::new(dimensions.width, dimensions.height))
    }

    /// Wrap an existing binary image. Any non-zero pixel counts as a member.
    #[must_use]
    pub const fn from_image(image: GrayImage) -> Self {
        Self(image)
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.0)
    }

    /// Whether `(x, y)` is a member pixel. Out-of-bounds points are not.
    #[must_use]
    pub fn contains(&self, point: PixelPoint) -> bool {
        point
            .to_unsigned()
            .filter(|&(x, y)| x < self.0.width() && y < self.0.height())
            .is_some_and(|(x, y)| self.0.get_pixel(x, y).0[0] != 0)
    }

    /// Number of member pixels.
    #[must_use]
    pub fn area(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] != 0).count()
    }

    pub(crate) fn mark(&mut self, x: u32, y: u32) {
        self.0.put_pixel(x, y, image::Luma([MEMBER]));
    }

    /// Borrow the underlying image.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Consume the mask and return the underlying image.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Errors that can occur during analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A statistic or descriptor was requested over zero elements.
    #[error("input is empty")]
    EmptyInput,

    /// Normalisation or a centroid computation hit a zero denominator.
    #[error("division by zero")]
    DivideByZero,

    /// The growth seed lies outside the source image.
    #[error("seed ({x}, {y}) is outside the {width}x{height} image")]
    InvalidSeed {
        /// Seed column.
        x: i32,
        /// Seed row.
        y: i32,
        /// Source width.
        width: u32,
        /// Source height.
        height: u32,
    },

    /// A stage or growth parameter is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The frame has a channel count or bit depth the operation cannot handle.
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// A rank was requested beyond the end of the sequence.
    #[error("rank {k} is out of range for {len} elements")]
    RankOutOfRange {
        /// Requested rank.
        k: usize,
        /// Sequence length.
        len: usize,
    },

    /// Two images that must share a size do not.
    #[error("size mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Size of the reference image.
        expected: Dimensions,
        /// Size of the offending image.
        actual: Dimensions,
    },

    /// The mask contains no border to trace.
    #[error("no contours found in the mask")]
    NoContours,
}
