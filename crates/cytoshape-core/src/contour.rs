//! Border tracing on binary masks.
//!
//! Thin layer over `imageproc::contours::find_contours` (Suzuki-Abe border
//! following). Any non-zero pixel is foreground. Points come back in
//! tracing order without approximation, so consecutive points are
//! 8-adjacent.

use image::GrayImage;
use imageproc::contours::{BorderType, Contour};

use crate::types::{BoundaryContour, Dimensions, MEMBER};

/// Every border in `mask`, outer and hole alike, in discovery order.
#[must_use]
pub fn trace_all(mask: &GrayImage) -> Vec<BoundaryContour> {
    imageproc::contours::find_contours::<u32>(mask)
        .into_iter()
        .map(BoundaryContour::from)
        .collect()
}

/// The first outer border found in `mask`, scanning rows top to bottom.
///
/// For a mask holding a single blob this is that blob's external boundary.
#[must_use]
pub fn first_outer(mask: &GrayImage) -> Option<BoundaryContour> {
    let contours: Vec<Contour<u32>> = imageproc::contours::find_contours(mask);
    contours
        .into_iter()
        .find(|c| c.border_type == BorderType::Outer && !c.points.is_empty())
        .map(BoundaryContour::from)
}

/// Draw `contour` one pixel wide onto a fresh zero image.
///
/// Points outside `dimensions` are skipped.
#[must_use]
pub fn rasterize(contour: &BoundaryContour, dimensions: Dimensions) -> GrayImage {
    let mut out = GrayImage::new(dimensions.width, dimensions.height);
    for p in contour.points() {
        if let Some((x, y)) = p.to_unsigned()
            && x < dimensions.width
            && y < dimensions.height
        {
            out.put_pixel(x, y, image::Luma([MEMBER]));
        }
    }
    out
}
