//! Preview rendering of analysis results onto the source frame.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::types::{BoundaryContour, PixelPoint};

/// Colour of a segmented region's border.
pub const CONTOUR_COLOUR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Colour of the centroid marker and particle borders.
pub const MARKER_COLOUR: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Radius of the centroid marker in pixels.
pub const CENTROID_RADIUS: i32 = 2;

/// Draw a region's border in [`CONTOUR_COLOUR`] and its centroid as a
/// filled [`MARKER_COLOUR`] disc on a copy of `frame`.
#[must_use = "returns the annotated frame"]
pub fn draw_region_overlay(
    frame: &DynamicImage,
    contour: &BoundaryContour,
    centroid: PixelPoint,
) -> RgbaImage {
    let mut canvas = frame.to_rgba8();
    draw_closed_contour(&mut canvas, contour, CONTOUR_COLOUR);
    draw_filled_circle_mut(
        &mut canvas,
        (centroid.x, centroid.y),
        CENTROID_RADIUS,
        MARKER_COLOUR,
    );
    canvas
}

/// Draw every particle border in [`MARKER_COLOUR`] on a copy of `frame`.
#[must_use = "returns the annotated frame"]
pub fn draw_particle_overlay(frame: &DynamicImage, contours: &[BoundaryContour]) -> RgbaImage {
    let mut canvas = frame.to_rgba8();
    for contour in contours {
        draw_closed_contour(&mut canvas, contour, MARKER_COLOUR);
    }
    canvas
}

#[allow(clippy::cast_precision_loss)]
fn draw_closed_contour(canvas: &mut RgbaImage, contour: &BoundaryContour, colour: Rgba<u8>) {
    let pts = contour.points();
    match pts {
        [] => {}
        [only] => draw_filled_circle_mut(canvas, (only.x, only.y), 0, colour),
        _ => {
            for (i, p1) in pts.iter().enumerate() {
                let p2 = pts[(i + 1) % pts.len()];
                draw_line_segment_mut(
                    canvas,
                    (p1.x as f32, p1.y as f32),
                    (p2.x as f32, p2.y as f32),
                    colour,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(image::GrayImage::new(w, h))
    }

    fn square_contour() -> BoundaryContour {
        BoundaryContour::new(vec![
            PixelPoint::new(2, 2),
            PixelPoint::new(8, 2),
            PixelPoint::new(8, 8),
            PixelPoint::new(2, 8),
        ])
    }

    #[test]
    fn region_overlay_marks_contour_and_centroid() {
        let out = draw_region_overlay(&black(12, 12), &square_contour(), PixelPoint::new(5, 5));
        assert_eq!(out.dimensions(), (12, 12));
        assert_eq!(*out.get_pixel(2, 2), CONTOUR_COLOUR);
        assert_eq!(*out.get_pixel(5, 2), CONTOUR_COLOUR, "edge between corners");
        assert_eq!(*out.get_pixel(2, 5), CONTOUR_COLOUR, "closing edge");
        assert_eq!(*out.get_pixel(5, 5), MARKER_COLOUR);
        assert_eq!(*out.get_pixel(7, 5), MARKER_COLOUR);
        assert_eq!(*out.get_pixel(5, 7), MARKER_COLOUR);
        assert_eq!(out.get_pixel(10, 10).0, [0, 0, 0, 255]);
    }

    #[test]
    fn particle_overlay_draws_every_contour() {
        let a = BoundaryContour::new(vec![PixelPoint::new(1, 1), PixelPoint::new(3, 1)]);
        let b = BoundaryContour::new(vec![PixelPoint::new(6, 6)]);
        let out = draw_particle_overlay(&black(10, 10), &[a, b]);
        assert_eq!(*out.get_pixel(2, 1), MARKER_COLOUR);
        assert_eq!(*out.get_pixel(6, 6), MARKER_COLOUR);
        assert_eq!(out.get_pixel(8, 8).0, [0, 0, 0, 255]);
    }

    #[test]
    fn off_canvas_centroid_is_clipped() {
        let out = draw_region_overlay(
            &black(4, 4),
            &BoundaryContour::new(Vec::new()),
            PixelPoint::new(-10, -10),
        );
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }
}
