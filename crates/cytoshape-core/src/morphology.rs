//! Grayscale erosion and dilation with a shaped structuring element.
//!
//! Wraps [`imageproc::morphology::grayscale_erode`] and
//! [`imageproc::morphology::grayscale_dilate`]. Those only accept
//! `GrayImage`, so colour frames are split into channels, each channel is
//! processed independently, and the result is reassembled. Min/max
//! filtering is per-channel by definition, so this matches processing the
//! colour frame directly.

use image::{DynamicImage, GrayImage, ImageBuffer, Pixel};
use imageproc::morphology::Mask;
use serde::{Deserialize, Serialize};

/// Shape of the structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementShape {
    /// Filled disk inscribed in the `(2r+1)` square.
    #[default]
    Ellipse,
    /// The full `(2r+1)` square.
    Rect,
    /// One row and one column through the anchor.
    Cross,
}

impl ElementShape {
    /// Build the structuring element for `radius`, anchored at its centre.
    #[must_use]
    pub fn mask(self, radius: u8) -> Mask {
        match self {
            Self::Ellipse => Mask::disk(radius),
            Self::Rect => Mask::square(radius),
            Self::Cross => {
                let side = 2 * u32::from(radius) + 1;
                let r = u32::from(radius);
                let cross = GrayImage::from_fn(side, side, |x, y| {
                    if x == r || y == r {
                        image::Luma([255])
                    } else {
                        image::Luma([0])
                    }
                });
                Mask::from_image(&cross, radius, radius)
            }
        }
    }
}

/// Which morphological operator to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Local minimum under the element.
    Erode,
    /// Local maximum under the element.
    Dilate,
}

/// Apply `operator` to every channel of `frame`.
///
/// A zero radius (a 1x1 element) returns a copy of the frame.
#[must_use = "returns the filtered frame"]
pub fn apply(frame: &DynamicImage, operator: Operator, shape: ElementShape, radius: u8) -> DynamicImage {
    if radius == 0 {
        return frame.clone();
    }

    let mask = shape.mask(radius);
    let filter = |channel: &GrayImage| match operator {
        Operator::Erode => imageproc::morphology::grayscale_erode(channel, &mask),
        Operator::Dilate => imageproc::morphology::grayscale_dilate(channel, &mask),
    };

    match frame {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(filter(gray)),
        DynamicImage::ImageRgb8(rgb) => DynamicImage::ImageRgb8(per_channel(rgb, filter)),
        DynamicImage::ImageRgba8(rgba) => DynamicImage::ImageRgba8(per_channel(rgba, filter)),
        other => other.clone(),
    }
}

/// Split into single-channel images, filter each, and reassemble.
fn per_channel<P, F>(image: &ImageBuffer<P, Vec<u8>>, filter: F) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
    F: Fn(&GrayImage) -> GrayImage,
{
    let (w, h) = image.dimensions();
    let channels = usize::from(P::CHANNEL_COUNT);

    let filtered: Vec<GrayImage> = (0..channels)
        .map(|c| {
            let plane = GrayImage::from_fn(w, h, |x, y| {
                image::Luma([image.get_pixel(x, y).channels()[c]])
            });
            filter(&plane)
        })
        .collect();

    let mut out = ImageBuffer::<P, Vec<u8>>::new(w, h);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        for (c, plane) in filtered.iter().enumerate() {
            pixel.channels_mut()[c] = plane.get_pixel(x, y).0[0];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 11x11 black frame with a single white pixel in the middle.
    fn dot() -> GrayImage {
        let mut img = GrayImage::new(11, 11);
        img.put_pixel(5, 5, image::Luma([255]));
        img
    }

    fn white_count(frame: &DynamicImage) -> usize {
        frame.to_luma8().pixels().filter(|p| p.0[0] == 255).count()
    }

    #[test]
    fn zero_radius_is_identity() {
        let frame = DynamicImage::ImageLuma8(dot());
        let out = apply(&frame, Operator::Dilate, ElementShape::Ellipse, 0);
        assert_eq!(out, frame);
    }

    #[test]
    fn dilate_rect_grows_dot_to_square() {
        let frame = DynamicImage::ImageLuma8(dot());
        let out = apply(&frame, Operator::Dilate, ElementShape::Rect, 1);
        assert_eq!(white_count(&out), 9);
    }

    #[test]
    fn dilate_cross_grows_dot_to_plus() {
        let frame = DynamicImage::ImageLuma8(dot());
        let out = apply(&frame, Operator::Dilate, ElementShape::Cross, 1);
        assert_eq!(white_count(&out), 5);
        let gray = out.to_luma8();
        assert_eq!(gray.get_pixel(4, 4).0[0], 0, "corners stay dark");
        assert_eq!(gray.get_pixel(5, 4).0[0], 255);
    }

    #[test]
    fn ellipse_is_between_cross_and_square() {
        let frame = DynamicImage::ImageLuma8(dot());
        let disk = white_count(&apply(&frame, Operator::Dilate, ElementShape::Ellipse, 3));
        let square = white_count(&apply(&frame, Operator::Dilate, ElementShape::Rect, 3));
        let cross = white_count(&apply(&frame, Operator::Dilate, ElementShape::Cross, 3));
        assert!(cross < disk && disk < square, "cross={cross} disk={disk} square={square}");
    }

    #[test]
    fn erode_removes_isolated_dot() {
        let frame = DynamicImage::ImageLuma8(dot());
        let out = apply(&frame, Operator::Erode, ElementShape::Ellipse, 1);
        assert_eq!(white_count(&out), 0);
    }

    #[test]
    fn colour_frames_are_processed_per_channel() {
        let mut rgb = image::RgbImage::new(9, 9);
        rgb.put_pixel(4, 4, image::Rgb([200, 0, 50]));
        let out = apply(
            &DynamicImage::ImageRgb8(rgb),
            Operator::Dilate,
            ElementShape::Rect,
            1,
        );
        let DynamicImage::ImageRgb8(out) = out else {
            unreachable!("colour layout must be preserved");
        };
        assert_eq!(out.get_pixel(3, 3).0, [200, 0, 50]);
        assert_eq!(out.get_pixel(5, 5).0, [200, 0, 50]);
        assert_eq!(out.get_pixel(7, 7).0, [0, 0, 0]);
    }
}
