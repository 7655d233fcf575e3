//! Intensity profiles along one row or one column of a grayscale frame.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Which line of the frame a profile was sampled along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Line {
    /// Row `y`, sampled left to right.
    Row(u32),
    /// Column `x`, sampled top to bottom.
    Column(u32),
}

/// Intensities sampled along a [`Line`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityProfile {
    /// The sampled line.
    pub line: Line,
    /// One intensity per pixel along the line.
    pub values: Vec<u8>,
}

/// Sample every pixel on `line`, or `None` if it lies outside the frame.
#[must_use]
pub fn sample(frame: &GrayImage, line: Line) -> Option<IntensityProfile> {
    let values = match line {
        Line::Row(y) if y < frame.height() => {
            (0..frame.width()).map(|x| frame.get_pixel(x, y).0[0]).collect()
        }
        Line::Column(x) if x < frame.width() => {
            (0..frame.height()).map(|y| frame.get_pixel(x, y).0[0]).collect()
        }
        _ => return None,
    };
    Some(IntensityProfile { line, values })
}

/// Intensities along row `y`.
#[must_use]
pub fn row_profile(frame: &GrayImage, y: u32) -> Option<Vec<u8>> {
    sample(frame, Line::Row(y)).map(|p| p.values)
}

/// Intensities along column `x`.
#[must_use]
pub fn column_profile(frame: &GrayImage, x: u32) -> Option<Vec<u8>> {
    sample(frame, Line::Column(x)).map(|p| p.values)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ramp() -> GrayImage {
        // value = 10 * y + x
        GrayImage::from_fn(4, 3, |x, y| image::Luma([u8::try_from(10 * y + x).unwrap()]))
    }

    #[test]
    fn row_runs_left_to_right() {
        assert_eq!(row_profile(&ramp(), 1).unwrap(), vec![10, 11, 12, 13]);
    }

    #[test]
    fn column_runs_top_to_bottom() {
        assert_eq!(column_profile(&ramp(), 3).unwrap(), vec![3, 13, 23]);
    }

    #[test]
    fn lines_outside_the_frame_are_rejected() {
        assert_eq!(row_profile(&ramp(), 3), None);
        assert_eq!(column_profile(&ramp(), 4), None);
        assert_eq!(row_profile(&GrayImage::new(0, 0), 0), None);
    }

    #[test]
    fn profile_serializes_its_line() {
        let profile = sample(&ramp(), Line::Column(0)).unwrap();
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"line":{"column":0},"values":[0,10,20]}"#);
    }
}
