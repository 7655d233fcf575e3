//! Particle counting on thresholded frames, and per-frame tallies across an
//! image sequence.

use std::collections::BTreeMap;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::contour;
use crate::types::{AnalysisError, BoundaryContour, Dimensions};

/// Borders found in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleCount {
    /// Number of borders traced.
    pub count: usize,
    /// The borders themselves, in discovery order.
    pub contours: Vec<BoundaryContour>,
}

/// Count the particles in a binarised frame.
///
/// The frame is converted to grayscale and every border of its non-zero
/// pixels is traced, holes included, so a particle with a hole counts
/// twice. Run a threshold stage first; on an unthresholded frame every
/// non-black pixel is foreground.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] for a zero-sized frame.
pub fn count_particles(frame: &DynamicImage) -> Result<ParticleCount, AnalysisError> {
    if Dimensions::of(frame).is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let gray = crate::grayscale::to_grayscale(frame);
    let contours = contour::trace_all(&gray);
    log::debug!(
        "counted {} particle border(s) in {}x{} frame",
        contours.len(),
        gray.width(),
        gray.height(),
    );
    Ok(ParticleCount {
        count: contours.len(),
        contours,
    })
}

/// Particle counts of an image sequence, keyed by frame index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationTally {
    counts: BTreeMap<usize, usize>,
}

impl PopulationTally {
    /// An empty tally.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Store the count for `frame`, returning the one it replaces.
    pub fn record(&mut self, frame: usize, count: usize) -> Option<usize> {
        self.counts.insert(frame, count)
    }

    /// Count recorded for `frame`.
    #[must_use]
    pub fn get(&self, frame: usize) -> Option<usize> {
        self.counts.get(&frame).copied()
    }

    /// Smallest non-zero count recorded.
    #[must_use]
    pub fn min(&self) -> Option<usize> {
        self.counts.values().copied().filter(|&c| c > 0).min()
    }

    /// Largest count recorded.
    #[must_use]
    pub fn max(&self) -> Option<usize> {
        self.counts.values().copied().max()
    }

    /// `(frame, count)` pairs in frame order.
    pub fn counts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.counts.iter().map(|(&frame, &count)| (frame, count))
    }

    /// Number of frames with a recorded count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn with_blocks(blocks: &[(u32, u32, u32, u32)]) -> DynamicImage {
        let mut img = GrayImage::new(30, 30);
        for &(x0, y0, x1, y1) in blocks {
            for y in y0..y1 {
                for x in x0..x1 {
                    img.put_pixel(x, y, image::Luma([255]));
                }
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn separate_blobs_are_counted() {
        let frame = with_blocks(&[(2, 2, 6, 6), (10, 10, 14, 14), (20, 3, 25, 8)]);
        let result = count_particles(&frame).unwrap();
        assert_eq!(result.count, 3);
        assert_eq!(result.contours.len(), 3);
    }

    #[test]
    fn blank_frame_has_no_particles() {
        let result = count_particles(&with_blocks(&[])).unwrap();
        assert_eq!(result.count, 0);
        assert!(result.contours.is_empty());
    }

    #[test]
    fn holes_count_as_borders() {
        let mut img = GrayImage::from_pixel(12, 12, image::Luma([0]));
        for y in 2..10 {
            for x in 2..10 {
                if !(4..8).contains(&x) || !(4..8).contains(&y) {
                    img.put_pixel(x, y, image::Luma([255]));
                }
            }
        }
        let result = count_particles(&DynamicImage::ImageLuma8(img)).unwrap();
        assert_eq!(result.count, 2);
    }

    #[test]
    fn colour_frames_are_converted() {
        let mut rgb = image::RgbImage::new(10, 10);
        for y in 3..6 {
            for x in 3..6 {
                rgb.put_pixel(x, y, image::Rgb([255, 255, 255]));
            }
        }
        let result = count_particles(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(result.count, 1);
    }

    #[test]
    fn zero_sized_frame_is_rejected() {
        let frame = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(
            count_particles(&frame),
            Err(AnalysisError::EmptyInput)
        ));
    }

    #[test]
    fn tally_tracks_extremes() {
        let mut tally = PopulationTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.min(), None);
        assert_eq!(tally.max(), None);

        tally.record(0, 12);
        tally.record(1, 0);
        tally.record(2, 7);
        assert_eq!(tally.record(0, 15), Some(12));

        assert_eq!(tally.len(), 3);
        assert_eq!(tally.get(0), Some(15));
        assert_eq!(tally.get(5), None);
        assert_eq!(tally.min(), Some(7), "zero counts are ignored");
        assert_eq!(tally.max(), Some(15));
        assert_eq!(tally.counts().collect::<Vec<_>>(), vec![(0, 15), (1, 0), (2, 7)]);
    }

    #[test]
    fn tally_serde_round_trip() {
        let mut tally = PopulationTally::new();
        tally.record(3, 4);
        tally.record(1, 9);
        let json = serde_json::to_string(&tally).unwrap();
        let parsed: PopulationTally = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tally);
    }
}
