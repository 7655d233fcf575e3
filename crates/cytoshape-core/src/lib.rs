//! cytoshape-core: sans-IO analysis core for microscopy frames.
//!
//! Three independent building blocks, all operating on in-memory `image`
//! buffers:
//!
//! - [`ProcessingPipeline`]: a reorderable list of pixel stages (contrast,
//!   linear transform, threshold, erode, dilate) run with ping-pong buffers,
//! - [`region`]: seeded region growing under a pluggable homogeneity
//!   predicate, reduced to the region's outer border,
//! - [`descriptor`]: polar-signature and Fourier shape descriptors of a
//!   segmented region.
//!
//! [`count`] and [`overlay`] build on these for particle counting and
//! preview rendering, and [`profile`] samples row or column intensities. Decoding files, plotting and exporting live in the
//! host (see `cytoshape-cli`).

pub mod contour;
pub mod count;
pub mod descriptor;
pub mod fourier;
pub mod grayscale;
pub mod morphology;
pub mod overlay;
pub mod pipeline;
pub mod profile;
pub mod region;
pub mod stage;
pub mod stats;
pub mod types;

use image::DynamicImage;

pub use count::{ParticleCount, PopulationTally, count_particles};
pub use descriptor::{ShapeAnalysis, ShapeDescriptor, analyze, extract};
pub use morphology::ElementShape;
pub use pipeline::{PipelineConfig, ProcessingPipeline};
pub use region::{GrowthConfig, Homogeneity, PredicateKind, Segmentation, grow, segment};
pub use stage::{Stage, ThresholdMode};
pub use types::{AnalysisError, BoundaryContour, Dimensions, PixelPoint, RegionMask};

/// Segmentation and shape analysis of one seeded region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionReport {
    /// Both growth passes and the border between them.
    pub segmentation: Segmentation,
    /// Centroid, curves and descriptor of the interior.
    pub shape: ShapeAnalysis,
}

/// Segment the region around `seed` and describe its shape.
///
/// # Steps
///
/// 1. Convert the frame to grayscale
/// 2. Grow from `seed` with the configured predicate and threshold
/// 3. Trace the region's outer border and fill its interior
/// 4. Compute the centroid, polar signature and Fourier harmonics of the
///    interior
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidSeed`] if `seed` is outside the frame,
/// [`AnalysisError::NoContours`] if the grown region has no border, and
/// [`AnalysisError::DivideByZero`] if the border collapses onto the
/// centroid.
pub fn describe(
    frame: &DynamicImage,
    seed: PixelPoint,
    config: &GrowthConfig,
) -> Result<RegionReport, AnalysisError> {
    let gray = grayscale::to_grayscale(frame);
    let segmentation = segment(&gray, seed, config.predicate, config.threshold)?;
    let shape = analyze(
        &segmentation.contour,
        &segmentation.interior,
        &gray,
        config.harmonics,
    )?;
    Ok(RegionReport {
        segmentation,
        shape,
    })
}
