//! Reorderable stage pipeline with ping-pong buffering.
//!
//! A [`ProcessingPipeline`] holds an ordered list of [`Stage`]s. Running it
//! allocates two frames of the input's size and layout: slot A holds the
//! input, slot B starts zeroed. Each stage reads the current slot and
//! writes the other, then the roles swap:
//!
//! ```text
//! stage 0: A -> B   current = B
//! stage 1: B -> A   current = A
//! stage 2: A -> B   current = B
//! ```
//!
//! The result is whichever slot is current after the last stage, or the
//! untouched input when no stages are configured.
//!
//! ```rust
//! # use cytoshape_core::{AnalysisError, ProcessingPipeline, Stage, ThresholdMode};
//! # fn run(frame: cytoshape_core::types::DynamicImage) -> Result<(), AnalysisError> {
//! let mut pipeline = ProcessingPipeline::default();
//! pipeline.push(Stage::Contrast { level: 1.4 });
//! pipeline.push(Stage::Threshold { level: 120, mode: ThresholdMode::Binary });
//! let _binary = pipeline.run(frame)?;
//! # Ok(())
//! # }
//! ```

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::stage::{Stage, blank_like};
use crate::types::AnalysisError;

/// Serialisable description of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stages in execution order.
    pub stages: Vec<Stage>,

    /// Upper bound on the structuring element radius of erode/dilate
    /// stages. Larger radii are clamped to this value.
    #[serde(default = "PipelineConfig::default_max_element_radius")]
    pub max_element_radius: u8,
}

impl PipelineConfig {
    /// Default upper bound on the structuring element radius.
    pub const DEFAULT_MAX_ELEMENT_RADIUS: u8 = 50;

    const fn default_max_element_radius() -> u8 {
        Self::DEFAULT_MAX_ELEMENT_RADIUS
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            max_element_radius: Self::DEFAULT_MAX_ELEMENT_RADIUS,
        }
    }
}

/// An ordered, caller-configured sequence of stages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessingPipeline {
    config: PipelineConfig,
}

impl ProcessingPipeline {
    /// Build a pipeline from a config. Invalid stages are dropped (see
    /// [`push`](Self::push)).
    #[must_use]
    pub fn from_config(config: PipelineConfig) -> Self {
        let mut pipeline = Self {
            config: PipelineConfig {
                stages: Vec::with_capacity(config.stages.len()),
                max_element_radius: config.max_element_radius,
            },
        };
        pipeline.configure(config.stages);
        pipeline
    }

    /// Replace the stage list.
    pub fn configure(&mut self, stages: impl IntoIterator<Item = Stage>) {
        self.clear();
        for stage in stages {
            self.push(stage);
        }
    }

    /// Append a stage.
    ///
    /// Stages with invalid parameters (e.g. a negative contrast level) are
    /// ignored and never applied. Returns whether the stage was accepted.
    pub fn push(&mut self, stage: Stage) -> bool {
        match stage.validate() {
            Ok(()) => {
                self.config.stages.push(stage);
                true
            }
            Err(reason) => {
                log::warn!("ignoring {} stage: {reason}", stage.name());
                false
            }
        }
    }

    /// Remove every stage.
    pub fn clear(&mut self) {
        self.config.stages.clear();
    }

    /// The active stages, in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.config.stages
    }

    /// The pipeline as a serialisable config.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `input`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnsupportedPixelFormat`] unless the frame is
    /// 8-bit `Luma`, `Rgb` or `Rgba`.
    pub fn run(&self, input: DynamicImage) -> Result<DynamicImage, AnalysisError> {
        crate::grayscale::require_supported(&input)?;
        if self.config.stages.is_empty() {
            return Ok(input);
        }

        log::debug!(
            "running {} stage(s) on {}x{} {:?} frame",
            self.config.stages.len(),
            input.width(),
            input.height(),
            input.color(),
        );

        let mut buffers = PingPong::new(input);
        for stage in &self.config.stages {
            buffers.step(|src, dst| stage.apply(src, dst, self.config.max_element_radius));
        }
        Ok(buffers.into_current())
    }
}

/// Two owned frames and the index of the one holding the current source.
struct PingPong {
    slots: [DynamicImage; 2],
    current: usize,
}

impl PingPong {
    fn new(input: DynamicImage) -> Self {
        let other = blank_like(&input);
        Self {
            slots: [input, other],
            current: 0,
        }
    }

    /// Run `f(current, other)` and make `other` current.
    fn step(&mut self, f: impl FnOnce(&DynamicImage, &mut DynamicImage)) {
        let [a, b] = &mut self.slots;
        if self.current == 0 {
            f(a, b);
        } else {
            f(b, a);
        }
        self.current ^= 1;
    }

    fn into_current(self) -> DynamicImage {
        let [a, b] = self.slots;
        if self.current == 0 { a } else { b }
    }
}
