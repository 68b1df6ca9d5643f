//! Builder utilities for configuring segmentation pipelines.
//!
//! Exposes the labelling strategy selection surface and the validation run
//! before a [`Pipeline`] is constructed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    error::DendraError,
    hierarchy::{Criterion, LinkageKind},
    pipeline::Pipeline,
};

/// Selects how the fine graph is cut into initial regions before the region
/// graph is built.
///
/// # Examples
/// ```
/// use dendra_core::LabellingStrategy;
///
/// let strategy = LabellingStrategy::default();
/// assert_eq!(strategy, LabellingStrategy::Watershed);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LabellingStrategy {
    /// Watershed basins flooded from the regional minima of the edge weights.
    #[default]
    Watershed,
    /// Connected components of the edges weighing at most `threshold`.
    Threshold {
        /// Heaviest edge weight kept inside a region.
        threshold: f64,
    },
}

/// Configures and constructs [`Pipeline`] instances.
///
/// # Examples
/// ```
/// use dendra_core::{Criterion, LinkageKind, PipelineBuilder};
///
/// let pipeline = PipelineBuilder::new()
///     .with_linkage(LinkageKind::Single)
///     .with_criterion(Some(Criterion::Area))
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(pipeline.linkage(), LinkageKind::Single);
/// assert_eq!(pipeline.criterion(), Some(Criterion::Area));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PipelineBuilder {
    linkage: LinkageKind,
    criterion: Option<Criterion>,
    labelling: LabellingStrategy,
}

impl PipelineBuilder {
    /// Creates a builder populated with default parameters: average linkage,
    /// watershed labelling and no simplification.
    ///
    /// # Examples
    /// ```
    /// use dendra_core::{LabellingStrategy, LinkageKind, PipelineBuilder};
    ///
    /// let builder = PipelineBuilder::new();
    /// assert_eq!(builder.linkage(), LinkageKind::Average);
    /// assert_eq!(builder.criterion(), None);
    /// assert_eq!(builder.labelling(), LabellingStrategy::Watershed);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the linkage used to weigh merged region boundaries.
    #[must_use]
    pub fn with_linkage(mut self, linkage: LinkageKind) -> Self {
        self.linkage = linkage;
        self
    }

    /// Returns the configured linkage.
    #[must_use]
    pub fn linkage(&self) -> LinkageKind {
        self.linkage
    }

    /// Sets the significance criterion used to simplify the hierarchy, or
    /// `None` to keep the raw partition tree.
    ///
    /// # Examples
    /// ```
    /// use dendra_core::{Criterion, PipelineBuilder};
    ///
    /// let builder = PipelineBuilder::new().with_criterion(Some(Criterion::Volume));
    /// assert_eq!(builder.criterion(), Some(Criterion::Volume));
    /// ```
    #[must_use]
    pub fn with_criterion(mut self, criterion: Option<Criterion>) -> Self {
        self.criterion = criterion;
        self
    }

    /// Returns the configured simplification criterion.
    #[must_use]
    pub fn criterion(&self) -> Option<Criterion> {
        self.criterion
    }

    /// Sets the strategy producing the initial regions.
    #[must_use]
    pub fn with_labelling(mut self, labelling: LabellingStrategy) -> Self {
        self.labelling = labelling;
        self
    }

    /// Returns the configured labelling strategy.
    #[must_use]
    pub fn labelling(&self) -> LabellingStrategy {
        self.labelling
    }

    /// Validates the configuration and constructs a [`Pipeline`].
    ///
    /// # Errors
    /// Returns [`DendraError::InvalidThreshold`] when the threshold labelling
    /// strategy carries a NaN or infinite threshold.
    ///
    /// # Examples
    /// ```
    /// use dendra_core::{DendraError, LabellingStrategy, PipelineBuilder};
    ///
    /// let err = PipelineBuilder::new()
    ///     .with_labelling(LabellingStrategy::Threshold { threshold: f64::NAN })
    ///     .build()
    ///     .expect_err("NaN threshold is rejected");
    /// assert!(matches!(err, DendraError::InvalidThreshold { .. }));
    /// ```
    pub fn build(self) -> Result<Pipeline> {
        if let LabellingStrategy::Threshold { threshold } = self.labelling
            && !threshold.is_finite()
        {
            return Err(DendraError::InvalidThreshold { threshold });
        }
        Ok(Pipeline::new(self.linkage, self.criterion, self.labelling))
    }
}
