//! Sparse feature observations and the pluggable extraction/matching seams.

pub mod brute_force;
pub mod matching;

use nalgebra::Point2;
use ndarray::Array2;

use crate::error::PipelineError;
use crate::global_types::Frame;

/// One frame's worth of sparse features: keypoint pixel coordinates paired
/// 1:1 by index with the rows of the descriptor matrix.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    keypoints: Vec<Point2<f64>>,
    descriptors: Array2<f32>,
}

impl FeatureSet {
    /// Panics when keypoints and descriptor rows disagree; an extractor that
    /// produces mismatched sets violates its contract.
    pub fn new(keypoints: Vec<Point2<f64>>, descriptors: Array2<f32>) -> Self {
        assert_eq!(keypoints.len(), descriptors.nrows());
        Self {
            keypoints,
            descriptors,
        }
    }

    pub fn empty(descriptor_len: usize) -> Self {
        Self {
            keypoints: Vec::new(),
            descriptors: Array2::zeros((0, descriptor_len)),
        }
    }

    pub fn keypoints(&self) -> &[Point2<f64>] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &Array2<f32> {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Descriptor dimensionality; stable within one session.
    pub fn descriptor_len(&self) -> usize {
        self.descriptors.ncols()
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::empty(0)
    }
}

/// One candidate neighbor from a k-nearest-neighbor descriptor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Sparse keypoint detection + description over one frame.
///
/// Implementations must keep descriptor dimensionality fixed within a
/// session and report stable pixel coordinates for their keypoints.
pub trait FeatureExtractor {
    fn extract(&mut self, frame: &Frame<'_>) -> Result<FeatureSet, PipelineError>;
}

/// k-nearest-neighbor descriptor matching.
///
/// Returns the up-to-`k` best matches per `query` row, nearest first. Rows
/// with fewer than `k` candidates return what exists.
pub trait DescriptorMatcher {
    fn knn_match(
        &mut self,
        query: &Array2<f32>,
        train: &Array2<f32>,
        k: usize,
    ) -> Result<Vec<Vec<KnnMatch>>, PipelineError>;
}
