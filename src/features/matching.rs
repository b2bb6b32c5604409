//! Cross-frame correspondence filtering.

use nalgebra::Point2;

use super::{DescriptorMatcher, FeatureSet};
use crate::config;
use crate::error::PipelineError;

/// Ordered `(previous, current)` point pairs surviving the ratio test.
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceSet {
    pairs: Vec<(Point2<f64>, Point2<f64>)>,
}

impl CorrespondenceSet {
    pub fn from_pairs(pairs: Vec<(Point2<f64>, Point2<f64>)>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(Point2<f64>, Point2<f64>)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The two point lists the solver consumes, same order as the pairs.
    pub fn split(&self) -> (Vec<Point2<f64>>, Vec<Point2<f64>>) {
        self.pairs.iter().copied().unzip()
    }
}

/// Matches the previous frame's descriptors into the current frame's and
/// keeps only pairs that pass the nearest/second-nearest ratio test.
#[derive(Debug)]
pub struct CorrespondenceFinder<M>
where
    M: DescriptorMatcher,
{
    matcher: M,
    ratio_threshold: f32,
}

impl<M> CorrespondenceFinder<M>
where
    M: DescriptorMatcher,
{
    pub fn new(matcher: M) -> Self {
        Self::with_ratio_threshold(matcher, config::MATCH_RATIO_THRESHOLD)
    }

    pub fn with_ratio_threshold(matcher: M, ratio_threshold: f32) -> Self {
        Self {
            matcher,
            ratio_threshold,
        }
    }

    /// An empty `prev` (first frame, nothing cached yet) yields an empty set:
    /// no pose update this frame, not an error.
    ///
    /// Matches are emitted in query order. A current keypoint may be claimed
    /// by several previous keypoints; such many-to-one pairs pass through
    /// undeduplicated.
    pub fn find(
        &mut self,
        prev: &FeatureSet,
        curr: &FeatureSet,
    ) -> Result<CorrespondenceSet, PipelineError> {
        if prev.is_empty() || curr.is_empty() {
            return Ok(CorrespondenceSet::default());
        }

        let candidates = self
            .matcher
            .knn_match(prev.descriptors(), curr.descriptors(), 2)?;

        let mut pairs = Vec::new();
        for neighbors in &candidates {
            // A query with a single candidate is ambiguous by definition.
            let [best, second] = match neighbors.as_slice() {
                [best, second, ..] => [best, second],
                _ => continue,
            };
            if best.distance < self.ratio_threshold * second.distance {
                pairs.push((
                    prev.keypoints()[best.query_idx],
                    curr.keypoints()[best.train_idx],
                ));
            }
        }
        Ok(CorrespondenceSet::from_pairs(pairs))
    }
}
