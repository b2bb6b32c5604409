//! Exhaustive descriptor matching.
//!
//! Fine for the feature counts a throttled monocular stream produces; heavier
//! sessions can plug in an approximate matcher through the same trait.

use ndarray::Array2;

use super::{DescriptorMatcher, KnnMatch};
use crate::error::PipelineError;

/// L2 k-nearest-neighbor search over descriptor rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn knn_match(
        &mut self,
        query: &Array2<f32>,
        train: &Array2<f32>,
        k: usize,
    ) -> Result<Vec<Vec<KnnMatch>>, PipelineError> {
        if query.nrows() > 0 && train.nrows() > 0 && query.ncols() != train.ncols() {
            return Err(PipelineError::MatchingFailure(format!(
                "descriptor width mismatch: {} vs {}",
                query.ncols(),
                train.ncols()
            )));
        }

        let mut all = Vec::with_capacity(query.nrows());
        for (query_idx, query_row) in query.rows().into_iter().enumerate() {
            let mut neighbors: Vec<KnnMatch> = train
                .rows()
                .into_iter()
                .enumerate()
                .map(|(train_idx, train_row)| {
                    let squared: f32 = query_row
                        .iter()
                        .zip(train_row.iter())
                        .map(|(a, b)| {
                            let d = a - b;
                            d * d
                        })
                        .sum();
                    KnnMatch {
                        query_idx,
                        train_idx,
                        distance: squared.sqrt(),
                    }
                })
                .collect();
            neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            neighbors.truncate(k);
            all.push(neighbors);
        }
        Ok(all)
    }
}
