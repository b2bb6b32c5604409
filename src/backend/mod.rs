//! OpenCV-backed implementations of the capability seams: SIFT detection,
//! FLANN k-NN matching and the calib3d essential-matrix solve.

mod cast;

use nalgebra::{Matrix3, Point2, Rotation3};
use ndarray::Array2;
use opencv::calib3d;
use opencv::core::{no_array, DMatch, KeyPoint, Mat, Ptr, Vector};
use opencv::features2d::{FlannBasedMatcher, SIFT};
use opencv::prelude::*;

use crate::error::PipelineError;
use crate::features::{DescriptorMatcher, FeatureExtractor, FeatureSet, KnnMatch};
use crate::global_types::Frame;
use crate::pose::{RelativePose, TwoViewSolver};

/// Scale-invariant keypoint detection and description.
pub struct SiftExtractor {
    sift: Ptr<SIFT>,
}

impl SiftExtractor {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            sift: SIFT::create_def()?,
        })
    }
}

impl FeatureExtractor for SiftExtractor {
    fn extract(&mut self, frame: &Frame<'_>) -> Result<FeatureSet, PipelineError> {
        let extraction_failure = |e: opencv::Error| PipelineError::ExtractionFailure(e.to_string());

        let gray = cast::gray_from_rgba(frame).map_err(extraction_failure)?;

        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        self.sift
            .detect_and_compute(&gray, &no_array(), &mut keypoints, &mut descriptors, false)
            .map_err(extraction_failure)?;

        Ok(FeatureSet::new(
            cast::keypoints_to_points(&keypoints),
            cast::descriptors_to_array(&descriptors).map_err(extraction_failure)?,
        ))
    }
}

/// FLANN-based k-nearest-neighbor descriptor matching.
pub struct FlannMatcher {
    matcher: Ptr<FlannBasedMatcher>,
}

impl FlannMatcher {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            matcher: FlannBasedMatcher::create()?,
        })
    }
}

impl DescriptorMatcher for FlannMatcher {
    fn knn_match(
        &mut self,
        query: &Array2<f32>,
        train: &Array2<f32>,
        k: usize,
    ) -> Result<Vec<Vec<KnnMatch>>, PipelineError> {
        let matching_failure = |e: opencv::Error| PipelineError::MatchingFailure(e.to_string());

        let query = cast::array_to_mat(query).map_err(matching_failure)?;
        let train = cast::array_to_mat(train).map_err(matching_failure)?;

        let mut matches = Vector::<Vector<DMatch>>::new();
        self.matcher
            .knn_train_match(&query, &train, &mut matches, k as i32, &no_array(), false)
            .map_err(matching_failure)?;

        Ok(matches
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|m| KnnMatch {
                        query_idx: m.query_idx as usize,
                        train_idx: m.train_idx as usize,
                        distance: m.distance,
                    })
                    .collect()
            })
            .collect())
    }
}

/// Essential-matrix estimation (RANSAC) and cheirality-checked pose recovery.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpencvTwoView;

impl OpencvTwoView {
    pub fn new() -> Self {
        Self
    }
}

impl TwoViewSolver for OpencvTwoView {
    fn essential_matrix(
        &mut self,
        prev: &[Point2<f64>],
        curr: &[Point2<f64>],
        k: &Matrix3<f64>,
    ) -> Result<Matrix3<f64>, PipelineError> {
        let solver_failure = |e: opencv::Error| PipelineError::SolverFailure(e.to_string());

        let prev = cast::points_to_vector(prev);
        let curr = cast::points_to_vector(curr);
        let k = cast::matrix3_to_mat(k).map_err(solver_failure)?;

        let mut mask = Mat::default();
        let essential = calib3d::find_essential_mat(
            &prev,
            &curr,
            &k,
            calib3d::RANSAC,
            0.999,
            1.0,
            1000,
            &mut mask,
        )
        .map_err(solver_failure)?;

        // Degenerate configurations come back empty or as a stack of
        // candidate 3×3 solutions; neither is usable downstream.
        if essential.rows() != 3 || essential.cols() != 3 {
            return Err(PipelineError::SolverFailure(format!(
                "essential matrix is {}x{}, expected 3x3",
                essential.rows(),
                essential.cols()
            )));
        }
        cast::mat_to_matrix3(&essential).map_err(solver_failure)
    }

    fn recover_pose(
        &mut self,
        essential: &Matrix3<f64>,
        prev: &[Point2<f64>],
        curr: &[Point2<f64>],
        k: &Matrix3<f64>,
    ) -> Result<RelativePose, PipelineError> {
        let solver_failure = |e: opencv::Error| PipelineError::SolverFailure(e.to_string());

        let essential = cast::matrix3_to_mat(essential).map_err(solver_failure)?;
        let prev = cast::points_to_vector(prev);
        let curr = cast::points_to_vector(curr);
        let k = cast::matrix3_to_mat(k).map_err(solver_failure)?;

        let mut rotation = Mat::default();
        let mut translation = Mat::default();
        let mut mask = Mat::default();
        calib3d::recover_pose(
            &essential,
            &prev,
            &curr,
            &k,
            &mut rotation,
            &mut translation,
            &mut mask,
        )
        .map_err(solver_failure)?;

        if rotation.rows() != 3 || rotation.cols() != 3 || translation.rows() != 3 {
            return Err(PipelineError::SolverFailure(
                "pose recovery returned malformed R/t".into(),
            ));
        }
        Ok(RelativePose {
            rotation: Rotation3::from_matrix_unchecked(
                cast::mat_to_matrix3(&rotation).map_err(solver_failure)?,
            ),
            translation: cast::mat_to_vector3(&translation).map_err(solver_failure)?,
        })
    }
}
