//! Two-view relative pose recovery.

pub mod composer;

use nalgebra::{Matrix3, Point2, Rotation3, Vector3};

use crate::camera::CameraIntrinsics;
use crate::config;
use crate::error::PipelineError;
use crate::features::matching::CorrespondenceSet;

/// Relative motion between two views, previous → current, expressed in the
/// previous camera frame. Translation is direction only (`|t| = 1`); the
/// scale is unobservable from a monocular pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativePose {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl RelativePose {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }
}

/// Calibrated two-view epipolar geometry.
///
/// `recover_pose` is expected to run the standard decomposition with the
/// cheirality check (the returned motion puts the majority of triangulated
/// points in front of both cameras).
pub trait TwoViewSolver {
    fn essential_matrix(
        &mut self,
        prev: &[Point2<f64>],
        curr: &[Point2<f64>],
        k: &Matrix3<f64>,
    ) -> Result<Matrix3<f64>, PipelineError>;

    fn recover_pose(
        &mut self,
        essential: &Matrix3<f64>,
        prev: &[Point2<f64>],
        curr: &[Point2<f64>],
        k: &Matrix3<f64>,
    ) -> Result<RelativePose, PipelineError>;
}

/// Owns the degenerate-input policy in front of the solver: too few pairs is
/// reported without ever invoking it, and numerical failure is passed along
/// for the orchestrator's skip-and-continue handling.
#[derive(Debug)]
pub struct PoseRecoverer<S>
where
    S: TwoViewSolver,
{
    solver: S,
    k: Matrix3<f64>,
    min_pairs: usize,
}

impl<S> PoseRecoverer<S>
where
    S: TwoViewSolver,
{
    pub fn new(solver: S, intrinsics: &CameraIntrinsics) -> Self {
        Self::with_min_pairs(solver, intrinsics, config::MIN_CORRESPONDENCES)
    }

    pub fn with_min_pairs(solver: S, intrinsics: &CameraIntrinsics, min_pairs: usize) -> Self {
        Self {
            solver,
            k: intrinsics.matrix(),
            min_pairs,
        }
    }

    pub fn recover(
        &mut self,
        correspondences: &CorrespondenceSet,
    ) -> Result<RelativePose, PipelineError> {
        if correspondences.len() < self.min_pairs {
            return Err(PipelineError::InsufficientCorrespondences {
                found: correspondences.len(),
                required: self.min_pairs,
            });
        }
        let (prev, curr) = correspondences.split();
        let essential = self.solver.essential_matrix(&prev, &curr, &self.k)?;
        self.solver.recover_pose(&essential, &prev, &curr, &self.k)
    }
}
