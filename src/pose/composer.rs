//! World-pose accumulation.

use nalgebra::{Matrix4, Vector3};

use super::RelativePose;
use crate::error::PipelineError;

/// Chains recovered camera increments into a persistent 4×4 world-frame
/// pose, identity at session start.
#[derive(Debug, Clone)]
pub struct PoseComposer {
    world: Matrix4<f64>,
}

impl Default for PoseComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseComposer {
    pub fn new() -> Self {
        Self {
            world: Matrix4::identity(),
        }
    }

    /// Homogeneous increment for one recovered relative motion: the rigid
    /// inverse `[Rᵗ | -Rᵗ·t]`, since the solve maps previous-frame points
    /// into the current frame while the trajectory wants the camera's own
    /// motion.
    pub fn increment(relative: &RelativePose) -> Matrix4<f64> {
        let rotation_inv = relative.rotation.inverse();
        let translation_inc = -(rotation_inv * relative.translation);

        let mut increment = Matrix4::identity();
        increment
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(rotation_inv.matrix());
        increment
            .fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&translation_inc);
        increment
    }

    /// Folds one relative pose into the world pose, chaining on the right:
    /// increments are expressed in the previous camera frame.
    ///
    /// A malformed result leaves the world pose at its prior value.
    pub fn apply(&mut self, relative: &RelativePose) -> Result<(), PipelineError> {
        let updated = self.world * Self::increment(relative);
        if !updated.iter().all(|value| value.is_finite()) {
            return Err(PipelineError::CompositionFailure(
                "non-finite entry in chained pose".into(),
            ));
        }
        self.world = updated;
        Ok(())
    }

    pub fn world(&self) -> &Matrix4<f64> {
        &self.world
    }

    /// The translation column of the world pose.
    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(
            self.world[(0, 3)],
            self.world[(1, 3)],
            self.world[(2, 3)],
        )
    }

    pub fn reset(&mut self) {
        self.world = Matrix4::identity();
    }
}
