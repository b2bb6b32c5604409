//! Pinhole camera calibration.

use std::path::Path;

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calibration problems are fatal: tracking must not start without valid
/// intrinsics, so these surface at construction time rather than per frame.
#[derive(Debug, Clone, Error)]
pub enum CalibrationError {
    #[error("focal lengths must be positive: fx={fx}, fy={fy}")]
    InvalidFocal { fx: f64, fy: f64 },

    #[error("calibration parameter array needs 5 entries, got {0}")]
    TruncatedParameters(usize),

    #[error("rescale factor must be positive and finite, got {0}")]
    InvalidScale(f64),
}

/// Pinhole intrinsics `{fx, fy, cx, cy, skew}`, immutable after construction.
///
/// The parameters must describe the resolution frames are actually delivered
/// at; [`CameraIntrinsics::scaled_to_height`] rescales a native sensor
/// calibration down to the capture resolution. Skipping that rescale silently
/// corrupts the essential-matrix solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIntrinsics", into = "RawIntrinsics")]
pub struct CameraIntrinsics {
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    skew: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawIntrinsics {
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    #[serde(default)]
    skew: f64,
}

impl TryFrom<RawIntrinsics> for CameraIntrinsics {
    type Error = CalibrationError;
    fn try_from(raw: RawIntrinsics) -> Result<Self, CalibrationError> {
        Self::new(raw.fx, raw.fy, raw.cx, raw.cy, raw.skew)
    }
}

impl From<CameraIntrinsics> for RawIntrinsics {
    fn from(intrinsics: CameraIntrinsics) -> Self {
        Self {
            fx: intrinsics.fx,
            fy: intrinsics.fy,
            cx: intrinsics.cx,
            cy: intrinsics.cy,
            skew: intrinsics.skew,
        }
    }
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64, skew: f64) -> Result<Self, CalibrationError> {
        if !(fx > 0.0 && fy > 0.0) {
            return Err(CalibrationError::InvalidFocal { fx, fy });
        }
        Ok(Self { fx, fy, cx, cy, skew })
    }

    /// Construction from the sensor's lens calibration array, ordered
    /// `[fx, fy, cx, cy, skew]`. Extra trailing entries are ignored.
    pub fn from_parameters(parameters: &[f64]) -> Result<Self, CalibrationError> {
        match parameters {
            [fx, fy, cx, cy, skew, ..] => Self::new(*fx, *fy, *cx, *cy, *skew),
            _ => Err(CalibrationError::TruncatedParameters(parameters.len())),
        }
    }

    pub fn fx(&self) -> f64 {
        self.fx
    }
    pub fn fy(&self) -> f64 {
        self.fy
    }
    pub fn cx(&self) -> f64 {
        self.cx
    }
    pub fn cy(&self) -> f64 {
        self.cy
    }
    pub fn skew(&self) -> f64 {
        self.skew
    }

    /// The 3×3 calibration matrix K.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, self.skew, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    /// All five parameters scaled by `factor`.
    pub fn rescaled(&self, factor: f64) -> Result<Self, CalibrationError> {
        if !(factor > 0.0 && factor.is_finite()) {
            return Err(CalibrationError::InvalidScale(factor));
        }
        Self::new(
            self.fx * factor,
            self.fy * factor,
            self.cx * factor,
            self.cy * factor,
            self.skew * factor,
        )
    }

    /// Rescale a native-resolution calibration to the height frames are
    /// delivered at.
    pub fn scaled_to_height(
        &self,
        native_height: u32,
        delivered_height: u32,
    ) -> Result<Self, CalibrationError> {
        if native_height == 0 {
            return Err(CalibrationError::InvalidScale(0.0));
        }
        self.rescaled(delivered_height as f64 / native_height as f64)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
