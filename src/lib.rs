//! Monocular visual-odometry core.
//!
//! Estimates a camera's incremental pose, up to scale, from a throttled
//! stream of video frames: sparse features are matched across consecutive
//! processed frames, a two-view solve recovers the relative motion, and the
//! recovered increments accumulate into a persistent world-frame trajectory.
//!
//! Feature extraction, descriptor matching and the epipolar solve are
//! pluggable capabilities ([`FeatureExtractor`], [`DescriptorMatcher`],
//! [`TwoViewSolver`]); an OpenCV-backed set lives behind the
//! `opencv-backend` feature.

pub mod camera;
pub mod config;
pub mod error;
pub mod features;
pub mod global_types;
pub mod odometry;
pub mod pose;
pub mod save;

#[cfg(feature = "opencv-backend")]
pub mod backend;

pub use camera::{CalibrationError, CameraIntrinsics};
pub use config::AnalyzerConfig;
pub use error::PipelineError;
pub use features::brute_force::BruteForceMatcher;
pub use features::matching::{CorrespondenceFinder, CorrespondenceSet};
pub use features::{DescriptorMatcher, FeatureExtractor, FeatureSet, KnnMatch};
pub use global_types::{Frame, Position, Timestamp};
pub use odometry::frame_gate::{FrameGate, TrackingState};
pub use odometry::{FrameOutcome, OdometryAnalyzer, PositionListener};
pub use pose::composer::PoseComposer;
pub use pose::{PoseRecoverer, RelativePose, TwoViewSolver};
pub use save::trajectory::TrajectoryRecorder;
