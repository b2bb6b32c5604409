//! Per-frame pipeline orchestration.
//!
//! [`OdometryAnalyzer`] owns every piece of cross-frame state: the admission
//! gate, the previous frame's features and the accumulated world pose. All
//! entry points take `&mut self`, so exclusive single-stream access is the
//! compile-time contract; a caller driving control calls from another thread
//! wraps the analyzer in its own mutex.

pub mod frame_gate;

use crate::camera::CameraIntrinsics;
use crate::config::AnalyzerConfig;
use crate::error::PipelineError;
use crate::features::matching::CorrespondenceFinder;
use crate::features::{DescriptorMatcher, FeatureExtractor, FeatureSet};
use crate::global_types::{Frame, Position};
use crate::pose::composer::PoseComposer;
use crate::pose::{PoseRecoverer, TwoViewSolver};
use self::frame_gate::{FrameGate, TrackingState};

/// Observer for newly estimated camera positions. Invoked synchronously, at
/// most once per processed frame; marshal to your own context for UI work.
pub trait PositionListener {
    fn on_position(&mut self, position: Position);
}

impl<F> PositionListener for F
where
    F: FnMut(Position),
{
    fn on_position(&mut self, position: Position) {
        self(position)
    }
}

/// What happened to one delivered frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// The gate rejected the frame: throttled, or not tracking.
    Dropped,
    /// Processed, but there was no previous frame to match against; the
    /// feature cache is primed for the next one.
    Primed,
    /// World pose updated and the listener notified.
    Updated(Position),
    /// Processed without a pose update; the feature cache still advanced
    /// unless extraction itself failed.
    Skipped(PipelineError),
}

/// The monocular visual-odometry pipeline over pluggable capabilities.
pub struct OdometryAnalyzer<E, M, S>
where
    E: FeatureExtractor,
    M: DescriptorMatcher,
    S: TwoViewSolver,
{
    gate: FrameGate,
    extractor: E,
    finder: CorrespondenceFinder<M>,
    recoverer: PoseRecoverer<S>,
    composer: PoseComposer,
    previous: Option<FeatureSet>,
    listener: Box<dyn PositionListener + Send>,
}

impl<E, M, S> OdometryAnalyzer<E, M, S>
where
    E: FeatureExtractor,
    M: DescriptorMatcher,
    S: TwoViewSolver,
{
    /// Valid intrinsics are a hard precondition: [`CameraIntrinsics`] cannot
    /// be constructed from a missing or broken calibration, so an analyzer
    /// cannot exist without one.
    pub fn new(
        intrinsics: CameraIntrinsics,
        extractor: E,
        matcher: M,
        solver: S,
        listener: Box<dyn PositionListener + Send>,
    ) -> Self {
        Self::with_config(
            intrinsics,
            extractor,
            matcher,
            solver,
            listener,
            AnalyzerConfig::default(),
        )
    }

    pub fn with_config(
        intrinsics: CameraIntrinsics,
        extractor: E,
        matcher: M,
        solver: S,
        listener: Box<dyn PositionListener + Send>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            gate: FrameGate::new(config.sample_interval_ms),
            extractor,
            finder: CorrespondenceFinder::with_ratio_threshold(matcher, config.ratio_threshold),
            recoverer: PoseRecoverer::with_min_pairs(
                solver,
                &intrinsics,
                config.min_correspondences,
            ),
            composer: PoseComposer::new(),
            previous: None,
            listener,
        }
    }

    /// Idle/Paused → Tracking. The cached features are never touched, so a
    /// resume keeps matching across the pause.
    pub fn start(&mut self, reset_position: bool) {
        self.gate.start();
        if reset_position {
            self.composer.reset();
        }
    }

    /// Tracking → Paused. Frames keep arriving but are discarded.
    pub fn pause(&mut self) {
        self.gate.pause();
    }

    /// World pose back to identity, in any state. Tracking mode and the
    /// feature cache are unaffected.
    pub fn reset(&mut self) {
        self.composer.reset();
    }

    pub fn state(&self) -> TrackingState {
        self.gate.state()
    }

    /// Current world-frame position.
    pub fn position(&self) -> Position {
        Position::from(self.composer.translation())
    }

    /// Runs the pipeline on one frame. The frame's pixel buffer is only
    /// borrowed for the duration of the call, whatever the outcome.
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> FrameOutcome {
        if !self.gate.admit(frame.timestamp) {
            return FrameOutcome::Dropped;
        }

        let current = match self.extractor.extract(frame) {
            Ok(features) => features,
            Err(err) => {
                log::warn!("frame at {} ms: {err}", frame.timestamp.as_millis());
                return FrameOutcome::Skipped(err);
            }
        };
        log::debug!(
            "frame at {} ms: {} features",
            frame.timestamp.as_millis(),
            current.len()
        );

        let previous = self.previous.take();
        let outcome = match previous {
            None => FrameOutcome::Primed,
            Some(ref previous) => match self.update_pose(previous, &current) {
                Ok(position) => {
                    self.listener.on_position(position);
                    FrameOutcome::Updated(position)
                }
                Err(err) => {
                    log::warn!("frame at {} ms: {err}", frame.timestamp.as_millis());
                    FrameOutcome::Skipped(err)
                }
            },
        };

        // The cache advances even when this frame produced no update, so the
        // next pair can still be matched.
        self.previous = Some(current);
        outcome
    }

    fn update_pose(
        &mut self,
        previous: &FeatureSet,
        current: &FeatureSet,
    ) -> Result<Position, PipelineError> {
        let correspondences = self.finder.find(previous, current)?;
        let relative = self.recoverer.recover(&correspondences)?;
        self.composer.apply(&relative)?;
        Ok(Position::from(self.composer.translation()))
    }
}
