//! End-to-end pipeline scenarios over scripted capability implementations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Point2, Rotation3, Vector3};
use ndarray::Array2;

use mono_vo_rs::{
    AnalyzerConfig, BruteForceMatcher, CameraIntrinsics, FeatureExtractor, FeatureSet, Frame,
    FrameOutcome, OdometryAnalyzer, PipelineError, Position, PositionListener, RelativePose,
    Timestamp, TrackingState, TrajectoryRecorder, TwoViewSolver,
};

static PIXELS: [u8; 16] = [0u8; 16];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn frame_at(millis: i64) -> Frame<'static> {
    Frame::rgba(&PIXELS, 2, 2, 0, Timestamp::from_millis(millis))
}

/// Feature sets with one 2-wide descriptor row per value; equal values match
/// exactly across frames, values 100 apart fail the 0.2 ratio test.
fn features(values: &[f32]) -> FeatureSet {
    let keypoints = values.iter().map(|&v| Point2::new(v as f64, 0.0)).collect();
    let mut descriptors = Array2::<f32>::zeros((values.len(), 2));
    for (i, &v) in values.iter().enumerate() {
        descriptors[(i, 0)] = v;
    }
    FeatureSet::new(keypoints, descriptors)
}

fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| (i * 100) as f32).collect()
}

struct ScriptedExtractor {
    sets: VecDeque<Result<FeatureSet, PipelineError>>,
}

impl ScriptedExtractor {
    fn new(sets: Vec<FeatureSet>) -> Self {
        Self {
            sets: sets.into_iter().map(Ok).collect(),
        }
    }

    fn with_script(sets: Vec<Result<FeatureSet, PipelineError>>) -> Self {
        Self { sets: sets.into() }
    }
}

impl FeatureExtractor for ScriptedExtractor {
    fn extract(&mut self, _frame: &Frame<'_>) -> Result<FeatureSet, PipelineError> {
        self.sets
            .pop_front()
            .unwrap_or_else(|| Err(PipelineError::ExtractionFailure("script exhausted".into())))
    }
}

struct StaticSolver {
    relative: RelativePose,
}

impl StaticSolver {
    fn zero_motion() -> Self {
        Self {
            relative: RelativePose::identity(),
        }
    }

    fn translating(x: f64, y: f64, z: f64) -> Self {
        Self {
            relative: RelativePose {
                rotation: Rotation3::identity(),
                translation: Vector3::new(x, y, z),
            },
        }
    }
}

impl TwoViewSolver for StaticSolver {
    fn essential_matrix(
        &mut self,
        _prev: &[Point2<f64>],
        _curr: &[Point2<f64>],
        _k: &Matrix3<f64>,
    ) -> Result<Matrix3<f64>, PipelineError> {
        Ok(Matrix3::zeros())
    }

    fn recover_pose(
        &mut self,
        _essential: &Matrix3<f64>,
        _prev: &[Point2<f64>],
        _curr: &[Point2<f64>],
        _k: &Matrix3<f64>,
    ) -> Result<RelativePose, PipelineError> {
        Ok(self.relative.clone())
    }
}

struct FailingSolver;

impl TwoViewSolver for FailingSolver {
    fn essential_matrix(
        &mut self,
        _prev: &[Point2<f64>],
        _curr: &[Point2<f64>],
        _k: &Matrix3<f64>,
    ) -> Result<Matrix3<f64>, PipelineError> {
        Err(PipelineError::SolverFailure("degenerate configuration".into()))
    }

    fn recover_pose(
        &mut self,
        _essential: &Matrix3<f64>,
        _prev: &[Point2<f64>],
        _curr: &[Point2<f64>],
        _k: &Matrix3<f64>,
    ) -> Result<RelativePose, PipelineError> {
        unreachable!("essential_matrix already failed")
    }
}

fn intrinsics() -> CameraIntrinsics {
    CameraIntrinsics::new(640.0, 640.0, 320.0, 240.0, 0.0).unwrap()
}

fn capture() -> (Arc<Mutex<Vec<Position>>>, Box<dyn PositionListener + Send>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    (
        calls,
        Box::new(move |position: Position| sink.lock().unwrap().push(position)),
    )
}

fn analyzer<S>(
    script: Vec<FeatureSet>,
    solver: S,
    listener: Box<dyn PositionListener + Send>,
) -> OdometryAnalyzer<ScriptedExtractor, BruteForceMatcher, S>
where
    S: TwoViewSolver,
{
    OdometryAnalyzer::with_config(
        intrinsics(),
        ScriptedExtractor::new(script),
        BruteForceMatcher::new(),
        solver,
        listener,
        AnalyzerConfig::default(),
    )
}

#[test]
fn zero_motion_pair_reports_origin() {
    init_logging();
    let (calls, listener) = capture();
    let script = vec![features(&ramp(8)), features(&ramp(8))];
    let mut vo = analyzer(script, StaticSolver::zero_motion(), listener);

    vo.start(true);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Primed));
    let outcome = vo.process_frame(&frame_at(500));
    let position = match outcome {
        FrameOutcome::Updated(position) => position,
        other => panic!("expected an update, got {other:?}"),
    };

    assert_relative_eq!(position.x, 0.0);
    assert_relative_eq!(position.y, 0.0);
    assert_relative_eq!(position.z, 0.0);
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn first_frame_never_notifies() {
    let (calls, listener) = capture();
    let mut vo = analyzer(
        vec![features(&ramp(8))],
        StaticSolver::zero_motion(),
        listener,
    );

    vo.start(true);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Primed));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn insufficient_correspondences_skip_but_cache_advances() {
    init_logging();
    let (calls, listener) = capture();
    // Frame 2 only carries the first three of frame 1's features; frame 3
    // carries all eight again. If the cache failed to advance past the
    // skipped frame, frame 3 would match all eight and produce an update.
    let script = vec![
        features(&ramp(8)),
        features(&ramp(3)),
        features(&ramp(8)),
        features(&ramp(8)),
    ];
    let mut vo = analyzer(script, StaticSolver::zero_motion(), listener);

    vo.start(true);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Primed));

    match vo.process_frame(&frame_at(500)) {
        FrameOutcome::Skipped(PipelineError::InsufficientCorrespondences { found, required }) => {
            assert_eq!(found, 3);
            assert_eq!(required, 5);
        }
        other => panic!("expected a skip, got {other:?}"),
    }
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(vo.position(), Position::default());

    // Frame 3 matches against frame 2's three cached features.
    match vo.process_frame(&frame_at(1_000)) {
        FrameOutcome::Skipped(PipelineError::InsufficientCorrespondences { found, .. }) => {
            assert_eq!(found, 3);
        }
        other => panic!("expected a skip, got {other:?}"),
    }

    // And once the cache is eight features wide again, updates resume.
    assert!(matches!(
        vo.process_frame(&frame_at(1_500)),
        FrameOutcome::Updated(_)
    ));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn pause_drops_frames_and_resume_reuses_the_cache() {
    init_logging();
    let (calls, listener) = capture();
    let script = vec![features(&ramp(8)), features(&ramp(8))];
    let mut vo = analyzer(script, StaticSolver::zero_motion(), listener);

    vo.start(true);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Primed));

    vo.pause();
    assert_eq!(vo.state(), TrackingState::Paused);
    // The extractor script is not consumed while paused; a processed frame
    // here would desync the remaining assertions.
    assert!(matches!(vo.process_frame(&frame_at(500)), FrameOutcome::Dropped));
    assert!(matches!(vo.process_frame(&frame_at(1_000)), FrameOutcome::Dropped));

    vo.start(false);
    // Not `Primed`: the pre-pause features are still cached and match.
    assert!(matches!(
        vo.process_frame(&frame_at(1_500)),
        FrameOutcome::Updated(_)
    ));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn bursts_are_throttled_by_the_sample_interval() {
    let (_calls, listener) = capture();
    let script = vec![features(&ramp(8)), features(&ramp(8))];
    let mut vo = analyzer(script, StaticSolver::zero_motion(), listener);

    vo.start(true);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Primed));
    assert!(matches!(vo.process_frame(&frame_at(33)), FrameOutcome::Dropped));
    assert!(matches!(vo.process_frame(&frame_at(66)), FrameOutcome::Dropped));
    assert!(matches!(
        vo.process_frame(&frame_at(500)),
        FrameOutcome::Updated(_)
    ));
}

#[test]
fn idle_analyzer_drops_everything() {
    let (calls, listener) = capture();
    let mut vo = analyzer(
        vec![features(&ramp(8))],
        StaticSolver::zero_motion(),
        listener,
    );

    assert_eq!(vo.state(), TrackingState::Idle);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Dropped));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn solver_failure_is_silent_to_the_listener() {
    init_logging();
    let (calls, listener) = capture();
    let script = vec![features(&ramp(8)), features(&ramp(8))];
    let mut vo = analyzer(script, FailingSolver, listener);

    vo.start(true);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Primed));
    assert!(matches!(
        vo.process_frame(&frame_at(500)),
        FrameOutcome::Skipped(PipelineError::SolverFailure(_))
    ));
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(vo.position(), Position::default());
}

#[test]
fn composition_failure_keeps_the_previous_pose() {
    init_logging();
    let (calls, listener) = capture();
    let script = vec![features(&ramp(8)), features(&ramp(8))];
    let mut vo = analyzer(script, StaticSolver::translating(f64::NAN, 0.0, 0.0), listener);

    vo.start(true);
    vo.process_frame(&frame_at(0));
    assert!(matches!(
        vo.process_frame(&frame_at(500)),
        FrameOutcome::Skipped(PipelineError::CompositionFailure(_))
    ));
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(vo.position(), Position::default());
}

#[test]
fn translations_accumulate_and_reset_restores_origin() {
    let (calls, listener) = capture();
    let script = vec![
        features(&ramp(8)),
        features(&ramp(8)),
        features(&ramp(8)),
        features(&ramp(8)),
    ];
    let mut vo = analyzer(script, StaticSolver::translating(0.0, 0.0, 1.0), listener);

    vo.start(true);
    vo.process_frame(&frame_at(0));
    vo.process_frame(&frame_at(500));
    vo.process_frame(&frame_at(1_000));

    // Each increment is the rigid inverse of the recovered motion.
    let reported = calls.lock().unwrap().clone();
    assert_eq!(reported.len(), 2);
    assert_relative_eq!(reported[0].z, -1.0);
    assert_relative_eq!(reported[1].z, -2.0);

    vo.reset();
    assert_eq!(vo.position(), Position::default());
    assert_eq!(vo.state(), TrackingState::Tracking);

    // Accumulation restarts from identity, the feature cache is untouched.
    assert!(matches!(
        vo.process_frame(&frame_at(1_500)),
        FrameOutcome::Updated(_)
    ));
    assert_relative_eq!(calls.lock().unwrap()[2].z, -1.0);
}

#[test]
fn restart_without_reset_keeps_the_position() {
    let (_calls, listener) = capture();
    let script = vec![features(&ramp(8)), features(&ramp(8))];
    let mut vo = analyzer(script, StaticSolver::translating(1.0, 0.0, 0.0), listener);

    vo.start(true);
    vo.process_frame(&frame_at(0));
    vo.process_frame(&frame_at(500));
    let travelled = vo.position();
    assert_relative_eq!(travelled.x, -1.0);

    vo.pause();
    vo.start(false);
    assert_eq!(vo.position(), travelled);

    vo.start(true);
    assert_eq!(vo.position(), Position::default());
}

#[test]
fn extraction_failure_skips_and_keeps_the_old_cache() {
    init_logging();
    let (calls, listener) = capture();
    let extractor = ScriptedExtractor::with_script(vec![
        Ok(features(&ramp(8))),
        Err(PipelineError::ExtractionFailure("sensor glitch".into())),
        Ok(features(&ramp(8))),
    ]);
    let mut vo = OdometryAnalyzer::new(
        intrinsics(),
        extractor,
        BruteForceMatcher::new(),
        StaticSolver::zero_motion(),
        listener,
    );

    vo.start(true);
    assert!(matches!(vo.process_frame(&frame_at(0)), FrameOutcome::Primed));
    assert!(matches!(
        vo.process_frame(&frame_at(500)),
        FrameOutcome::Skipped(PipelineError::ExtractionFailure(_))
    ));
    assert!(calls.lock().unwrap().is_empty());

    // Frame 1's features are still cached, so frame 3 matches and updates.
    assert!(matches!(
        vo.process_frame(&frame_at(1_000)),
        FrameOutcome::Updated(_)
    ));
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn trajectory_recorder_collects_listener_updates() {
    let recorder = TrajectoryRecorder::new();
    let script = vec![
        features(&ramp(8)),
        features(&ramp(8)),
        features(&ramp(8)),
    ];
    let mut vo = analyzer(
        script,
        StaticSolver::translating(0.0, 1.0, 0.0),
        Box::new(recorder.clone()),
    );

    vo.start(true);
    vo.process_frame(&frame_at(0));
    vo.process_frame(&frame_at(500));
    vo.process_frame(&frame_at(1_000));

    let samples = recorder.samples();
    assert_eq!(samples.len(), 2);
    assert_relative_eq!(samples[1].y, -2.0);

    let mut csv = Vec::new();
    recorder.write_csv(&mut csv).unwrap();
    assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 3);
}
