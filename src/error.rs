use thiserror::Error;

/// Per-frame pipeline failures.
///
/// All of these are recovered locally by the orchestrator: the frame's pose
/// update is skipped, the world pose keeps its prior value and the stream
/// continues. None of them ever reaches the position listener.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Fewer matched pairs than the two-view solve needs.
    #[error("only {found} correspondences, solver needs at least {required}")]
    InsufficientCorrespondences { found: usize, required: usize },

    /// Essential-matrix estimation or pose recovery failed numerically.
    #[error("two-view solve failed: {0}")]
    SolverFailure(String),

    /// Pose chaining produced a malformed transform.
    #[error("pose composition produced a non-finite transform: {0}")]
    CompositionFailure(String),

    /// The feature-extraction capability failed on this frame.
    #[error("feature extraction failed: {0}")]
    ExtractionFailure(String),

    /// The descriptor-matching capability failed on this frame pair.
    #[error("descriptor matching failed: {0}")]
    MatchingFailure(String),
}
