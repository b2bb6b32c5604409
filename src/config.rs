use serde::{Deserialize, Serialize};

/// Minimum interval between two processed frames, in milliseconds.
pub const SAMPLE_INTERVAL_MS: i64 = 500;

/// Nearest/second-nearest distance ratio below which a match is accepted.
/// Much tighter than the usual 0.7–0.8: a wrong correspondence costs more
/// than a missing one with so few features on handheld footage.
pub const MATCH_RATIO_THRESHOLD: f32 = 0.2;

/// Fewest correspondence pairs the two-view solve is attempted with.
pub const MIN_CORRESPONDENCES: usize = 5;

/// Per-analyzer overrides of the defaults above.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub sample_interval_ms: i64,
    pub ratio_threshold: f32,
    pub min_correspondences: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: SAMPLE_INTERVAL_MS,
            ratio_threshold: MATCH_RATIO_THRESHOLD,
            min_correspondences: MIN_CORRESPONDENCES,
        }
    }
}
