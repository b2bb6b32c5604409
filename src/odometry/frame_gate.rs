//! Sample-rate gating of the incoming frame stream.

use crate::config;
use crate::global_types::Timestamp;

/// Analyzer lifecycle mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackingState {
    /// Never started.
    #[default]
    Idle,
    /// Frames are admitted at the sample rate.
    Tracking,
    /// Frames keep arriving but are discarded; cached state survives.
    Paused,
}

/// Leaky admission gate: bursts collapse to at most one processed frame per
/// sample interval, and gaps longer than the interval cause no catch-up.
#[derive(Debug)]
pub struct FrameGate {
    sample_interval_ms: i64,
    last_processed: Option<Timestamp>,
    state: TrackingState,
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new(config::SAMPLE_INTERVAL_MS)
    }
}

impl FrameGate {
    pub fn new(sample_interval_ms: i64) -> Self {
        Self {
            sample_interval_ms,
            last_processed: None,
            state: TrackingState::Idle,
        }
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn start(&mut self) {
        self.state = TrackingState::Tracking;
    }

    pub fn pause(&mut self) {
        if self.state == TrackingState::Tracking {
            self.state = TrackingState::Paused;
        }
    }

    /// True iff tracking and at least the sample interval has elapsed since
    /// the last admitted frame. Admission updates the reference time; a
    /// rejected frame has no side effects.
    pub fn admit(&mut self, now: Timestamp) -> bool {
        if self.state != TrackingState::Tracking {
            return false;
        }
        if let Some(last) = self.last_processed {
            if now.duration_since(&last) < self.sample_interval_ms {
                return false;
            }
        }
        self.last_processed = Some(now);
        true
    }
}
