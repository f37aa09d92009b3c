//! Rollback provenance and rolling statistics.

use arcsync_sim::{Frame, PlayerId};

// ============================================================================
// Rollback Info
// ============================================================================

/// Why a rollback happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackReason {
    /// A single input arrived for an already simulated frame.
    LateInput,
    /// Local checksum disagreed with the authoritative one.
    StateMismatch,
    /// A batch of inputs rewrote already simulated frames.
    Correction,
}

impl RollbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LateInput => "late_input",
            Self::StateMismatch => "state_mismatch",
            Self::Correction => "correction",
        }
    }
}

/// Provenance of the most recent rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackInfo {
    /// Current frame when the rollback began (and ended).
    pub from_frame: Frame,
    /// First frame resimulated.
    pub to_frame: Frame,
    pub reason: RollbackReason,
    pub player_id: Option<PlayerId>,
    /// Authoritative checksum, for state mismatches.
    pub expected_checksum: Option<u32>,
    /// Local checksum before resimulation, for state mismatches.
    pub actual_checksum: Option<u32>,
}

impl RollbackInfo {
    /// `from_frame - to_frame`.
    pub fn frames_rolled_back(&self) -> u32 {
        self.from_frame - self.to_frame
    }
}

// ============================================================================
// Net Stats
// ============================================================================

/// Snapshot of the manager's health for diagnostics overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct NetStats {
    pub current_frame: Frame,
    pub last_confirmed_frame: Frame,
    pub frames_unconfirmed: u32,
    /// Rollbacks per second over the last completed window.
    pub rollbacks_per_second: f32,
    /// Mean frames rolled back per rollback, lifetime.
    pub avg_rollback_frames: f32,
    pub total_rollbacks: u64,
    pub total_frames_rolled_back: u64,
    /// Predicted inputs fed to the step, lifetime (resimulation included).
    pub predicted_inputs: u64,
}

/// Counters behind [`NetStats`]. The rate window is measured in simulated
/// frames, one second being `tick_rate_hz` frames.
#[derive(Debug, Clone, Default)]
pub(crate) struct RollbackStats {
    window_start: Frame,
    window_rollbacks: u32,
    rollbacks_per_second: f32,
    total_rollbacks: u64,
    total_frames_rolled_back: u64,
    predicted_inputs: u64,
}

impl RollbackStats {
    pub(crate) fn new(start: Frame) -> Self {
        Self {
            window_start: start,
            ..Self::default()
        }
    }

    pub(crate) fn record_rollback(&mut self, frames: u32) {
        self.window_rollbacks += 1;
        self.total_rollbacks += 1;
        self.total_frames_rolled_back += u64::from(frames);
    }

    pub(crate) fn record_prediction(&mut self) {
        self.predicted_inputs += 1;
    }

    /// Close the rate window once a full second of frames has elapsed.
    pub(crate) fn sample(
        &mut self,
        current_frame: Frame,
        last_confirmed_frame: Frame,
        tick_rate_hz: u32,
    ) -> NetStats {
        let elapsed = current_frame.saturating_sub(self.window_start);
        if elapsed >= tick_rate_hz {
            self.rollbacks_per_second =
                self.window_rollbacks as f32 * tick_rate_hz as f32 / elapsed as f32;
            self.window_rollbacks = 0;
            self.window_start = current_frame;
        }

        let avg_rollback_frames = if self.total_rollbacks == 0 {
            0.0
        } else {
            self.total_frames_rolled_back as f32 / self.total_rollbacks as f32
        };

        NetStats {
            current_frame,
            last_confirmed_frame,
            frames_unconfirmed: current_frame.saturating_sub(last_confirmed_frame),
            rollbacks_per_second: self.rollbacks_per_second,
            avg_rollback_frames,
            total_rollbacks: self.total_rollbacks,
            total_frames_rolled_back: self.total_frames_rolled_back,
            predicted_inputs: self.predicted_inputs,
        }
    }
}
