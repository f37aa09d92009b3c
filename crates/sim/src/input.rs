//! Per-player, per-frame input intent.

use std::collections::BTreeMap;

use crate::{Frame, PlayerId};

/// One player's intent for one frame.
///
/// Multiple inputs for the same `(frame, player_id)` overwrite one another;
/// they never accumulate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameInput {
    pub frame: Frame,
    pub player_id: PlayerId,
    /// Absolute paddle angle to snap to, in radians.
    pub target_angle: Option<f32>,
    /// Signed movement intent in `[-1, 1]`.
    pub velocity: Option<f32>,
    /// One-shot request to switch rings. Never predicted.
    pub ring_switch: bool,
    /// Monotonic client sequence number.
    pub seq: u32,
}

impl FrameInput {
    /// A fully idle input: no angle, no movement, no action.
    pub fn idle(frame: Frame, player_id: impl Into<PlayerId>) -> Self {
        Self {
            frame,
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    /// Input carrying only a velocity intent.
    pub fn with_velocity(frame: Frame, player_id: impl Into<PlayerId>, velocity: f32) -> Self {
        Self {
            velocity: Some(velocity),
            ..Self::idle(frame, player_id)
        }
    }

    /// True if no field expresses any intent.
    pub fn is_idle(&self) -> bool {
        self.target_angle.is_none() && self.velocity.is_none() && !self.ring_switch
    }
}

/// Complete input set for one frame, keyed and iterated by player id.
pub type FrameInputs = BTreeMap<PlayerId, FrameInput>;
