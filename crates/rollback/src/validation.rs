//! Input validation.
//!
//! Rules, checked in order:
//! - Empty player id: DROP
//! - NaN/Inf in target angle or velocity: DROP
//! - Frame older than the rollback window: DROP
//! - Frame too far ahead of the current frame: DROP
//! - Velocity magnitude > 1.0: CLAMP

use arcsync_sim::{Frame, FrameInput};

use crate::error::RollbackError;

/// Window bounds an input is checked against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationConfig {
    pub max_rollback_frames: u32,
    pub max_future_frames: u32,
}

/// Result of input validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// Input accepted unchanged.
    Accepted,
    /// Input accepted with velocity clamped to `[-1, 1]`.
    AcceptedWithClamp,
    DroppedEmptyPlayerId,
    /// Dropped: NaN or Inf in angle or velocity.
    DroppedNonFinite,
    /// Dropped: older than the rollback window.
    DroppedStale { frame: Frame, oldest_allowed: Frame },
    /// Dropped: too far in the future.
    DroppedTooFuture { frame: Frame, max_allowed: Frame },
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedWithClamp)
    }

    /// Error for a dropped input; `None` when accepted.
    pub fn into_error(self, input: &FrameInput) -> Option<RollbackError> {
        match self {
            Self::Accepted | Self::AcceptedWithClamp => None,
            Self::DroppedEmptyPlayerId => Some(RollbackError::InvalidInput {
                frame: input.frame,
                player_id: input.player_id.clone(),
                reason: "empty player id",
            }),
            Self::DroppedNonFinite => Some(RollbackError::InvalidInput {
                frame: input.frame,
                player_id: input.player_id.clone(),
                reason: "non-finite angle or velocity",
            }),
            Self::DroppedStale {
                frame,
                oldest_allowed,
            } => Some(RollbackError::StaleInput {
                frame,
                oldest_allowed,
            }),
            Self::DroppedTooFuture { frame, max_allowed } => {
                Some(RollbackError::TooFarAhead { frame, max_allowed })
            }
        }
    }
}

/// Validate `input` against `current_frame`, clamping velocity in place.
pub fn validate_input(
    input: &mut FrameInput,
    current_frame: Frame,
    config: &ValidationConfig,
) -> ValidationResult {
    if input.player_id.is_empty() {
        return ValidationResult::DroppedEmptyPlayerId;
    }

    let non_finite = |v: Option<f32>| v.is_some_and(|v| !v.is_finite());
    if non_finite(input.target_angle) || non_finite(input.velocity) {
        return ValidationResult::DroppedNonFinite;
    }

    let oldest_allowed = current_frame.saturating_sub(config.max_rollback_frames);
    if input.frame < oldest_allowed {
        return ValidationResult::DroppedStale {
            frame: input.frame,
            oldest_allowed,
        };
    }

    let max_allowed = current_frame.saturating_add(config.max_future_frames);
    if input.frame > max_allowed {
        return ValidationResult::DroppedTooFuture {
            frame: input.frame,
            max_allowed,
        };
    }

    match input.velocity {
        Some(v) if v.abs() > 1.0 => {
            input.velocity = Some(v.clamp(-1.0, 1.0));
            ValidationResult::AcceptedWithClamp
        }
        _ => ValidationResult::Accepted,
    }
}
