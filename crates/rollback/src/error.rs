//! Rollback manager errors.

use arcsync_sim::Frame;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollbackError {
    #[error("rollback manager used before initialize")]
    NotInitialized,

    /// Input older than the rollback window; it can no longer be applied.
    #[error("input for frame {frame} is older than the rollback window (oldest allowed {oldest_allowed})")]
    StaleInput { frame: Frame, oldest_allowed: Frame },

    #[error("input for frame {frame} is too far ahead (latest allowed {max_allowed})")]
    TooFarAhead { frame: Frame, max_allowed: Frame },

    #[error("invalid input from {player_id} for frame {frame}: {reason}")]
    InvalidInput {
        frame: Frame,
        player_id: String,
        reason: &'static str,
    },

    /// The needed snapshot was evicted (or never stored). The host must
    /// resynchronize with a full state sync.
    #[error("no snapshot for frame {frame} in history [{oldest:?}, {newest:?}]")]
    HistoryUnavailable {
        frame: Frame,
        oldest: Option<Frame>,
        newest: Option<Frame>,
    },
}
