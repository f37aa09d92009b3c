use arcsync_sim::Frame;
use arcsync_wire::WireError;
use thiserror::Error;

/// Failure while building an artifact.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no initial state recorded")]
    NotStarted,

    #[error("frame {frame} is not after the initial frame {start}")]
    FrameBeforeStart { frame: Frame, start: Frame },

    #[error("no record for frame {0}")]
    MissingFrame(Frame),

    #[error("failed to encode initial state: {0}")]
    Encode(#[from] WireError),
}

/// Replay verification failure.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("replay has no initial state")]
    MissingInitialState,

    #[error("initial state digest mismatch: expected {expected}, got {actual}")]
    InitialStateCorrupted { expected: String, actual: String },

    #[error("initial state failed to decode: {0}")]
    InitialStateDecode(WireError),

    #[error("input stream invalid: {reason}")]
    InputStreamInvalid { reason: String },

    #[error("checksum mismatch at frame {frame}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        frame: Frame,
        expected: u32,
        actual: u32,
    },

    #[error("final frame mismatch: expected {expected}, got {actual}")]
    FinalFrameMismatch { expected: Frame, actual: Frame },

    #[error("invalid replay format: {reason}")]
    InvalidFormat { reason: String },
}
