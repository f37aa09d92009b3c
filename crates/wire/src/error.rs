//! Codec errors.
//!
//! Decoding fails loudly: a truncated or inconsistent buffer never yields
//! partial or defaulted data.

use thiserror::Error;

use crate::messages::MessageType;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("buffer truncated at offset {offset} while reading {what}")]
    Truncated { offset: usize, what: &'static str },

    #[error("string of {len} bytes exceeds the {max}-byte limit")]
    StringTooLong { len: usize, max: usize },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("unknown message type 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("message type {0:?} is reserved and has no schema")]
    ReservedMessageType(MessageType),

    #[error("unknown wave type code {0}")]
    UnknownWaveType(u8),

    #[error("unknown player flag bits {0:#04x}")]
    UnknownPlayerFlags(u8),

    #[error("player {0:?} appears more than once")]
    DuplicatePlayer(String),

    #[error("byte {value} is not a boolean while reading {what}")]
    InvalidBool { what: &'static str, value: u8 },

    #[error("{count} {what} do not fit in a one-byte count")]
    TooManyEntries { what: &'static str, count: usize },

    #[error("{count} unconsumed bytes after message")]
    TrailingBytes { count: usize },

    #[error("empty buffer")]
    Empty,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
