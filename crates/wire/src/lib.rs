//! arcsync Wire Codec
//!
//! Compact binary encoding of snapshots and inputs exchanged between clients
//! and the authoritative server.
//!
//! # Format
//!
//! - Little-endian fixed-width integers and floats.
//! - Schema-driven: a single leading type byte selects the layout, no other
//!   value is tagged.
//! - Angles in state updates and inputs travel as 16-bit compact angles
//!   (≈ 0.0001 rad resolution). Every other field round-trips bit-exactly,
//!   and a full state sync carries exact angles too.
//! - Decoding aborts on the first inconsistency; partial data is never
//!   returned.

#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod messages;

pub use codec::{ByteReader, ByteWriter, STR8_MAX, STR16_MAX};
pub use error::WireError;
pub use messages::{
    InputAck, MessageType, WireMessage, decode_message, encode_full_state_sync, encode_input,
    encode_input_batch, encode_message, encode_state_update, peek_message_type,
};
