//! Protobuf replay artifact.
//!
//! Kept separate from the realtime codec: artifacts are written once per
//! match and read offline, so they use a self-describing, extensible format.

use arcsync_sim::{Frame, FrameInput};
use prost::Message;

/// Current artifact schema version.
pub const REPLAY_FORMAT_VERSION: u32 = 1;

/// One player's input as the step consumed it.
#[derive(Clone, PartialEq, Message)]
pub struct AppliedInputProto {
    #[prost(string, tag = "1")]
    pub player_id: String,

    #[prost(float, optional, tag = "2")]
    pub target_angle: Option<f32>,

    #[prost(float, optional, tag = "3")]
    pub velocity: Option<f32>,

    #[prost(bool, tag = "4")]
    pub ring_switch: bool,

    #[prost(uint32, tag = "5")]
    pub seq: u32,

    /// True if the input was predicted rather than received.
    #[prost(bool, tag = "6")]
    pub predicted: bool,
}

impl AppliedInputProto {
    pub fn from_input(input: &FrameInput, predicted: bool) -> Self {
        Self {
            player_id: input.player_id.clone(),
            target_angle: input.target_angle,
            velocity: input.velocity,
            ring_switch: input.ring_switch,
            seq: input.seq,
            predicted,
        }
    }

    /// Input for `frame`. The frame is implied by the enclosing record.
    pub fn to_input(&self, frame: Frame) -> FrameInput {
        FrameInput {
            frame,
            player_id: self.player_id.clone(),
            target_angle: self.target_angle,
            velocity: self.velocity,
            ring_switch: self.ring_switch,
            seq: self.seq,
        }
    }
}

/// Everything needed to recompute one frame, plus the checksum it produced.
#[derive(Clone, PartialEq, Message)]
pub struct FrameRecordProto {
    #[prost(uint32, tag = "1")]
    pub frame: u32,

    /// Applied inputs in player id order.
    #[prost(message, repeated, tag = "2")]
    pub inputs: Vec<AppliedInputProto>,

    #[prost(uint32, tag = "3")]
    pub checksum: u32,
}

/// Complete replay artifact.
#[derive(Clone, PartialEq, Message)]
pub struct ReplayArtifact {
    #[prost(uint32, tag = "1")]
    pub replay_format_version: u32,

    /// Initial snapshot as a FULL_STATE_SYNC message.
    #[prost(bytes = "vec", tag = "2")]
    pub initial_state: Vec<u8>,

    /// Lowercase hex SHA-256 of `initial_state`.
    #[prost(string, tag = "3")]
    pub initial_state_sha256: String,

    #[prost(uint32, tag = "4")]
    pub tick_rate_hz: u32,

    /// Free-form label identifying the match seed.
    #[prost(string, tag = "5")]
    pub seed_label: String,

    #[prost(string, tag = "6")]
    pub checksum_algo_id: String,

    /// One record per frame after the initial one, ascending.
    #[prost(message, repeated, tag = "7")]
    pub frames: Vec<FrameRecordProto>,

    #[prost(uint32, tag = "8")]
    pub final_frame: u32,

    #[prost(uint32, tag = "9")]
    pub final_checksum: u32,

    #[prost(string, tag = "10")]
    pub end_reason: String,
}

impl ReplayArtifact {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_input_conversion() {
        let input = FrameInput {
            frame: 12,
            player_id: "p1".into(),
            target_angle: Some(1.25),
            velocity: None,
            ring_switch: true,
            seq: 7,
        };
        let proto = AppliedInputProto::from_input(&input, true);
        assert!(proto.predicted);
        assert_eq!(proto.to_input(12), input);
    }

    #[test]
    fn test_absent_fields_survive_encoding() {
        let record = FrameRecordProto {
            frame: 3,
            inputs: vec![AppliedInputProto::from_input(&FrameInput::idle(3, "p1"), false)],
            checksum: 0xDEAD_BEEF,
        };
        let decoded = FrameRecordProto::decode(record.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.inputs[0].target_angle, None);
        assert_eq!(decoded.inputs[0].velocity, None);
        assert_eq!(decoded, record);
    }
}
