//! Message schemas.
//!
//! Every message starts with a one-byte [`MessageType`]; the rest of the
//! layout is fixed by that type.
//!
//! | Type | Payload |
//! |---|---|
//! | `0x01` STATE_UPDATE | frame u32, checksum u32, game time f32, rng state u32, wave flags u8, wave type u8, players, balls, powerups |
//! | `0x02` INPUT | frame u32, player id str8, flags u8, \[angle u16\], \[velocity f32\], seq u32 |
//! | `0x03` INPUT_ACK | frame u32, server frame u32, checksum u32 |
//! | `0x04` FULL_STATE_SYNC | STATE_UPDATE body, wave number u16, wave timer f32, spawn cooldown f32, special, exact player angles f32 |
//!
//! A full state sync is lossless: the exact player angles follow the
//! compact ones, in the same player order, and replace them on decode.
//! | `0x05` INPUT_BATCH | count u8, INPUT bodies without type bytes |
//! | `0x06` DELTA_STATE | reserved |

use arcsync_sim::snapshot::{
    BallSnapshot, GameSnapshot, PlayerFlags, PlayerSnapshot, PowerupSnapshot, SpecialSnapshot,
    WaveType,
};
use arcsync_sim::{Frame, FrameInput};

use crate::codec::{ByteReader, ByteWriter};
use crate::error::WireError;

// ============================================================================
// Message Types
// ============================================================================

/// Leading type byte of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    StateUpdate = 0x01,
    Input = 0x02,
    InputAck = 0x03,
    FullStateSync = 0x04,
    InputBatch = 0x05,
    DeltaState = 0x06,
}

impl MessageType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::StateUpdate),
            0x02 => Some(Self::Input),
            0x03 => Some(Self::InputAck),
            0x04 => Some(Self::FullStateSync),
            0x05 => Some(Self::InputBatch),
            0x06 => Some(Self::DeltaState),
            _ => None,
        }
    }
}

/// Packed wave flags byte of a state update.
const WAVE_FLAG_ACTIVE: u8 = 1 << 0;
const WAVE_FLAG_SPECIAL_RETURNING: u8 = 1 << 1;

/// Packed presence flags byte of an input.
const INPUT_FLAG_HAS_ANGLE: u8 = 1 << 0;
const INPUT_FLAG_HAS_VELOCITY: u8 = 1 << 1;
const INPUT_FLAG_RING_SWITCH: u8 = 1 << 2;

/// Server acknowledgement of a client input, carrying the server's checksum
/// for `server_frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputAck {
    /// Frame of the acknowledged input.
    pub frame: Frame,
    pub server_frame: Frame,
    pub checksum: u32,
}

/// A decoded message.
///
/// `StateUpdate` carries only the fields its schema has room for: wave
/// number, timers and the special entity come back defaulted. Use
/// `FullStateSync` to transfer a complete snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    StateUpdate(GameSnapshot),
    Input(FrameInput),
    InputAck(InputAck),
    FullStateSync(GameSnapshot),
    InputBatch(Vec<FrameInput>),
}

impl WireMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::StateUpdate(_) => MessageType::StateUpdate,
            Self::Input(_) => MessageType::Input,
            Self::InputAck(_) => MessageType::InputAck,
            Self::FullStateSync(_) => MessageType::FullStateSync,
            Self::InputBatch(_) => MessageType::InputBatch,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        encode_message(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        decode_message(bytes)
    }
}

// ============================================================================
// Encoding
// ============================================================================

pub fn encode_message(msg: &WireMessage) -> Result<Vec<u8>, WireError> {
    let mut w = ByteWriter::with_capacity(64);
    w.u8(msg.message_type().code())?;
    match msg {
        WireMessage::StateUpdate(snapshot) => write_state_body(&mut w, snapshot)?,
        WireMessage::Input(input) => write_input_body(&mut w, input)?,
        WireMessage::InputAck(ack) => {
            w.u32(ack.frame)?;
            w.u32(ack.server_frame)?;
            w.u32(ack.checksum)?;
        }
        WireMessage::FullStateSync(snapshot) => {
            write_state_body(&mut w, snapshot)?;
            write_full_sync_extras(&mut w, snapshot)?;
        }
        WireMessage::InputBatch(inputs) => {
            w.count("batched inputs", inputs.len())?;
            for input in inputs {
                write_input_body(&mut w, input)?;
            }
        }
    }
    Ok(w.into_bytes())
}

pub fn encode_state_update(snapshot: &GameSnapshot) -> Result<Vec<u8>, WireError> {
    encode_message(&WireMessage::StateUpdate(snapshot.clone()))
}

pub fn encode_full_state_sync(snapshot: &GameSnapshot) -> Result<Vec<u8>, WireError> {
    encode_message(&WireMessage::FullStateSync(snapshot.clone()))
}

pub fn encode_input(input: &FrameInput) -> Result<Vec<u8>, WireError> {
    encode_message(&WireMessage::Input(input.clone()))
}

pub fn encode_input_batch(inputs: &[FrameInput]) -> Result<Vec<u8>, WireError> {
    encode_message(&WireMessage::InputBatch(inputs.to_vec()))
}

fn write_state_body(w: &mut ByteWriter, s: &GameSnapshot) -> Result<(), WireError> {
    w.u32(s.frame)?;
    w.u32(s.checksum)?;
    w.f32(s.game_time)?;
    w.u32(s.rng_state)?;

    let mut wave_flags = 0u8;
    if s.wave.active {
        wave_flags |= WAVE_FLAG_ACTIVE;
    }
    if s.special_returning {
        wave_flags |= WAVE_FLAG_SPECIAL_RETURNING;
    }
    w.u8(wave_flags)?;
    w.u8(s.wave.kind.code())?;

    w.count("players", s.players.len())?;
    for p in s.players.values() {
        w.str8(&p.id)?;
        w.compact_angle(p.angle)?;
        w.f32(p.velocity)?;
        w.i32(p.score)?;
        w.u16(p.combo)?;
        w.u8(p.flags.bits())?;
        w.str8(&p.name)?;
        w.str8(&p.color)?;
        w.f32(p.arc)?;
        w.f32(p.phase_in)?;
    }

    w.count("balls", s.balls.len())?;
    for b in &s.balls {
        w.u32(b.id)?;
        w.f32(b.x)?;
        w.f32(b.y)?;
        w.f32(b.vx)?;
        w.f32(b.vy)?;
        w.f32(b.radius)?;
    }

    w.count("powerups", s.powerups.len())?;
    for p in &s.powerups {
        w.u32(p.id)?;
        w.u8(p.kind)?;
        w.f32(p.x)?;
        w.f32(p.y)?;
        w.f32(p.radius)?;
        w.f32(p.ttl)?;
    }

    Ok(())
}

fn write_full_sync_extras(w: &mut ByteWriter, s: &GameSnapshot) -> Result<(), WireError> {
    w.u16(s.wave.number)?;
    w.f32(s.wave.timer)?;
    w.f32(s.wave.spawn_cooldown)?;
    match &s.special {
        Some(special) => {
            w.bool(true)?;
            w.u32(special.id)?;
            w.f32(special.x)?;
            w.f32(special.y)?;
            w.f32(special.vx)?;
            w.f32(special.vy)?;
            w.f32(special.health)?;
        }
        None => w.bool(false)?,
    }
    for p in s.players.values() {
        w.f32(p.angle)?;
    }
    Ok(())
}

fn write_input_body(w: &mut ByteWriter, input: &FrameInput) -> Result<(), WireError> {
    w.u32(input.frame)?;
    w.str8(&input.player_id)?;

    let mut flags = 0u8;
    if input.target_angle.is_some() {
        flags |= INPUT_FLAG_HAS_ANGLE;
    }
    if input.velocity.is_some() {
        flags |= INPUT_FLAG_HAS_VELOCITY;
    }
    if input.ring_switch {
        flags |= INPUT_FLAG_RING_SWITCH;
    }
    w.u8(flags)?;

    if let Some(angle) = input.target_angle {
        w.compact_angle(angle)?;
    }
    if let Some(velocity) = input.velocity {
        w.f32(velocity)?;
    }
    w.u32(input.seq)?;
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// Type of an encoded message without decoding its payload.
pub fn peek_message_type(bytes: &[u8]) -> Result<MessageType, WireError> {
    let code = *bytes.first().ok_or(WireError::Empty)?;
    MessageType::from_code(code).ok_or(WireError::UnknownMessageType(code))
}

/// Decode one complete message. The buffer must hold exactly one message.
pub fn decode_message(bytes: &[u8]) -> Result<WireMessage, WireError> {
    let kind = peek_message_type(bytes)?;
    tracing::trace!(?kind, len = bytes.len(), "decoding message");

    let mut r = ByteReader::new(bytes);
    r.u8("message type")?;

    let msg = match kind {
        MessageType::StateUpdate => WireMessage::StateUpdate(read_state_body(&mut r)?),
        MessageType::Input => WireMessage::Input(read_input_body(&mut r)?),
        MessageType::InputAck => WireMessage::InputAck(InputAck {
            frame: r.u32("ack frame")?,
            server_frame: r.u32("ack server frame")?,
            checksum: r.u32("ack checksum")?,
        }),
        MessageType::FullStateSync => {
            let mut snapshot = read_state_body(&mut r)?;
            read_full_sync_extras(&mut r, &mut snapshot)?;
            WireMessage::FullStateSync(snapshot)
        }
        MessageType::InputBatch => {
            let count = r.u8("batch count")?;
            let mut inputs = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                inputs.push(read_input_body(&mut r)?);
            }
            WireMessage::InputBatch(inputs)
        }
        MessageType::DeltaState => return Err(WireError::ReservedMessageType(kind)),
    };

    r.finish()?;
    Ok(msg)
}

fn read_state_body(r: &mut ByteReader<'_>) -> Result<GameSnapshot, WireError> {
    let mut s = GameSnapshot::new(r.u32("frame")?, 0);
    s.checksum = r.u32("checksum")?;
    s.game_time = r.f32("game time")?;
    s.rng_state = r.u32("rng state")?;

    let wave_flags = r.u8("wave flags")?;
    s.wave.active = wave_flags & WAVE_FLAG_ACTIVE != 0;
    s.special_returning = wave_flags & WAVE_FLAG_SPECIAL_RETURNING != 0;
    let code = r.u8("wave type")?;
    s.wave.kind = WaveType::from_code(code).ok_or(WireError::UnknownWaveType(code))?;

    let player_count = r.u8("player count")?;
    for _ in 0..player_count {
        let player = PlayerSnapshot {
            id: r.str8("player id")?,
            angle: r.compact_angle("player angle")?,
            velocity: r.f32("player velocity")?,
            score: r.i32("player score")?,
            combo: r.u16("player combo")?,
            flags: read_player_flags(r)?,
            name: r.str8("player name")?,
            color: r.str8("player color")?,
            arc: r.f32("player arc")?,
            phase_in: r.f32("player phase-in")?,
        };
        if s.players.contains_key(&player.id) {
            return Err(WireError::DuplicatePlayer(player.id));
        }
        s.players.insert(player.id.clone(), player);
    }

    let ball_count = r.u8("ball count")?;
    s.balls.reserve(usize::from(ball_count));
    for _ in 0..ball_count {
        s.balls.push(BallSnapshot {
            id: r.u32("ball id")?,
            x: r.f32("ball x")?,
            y: r.f32("ball y")?,
            vx: r.f32("ball vx")?,
            vy: r.f32("ball vy")?,
            radius: r.f32("ball radius")?,
        });
    }

    let powerup_count = r.u8("powerup count")?;
    s.powerups.reserve(usize::from(powerup_count));
    for _ in 0..powerup_count {
        s.powerups.push(PowerupSnapshot {
            id: r.u32("powerup id")?,
            kind: r.u8("powerup kind")?,
            x: r.f32("powerup x")?,
            y: r.f32("powerup y")?,
            radius: r.f32("powerup radius")?,
            ttl: r.f32("powerup ttl")?,
        });
    }

    Ok(s)
}

fn read_full_sync_extras(r: &mut ByteReader<'_>, s: &mut GameSnapshot) -> Result<(), WireError> {
    s.wave.number = r.u16("wave number")?;
    s.wave.timer = r.f32("wave timer")?;
    s.wave.spawn_cooldown = r.f32("spawn cooldown")?;
    s.special = if r.bool("special present")? {
        Some(SpecialSnapshot {
            id: r.u32("special id")?,
            x: r.f32("special x")?,
            y: r.f32("special y")?,
            vx: r.f32("special vx")?,
            vy: r.f32("special vy")?,
            health: r.f32("special health")?,
        })
    } else {
        None
    };
    for p in s.players.values_mut() {
        p.angle = r.f32("exact player angle")?;
    }
    Ok(())
}

fn read_player_flags(r: &mut ByteReader<'_>) -> Result<PlayerFlags, WireError> {
    let bits = r.u8("player flags")?;
    PlayerFlags::from_bits(bits).ok_or(WireError::UnknownPlayerFlags(bits))
}

fn read_input_body(r: &mut ByteReader<'_>) -> Result<FrameInput, WireError> {
    let frame = r.u32("input frame")?;
    let player_id = r.str8("input player id")?;
    let flags = r.u8("input flags")?;

    let target_angle = if flags & INPUT_FLAG_HAS_ANGLE != 0 {
        Some(r.compact_angle("input angle")?)
    } else {
        None
    };
    let velocity = if flags & INPUT_FLAG_HAS_VELOCITY != 0 {
        Some(r.f32("input velocity")?)
    } else {
        None
    };

    Ok(FrameInput {
        frame,
        player_id,
        target_angle,
        velocity,
        ring_switch: flags & INPUT_FLAG_RING_SWITCH != 0,
        seq: r.u32("input seq")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcsync_sim::angle::{ANGLE_STEP, angle_distance, normalize_angle};
    use arcsync_sim::checksum::{compute_checksum, stamp_checksum};

    fn sample_snapshot() -> GameSnapshot {
        let mut s = GameSnapshot::new(1234, 0xdead_beef);
        s.game_time = 20.5;
        s.wave.active = true;
        s.wave.kind = WaveType::Chaos;
        s.wave.number = 7;
        s.wave.timer = 3.25;
        s.wave.spawn_cooldown = 1.75;
        s.special_returning = true;

        let mut p1 = PlayerSnapshot::new("alice", 1.2345);
        p1.velocity = -0.75;
        p1.score = -12;
        p1.combo = 9;
        p1.flags |= PlayerFlags::OUTER_RING | PlayerFlags::SHIELDED;
        p1.name = "Alice".into();
        p1.color = "#33ccff".into();
        p1.phase_in = 0.5;
        let mut p2 = PlayerSnapshot::new("bob", -2.0);
        p2.score = 40;
        s.players.insert(p1.id.clone(), p1);
        s.players.insert(p2.id.clone(), p2);

        s.balls.push(BallSnapshot {
            id: 11,
            x: 0.25,
            y: -0.5,
            vx: 1.5,
            vy: -0.125,
            radius: 0.02,
        });
        s.powerups.push(PowerupSnapshot {
            id: 99,
            kind: 3,
            x: -0.1,
            y: 0.3,
            radius: 0.05,
            ttl: 6.0,
        });
        s.special = Some(SpecialSnapshot {
            id: 5,
            x: 0.9,
            y: 0.1,
            vx: -0.2,
            vy: 0.4,
            health: 12.0,
        });
        stamp_checksum(s)
    }

    fn assert_angles_close(decoded: &GameSnapshot, original: &GameSnapshot) {
        for (id, p) in &original.players {
            let back = decoded.players[id].angle;
            assert!(
                angle_distance(back, normalize_angle(p.angle)) <= ANGLE_STEP,
                "player {id} angle {back} vs {}",
                p.angle
            );
        }
    }

    /// Replace angles with the originals so the rest can be compared exactly.
    fn with_original_angles(mut decoded: GameSnapshot, original: &GameSnapshot) -> GameSnapshot {
        for (id, p) in decoded.players.iter_mut() {
            p.angle = original.players[id].angle;
        }
        decoded
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    #[test]
    fn test_state_update_header_layout() {
        let s = sample_snapshot();
        let bytes = encode_state_update(&s).unwrap();

        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..5], &1234u32.to_le_bytes());
        assert_eq!(&bytes[5..9], &s.checksum.to_le_bytes());
        assert_eq!(&bytes[9..13], &20.5f32.to_le_bytes());
        assert_eq!(&bytes[13..17], &0xdead_beefu32.to_le_bytes());
        assert_eq!(bytes[17], WAVE_FLAG_ACTIVE | WAVE_FLAG_SPECIAL_RETURNING);
        assert_eq!(bytes[18], 3);
        assert_eq!(bytes[19], 2);
        // First player in id order
        assert_eq!(bytes[20], 5);
        assert_eq!(&bytes[21..26], b"alice");
    }

    #[test]
    fn test_state_update_roundtrip() {
        let original = sample_snapshot();
        let bytes = encode_state_update(&original).unwrap();
        let WireMessage::StateUpdate(decoded) = decode_message(&bytes).unwrap() else {
            panic!("expected state update");
        };

        assert_angles_close(&decoded, &original);
        let decoded = with_original_angles(decoded, &original);

        // Everything the schema carries survives bit-exactly
        assert_eq!(decoded.frame, original.frame);
        assert_eq!(decoded.checksum, original.checksum);
        assert_eq!(decoded.game_time, original.game_time);
        assert_eq!(decoded.rng_state, original.rng_state);
        assert_eq!(decoded.wave.active, original.wave.active);
        assert_eq!(decoded.wave.kind, original.wave.kind);
        assert_eq!(decoded.special_returning, original.special_returning);
        assert_eq!(decoded.players, original.players);
        assert_eq!(decoded.balls, original.balls);
        assert_eq!(decoded.powerups, original.powerups);

        // Full-sync-only fields are not carried
        assert_eq!(decoded.wave.number, 0);
        assert!(decoded.special.is_none());
    }

    #[test]
    fn test_full_state_sync_is_complete() {
        let original = sample_snapshot();
        let bytes = encode_full_state_sync(&original).unwrap();
        assert_eq!(bytes[0], 0x04);

        let WireMessage::FullStateSync(decoded) = decode_message(&bytes).unwrap() else {
            panic!("expected full state sync");
        };
        assert_eq!(decoded.players["alice"].angle, 1.2345);
        assert_eq!(decoded.players["bob"].angle, -2.0);
        assert_eq!(compute_checksum(&decoded), original.checksum);
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_full_state_sync_carries_exact_angles_after_body() {
        let s = GameSnapshot::new(1, 1).with_player(PlayerSnapshot::new("p", 0.7));
        let bytes = encode_full_state_sync(&s).unwrap();

        let tail = &bytes[bytes.len() - 4..];
        assert_eq!(tail, &0.7f32.to_le_bytes());
        let WireMessage::FullStateSync(decoded) = decode_message(&bytes).unwrap() else {
            panic!("expected full state sync");
        };
        assert_eq!(decoded.players["p"].angle.to_bits(), 0.7f32.to_bits());
    }

    #[test]
    fn test_empty_snapshot_roundtrip() {
        let original = stamp_checksum(GameSnapshot::new(0, 1));
        let bytes = encode_full_state_sync(&original).unwrap();
        assert_eq!(decode_message(&bytes).unwrap(), WireMessage::FullStateSync(original));
    }

    #[test]
    fn test_too_many_balls_rejected() {
        let mut s = GameSnapshot::new(1, 1);
        s.balls = vec![BallSnapshot::default(); 256];
        let err = encode_state_update(&s).unwrap_err();
        assert!(matches!(err, WireError::TooManyEntries { what: "balls", count: 256 }));
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    #[test]
    fn test_input_roundtrip_all_fields() {
        let input = FrameInput {
            frame: 77,
            player_id: "p1".into(),
            target_angle: Some(4.0),
            velocity: Some(-0.5),
            ring_switch: true,
            seq: 1001,
        };
        let bytes = encode_input(&input).unwrap();
        // type + frame + str8 + flags + angle + velocity + seq
        assert_eq!(bytes.len(), 1 + 4 + 3 + 1 + 2 + 4 + 4);

        let WireMessage::Input(decoded) = decode_message(&bytes).unwrap() else {
            panic!("expected input");
        };
        let angle = decoded.target_angle.unwrap();
        assert!(angle_distance(angle, 4.0) <= ANGLE_STEP);
        assert_eq!(
            FrameInput {
                target_angle: input.target_angle,
                ..decoded
            },
            input
        );
    }

    #[test]
    fn test_input_optional_fields_omitted() {
        let input = FrameInput::idle(3, "p2");
        let bytes = encode_input(&input).unwrap();
        assert_eq!(bytes.len(), 1 + 4 + 3 + 1 + 4);
        assert_eq!(bytes[8], 0);
        assert_eq!(decode_message(&bytes).unwrap(), WireMessage::Input(input));
    }

    #[test]
    fn test_input_batch_roundtrip() {
        let inputs: Vec<FrameInput> = (0..5)
            .map(|i| FrameInput {
                seq: i,
                ..FrameInput::with_velocity(100 + i, "p1", 0.25 * i as f32)
            })
            .collect();
        let bytes = encode_input_batch(&inputs).unwrap();
        assert_eq!(bytes[0], 0x05);
        assert_eq!(bytes[1], 5);
        assert_eq!(decode_message(&bytes).unwrap(), WireMessage::InputBatch(inputs));
    }

    #[test]
    fn test_input_ack_roundtrip() {
        let msg = WireMessage::InputAck(InputAck {
            frame: 10,
            server_frame: 12,
            checksum: 0xabcd_ef01,
        });
        let bytes = msg.encode().unwrap();
        assert_eq!(bytes.len(), 13);
        assert_eq!(WireMessage::decode(&bytes).unwrap(), msg);
    }

    // ========================================================================
    // Malformed Data
    // ========================================================================

    #[test]
    fn test_every_truncation_fails() {
        let bytes = encode_full_state_sync(&sample_snapshot()).unwrap();
        for len in 0..bytes.len() {
            assert!(
                decode_message(&bytes[..len]).is_err(),
                "prefix of {len} bytes decoded"
            );
        }
    }

    #[test]
    fn test_unknown_and_reserved_types() {
        assert!(matches!(decode_message(&[]), Err(WireError::Empty)));
        assert!(matches!(
            decode_message(&[0x7f]),
            Err(WireError::UnknownMessageType(0x7f))
        ));
        assert!(matches!(
            decode_message(&[0x06, 0, 0]),
            Err(WireError::ReservedMessageType(MessageType::DeltaState))
        ));
    }

    #[test]
    fn test_unknown_wave_type_rejected() {
        let mut bytes = encode_state_update(&GameSnapshot::new(1, 1)).unwrap();
        bytes[18] = 9;
        assert!(matches!(
            decode_message(&bytes),
            Err(WireError::UnknownWaveType(9))
        ));
    }

    #[test]
    fn test_unknown_player_flags_rejected() {
        // One player `p`: its flags byte sits at offset 34
        let s = GameSnapshot::new(1, 1).with_player(PlayerSnapshot::new("p", 0.0));
        let mut bytes = encode_state_update(&s).unwrap();
        assert_eq!(bytes[34], PlayerFlags::CONNECTED.bits());
        bytes[34] = 0x80;
        assert!(matches!(
            decode_message(&bytes),
            Err(WireError::UnknownPlayerFlags(0x80))
        ));
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let s = GameSnapshot::new(1, 1)
            .with_player(PlayerSnapshot::new("p", 0.0))
            .with_player(PlayerSnapshot::new("q", 0.0));
        let mut bytes = encode_state_update(&s).unwrap();
        // Each player record is 25 bytes; the second id starts at 46
        assert_eq!(bytes[46], b'q');
        bytes[46] = b'p';
        assert!(matches!(
            decode_message(&bytes),
            Err(WireError::DuplicatePlayer(id)) if id == "p"
        ));
    }

    #[test]
    fn test_non_boolean_special_flag_rejected() {
        let mut bytes = encode_full_state_sync(&GameSnapshot::new(1, 1)).unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(bytes[32], 0);
        bytes[32] = 2;
        assert!(matches!(
            decode_message(&bytes),
            Err(WireError::InvalidBool {
                what: "special present",
                value: 2
            })
        ));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let mut bytes = encode_input(&FrameInput::idle(1, "p")).unwrap();
        bytes.push(0);
        assert!(matches!(
            decode_message(&bytes),
            Err(WireError::TrailingBytes { count: 1 })
        ));
    }

    #[test]
    fn test_peek_message_type() {
        let bytes = encode_input(&FrameInput::idle(1, "p")).unwrap();
        assert_eq!(peek_message_type(&bytes).unwrap(), MessageType::Input);
        for code in 1..=6u8 {
            let kind = MessageType::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
    }
}
