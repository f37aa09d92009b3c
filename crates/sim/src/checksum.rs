//! Snapshot checksum.
//!
//! Algorithm: FNV-1a 32-bit over little-endian field bytes, with
//! canonicalization:
//! - `-0.0` → `+0.0`
//! - Any NaN → quiet NaN bit pattern `0x7fc00000`
//! - Players hashed in id order, balls and powerups in stored order
//! - Cosmetic strings (name, color) excluded
//!
//! The `checksum` field itself is never hashed.

use crate::snapshot::GameSnapshot;

/// Checksum algorithm identifier, recorded in replay artifacts.
pub const CHECKSUM_ALGO_ID: &str = "arcsync-fnv1a32-le-f32canon-pidasc";

/// FNV-1a 32-bit offset basis.
const FNV1A_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime.
const FNV1A_PRIME: u32 = 0x0100_0193;

#[derive(Debug, Clone)]
struct Fnv1a32 {
    state: u32,
}

impl Fnv1a32 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u32::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn u8(&mut self, v: u8) {
        self.update(&[v]);
    }

    fn u16(&mut self, v: u16) {
        self.update(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.update(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.update(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.u32(canonicalize_f32(v));
    }

    fn str(&mut self, s: &str) {
        // Length prefix keeps adjacent strings unambiguous
        self.u32(s.len() as u32);
        self.update(s.as_bytes());
    }

    fn finish(self) -> u32 {
        self.state
    }
}

/// Canonicalize an f32 value for deterministic hashing.
fn canonicalize_f32(value: f32) -> u32 {
    const QUIET_NAN_BITS: u32 = 0x7fc0_0000;

    if value.is_nan() {
        QUIET_NAN_BITS
    } else if value == 0.0 {
        0u32
    } else {
        value.to_bits()
    }
}

/// Compute the checksum of a snapshot's critical fields.
pub fn compute_checksum(snapshot: &GameSnapshot) -> u32 {
    let mut h = Fnv1a32::new();

    h.u32(snapshot.frame);
    h.f32(snapshot.game_time);
    h.u32(snapshot.rng_state);

    let wave = &snapshot.wave;
    h.u8(u8::from(wave.active));
    h.u8(wave.kind.code());
    h.u16(wave.number);
    h.f32(wave.timer);
    h.f32(wave.spawn_cooldown);
    h.u8(u8::from(snapshot.special_returning));

    h.u32(snapshot.players.len() as u32);
    for player in snapshot.players.values() {
        h.str(&player.id);
        h.f32(player.angle);
        h.f32(player.velocity);
        h.i32(player.score);
        h.u16(player.combo);
        h.u8(player.flags.bits());
        h.f32(player.arc);
        h.f32(player.phase_in);
    }

    h.u32(snapshot.balls.len() as u32);
    for ball in &snapshot.balls {
        h.u32(ball.id);
        h.f32(ball.x);
        h.f32(ball.y);
        h.f32(ball.vx);
        h.f32(ball.vy);
        h.f32(ball.radius);
    }

    h.u32(snapshot.powerups.len() as u32);
    for powerup in &snapshot.powerups {
        h.u32(powerup.id);
        h.u8(powerup.kind);
        h.f32(powerup.x);
        h.f32(powerup.y);
        h.f32(powerup.radius);
        h.f32(powerup.ttl);
    }

    match &snapshot.special {
        Some(special) => {
            h.u8(1);
            h.u32(special.id);
            h.f32(special.x);
            h.f32(special.y);
            h.f32(special.vx);
            h.f32(special.vy);
            h.f32(special.health);
        }
        None => h.u8(0),
    }

    h.finish()
}

/// Return a copy of `snapshot` with its checksum field recomputed.
pub fn stamp_checksum(mut snapshot: GameSnapshot) -> GameSnapshot {
    snapshot.checksum = compute_checksum(&snapshot);
    snapshot
}
