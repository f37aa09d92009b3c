//! Full simulation state at one frame.
//!
//! Every record here is flat: numeric fields only, no references between
//! entities, so each one can be serialized and hashed independently. A stored
//! snapshot is never mutated; the step function produces a new one.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::{Frame, PlayerId};

// ============================================================================
// Player
// ============================================================================

bitflags! {
    /// Packed boolean state of a player (one byte on the wire).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlayerFlags: u8 {
        const CONNECTED = 1 << 0;
        const ELIMINATED = 1 << 1;
        const OUTER_RING = 1 << 2;
        const SHIELDED = 1 << 3;
        const AI_CONTROLLED = 1 << 4;
    }
}

/// Snapshot of a single player's paddle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    /// Paddle center angle in radians, `[0, 2π)`.
    pub angle: f32,
    /// Current signed angular velocity intent in `[-1, 1]`.
    pub velocity: f32,
    pub score: i32,
    pub combo: u16,
    pub flags: PlayerFlags,
    pub name: String,
    pub color: String,
    /// Angular width of the paddle arc in radians.
    pub arc: f32,
    /// Spawn phase-in progress, `0.0` (just joined) to `1.0` (solid).
    pub phase_in: f32,
}

impl PlayerSnapshot {
    /// A freshly joined, connected player.
    pub fn new(id: impl Into<PlayerId>, angle: f32) -> Self {
        Self {
            id: id.into(),
            angle,
            flags: PlayerFlags::CONNECTED,
            arc: DEFAULT_PADDLE_ARC,
            ..Self::default()
        }
    }
}

/// Paddle arc width for a new player (radians).
pub const DEFAULT_PADDLE_ARC: f32 = 0.6;

// ============================================================================
// Balls, Powerups, Special Entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BallSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerupSnapshot {
    pub id: u32,
    pub kind: u8,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Seconds until the powerup despawns.
    pub ttl: f32,
}

/// The single optional "special" entity (boss-wave visitor).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecialSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: f32,
}

// ============================================================================
// Waves
// ============================================================================

/// Wave flavor; the discriminant is the wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum WaveType {
    #[default]
    Normal = 0,
    Swarm = 1,
    Rapid = 2,
    Chaos = 3,
    Boss = 4,
}

impl WaveType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Swarm),
            2 => Some(Self::Rapid),
            3 => Some(Self::Chaos),
            4 => Some(Self::Boss),
            _ => None,
        }
    }
}

/// Per-wave timers and flags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaveState {
    pub active: bool,
    pub kind: WaveType,
    pub number: u16,
    /// Seconds elapsed in the current wave.
    pub timer: f32,
    /// Seconds until the next powerup spawn.
    pub spawn_cooldown: f32,
}

// ============================================================================
// Game Snapshot
// ============================================================================

/// Complete simulation state at one frame.
///
/// `checksum` is derived from the other fields (see [`crate::checksum`]); it
/// is stamped by whoever stores the snapshot, never trusted as input to a step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameSnapshot {
    pub frame: Frame,
    /// Elapsed game time in seconds.
    pub game_time: f32,
    pub rng_state: u32,
    pub checksum: u32,
    /// Players keyed (and therefore iterated) by id.
    pub players: BTreeMap<PlayerId, PlayerSnapshot>,
    pub balls: Vec<BallSnapshot>,
    pub powerups: Vec<PowerupSnapshot>,
    pub special: Option<SpecialSnapshot>,
    /// Set while the special entity is flying back out of the arena.
    pub special_returning: bool,
    pub wave: WaveState,
}

impl GameSnapshot {
    /// Empty arena at `frame` with the given RNG seed.
    pub fn new(frame: Frame, rng_state: u32) -> Self {
        Self {
            frame,
            rng_state,
            ..Self::default()
        }
    }

    /// Builder-style helper to add a player.
    pub fn with_player(mut self, player: PlayerSnapshot) -> Self {
        self.players.insert(player.id.clone(), player);
        self
    }

    pub fn player(&self, id: &str) -> Option<&PlayerSnapshot> {
        self.players.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_type_codes_roundtrip() {
        for kind in [
            WaveType::Normal,
            WaveType::Swarm,
            WaveType::Rapid,
            WaveType::Chaos,
            WaveType::Boss,
        ] {
            assert_eq!(WaveType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(WaveType::Boss.code(), 4);
        assert_eq!(WaveType::from_code(5), None);
    }

    #[test]
    fn test_players_iterate_in_id_order() {
        let snapshot = GameSnapshot::new(0, 1)
            .with_player(PlayerSnapshot::new("zed", 0.0))
            .with_player(PlayerSnapshot::new("amy", 1.0))
            .with_player(PlayerSnapshot::new("kit", 2.0));

        let ids: Vec<&str> = snapshot.players.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["amy", "kit", "zed"]);
    }

    #[test]
    fn test_new_player_defaults() {
        let player = PlayerSnapshot::new("p", 1.5);
        assert!(player.flags.contains(PlayerFlags::CONNECTED));
        assert!(!player.flags.contains(PlayerFlags::OUTER_RING));
        assert_eq!(player.arc, DEFAULT_PADDLE_ARC);
        assert_eq!(player.phase_in, 0.0);
    }
}
