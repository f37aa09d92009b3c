//! Reference arena rules.
//!
//! A small, complete [`SimulationStep`] used by the test suites and as the
//! worked example of the determinism contract: paddles orbit the arena
//! center, balls and the special entity drift linearly, and active waves
//! spawn powerups from the frame RNG.

use crate::angle::normalize_angle;
use crate::input::{FrameInput, FrameInputs};
use crate::rng::SeededRng;
use crate::snapshot::{GameSnapshot, PlayerFlags, PlayerSnapshot, PowerupSnapshot};
use crate::step::{SimulationStep, derive_entity_id};
use crate::Frame;

// ============================================================================
// Tuning Constants
// ============================================================================

/// Paddle angular speed at full velocity intent, radians per second.
pub const PADDLE_SPEED: f32 = 3.0;

/// Seconds for a new player to fully phase in.
pub const PHASE_IN_SECONDS: f32 = 0.5;

/// Half-width of the square play field balls bounce inside.
pub const FIELD_HALF_EXTENT: f32 = 1.0;

/// Distance past which a returning special entity leaves the arena.
pub const SPECIAL_EXIT_EXTENT: f32 = 1.5;

pub const POWERUP_RADIUS: f32 = 0.05;
pub const POWERUP_TTL: f32 = 8.0;
pub const POWERUP_KINDS: u8 = 4;
pub const MAX_POWERUPS: usize = 8;

/// Powerup spawn cooldown range in seconds.
pub const SPAWN_COOLDOWN_MIN: f32 = 2.0;
pub const SPAWN_COOLDOWN_MAX: f32 = 4.0;

// ============================================================================
// Rules
// ============================================================================

/// Fixed-timestep arena rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaRules {
    dt: f32,
}

impl ArenaRules {
    /// Rules stepping at `tick_rate_hz`.
    ///
    /// # Panics
    /// If `tick_rate_hz` is zero.
    pub fn new(tick_rate_hz: u32) -> Self {
        assert!(tick_rate_hz > 0, "tick_rate_hz must be positive");
        Self {
            dt: 1.0 / tick_rate_hz as f32,
        }
    }

    /// Seconds per frame.
    pub fn dt(&self) -> f32 {
        self.dt
    }
}

impl Default for ArenaRules {
    fn default() -> Self {
        Self::new(60)
    }
}

impl SimulationStep for ArenaRules {
    fn step(
        &self,
        previous: &GameSnapshot,
        inputs: &FrameInputs,
        rng: &mut SeededRng,
    ) -> GameSnapshot {
        let dt = self.dt;
        let frame = previous.frame.wrapping_add(1);
        let mut next = previous.clone();
        next.game_time = previous.game_time + dt;

        for (id, player) in next.players.iter_mut() {
            if player.flags.contains(PlayerFlags::ELIMINATED) {
                continue;
            }
            if let Some(input) = inputs.get(id) {
                apply_input(player, input);
            }
            player.angle = normalize_angle(player.angle + player.velocity * PADDLE_SPEED * dt);
            if player.phase_in < 1.0 {
                player.phase_in = (player.phase_in + dt / PHASE_IN_SECONDS).min(1.0);
            }
        }

        for ball in &mut next.balls {
            ball.x += ball.vx * dt;
            ball.y += ball.vy * dt;
            if ball.x.abs() > FIELD_HALF_EXTENT {
                ball.vx = -ball.vx;
            }
            if ball.y.abs() > FIELD_HALF_EXTENT {
                ball.vy = -ball.vy;
            }
        }

        for powerup in &mut next.powerups {
            powerup.ttl -= dt;
        }
        next.powerups.retain(|p| p.ttl > 0.0);

        if let Some(special) = next.special.as_mut() {
            special.x += special.vx * dt;
            special.y += special.vy * dt;
            let gone = special.x.abs() > SPECIAL_EXIT_EXTENT || special.y.abs() > SPECIAL_EXIT_EXTENT;
            if next.special_returning && gone {
                next.special = None;
                next.special_returning = false;
            }
        }

        if next.wave.active {
            next.wave.timer += dt;
            next.wave.spawn_cooldown -= dt;
            if next.wave.spawn_cooldown <= 0.0 {
                if next.powerups.len() < MAX_POWERUPS {
                    next.powerups.push(spawn_powerup(frame, rng));
                }
                next.wave.spawn_cooldown = rng.float_range(SPAWN_COOLDOWN_MIN, SPAWN_COOLDOWN_MAX);
            }
        }

        next
    }
}

fn apply_input(player: &mut PlayerSnapshot, input: &FrameInput) {
    if let Some(angle) = input.target_angle
        && angle.is_finite()
    {
        player.angle = normalize_angle(angle);
    }
    if let Some(velocity) = input.velocity
        && velocity.is_finite()
    {
        player.velocity = velocity.clamp(-1.0, 1.0);
    }
    if input.ring_switch {
        player.flags.toggle(PlayerFlags::OUTER_RING);
    }
}

fn spawn_powerup(frame: Frame, rng: &mut SeededRng) -> PowerupSnapshot {
    let id = derive_entity_id(frame, rng);
    let kind = rng.int_range(0, i32::from(POWERUP_KINDS) - 1) as u8;
    let x = rng.float_range(-0.6, 0.6);
    let y = rng.float_range(-0.6, 0.6);
    PowerupSnapshot {
        id,
        kind,
        x,
        y,
        radius: POWERUP_RADIUS,
        ttl: POWERUP_TTL,
    }
}
