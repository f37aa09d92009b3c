//! The simulation step contract.
//!
//! A step is a pure function `(previous, inputs, rng) -> next`. Any
//! implementation supplied by a host game MUST:
//!
//! - Read nothing but its three arguments: no wall-clock time, no ambient
//!   randomness, no external mutable state.
//! - Do all arithmetic in `f32`, one rounding per operation. Widening an
//!   intermediate to `f64` is forbidden, as are fused multiply-add and libm
//!   routines whose last bit differs between targets (`sin`, `cos`,
//!   `atan2`, `powf`). Correctly rounded operations such as `sqrt` are fine.
//! - Derive new entity identifiers from the frame number and the supplied
//!   RNG (see [`derive_entity_id`]), never from time or addresses.
//! - Iterate players in `BTreeMap` order and entities in stored order.
//!
//! The caller stamps `frame`, `rng_state` and `checksum` on the returned
//! snapshot; a step does not need to set them.

use crate::input::FrameInputs;
use crate::rng::SeededRng;
use crate::snapshot::GameSnapshot;
use crate::Frame;

/// Pluggable per-frame game rules.
pub trait SimulationStep {
    /// Produce the state for the frame after `previous`.
    fn step(
        &self,
        previous: &GameSnapshot,
        inputs: &FrameInputs,
        rng: &mut SeededRng,
    ) -> GameSnapshot;
}

impl<F> SimulationStep for F
where
    F: Fn(&GameSnapshot, &FrameInputs, &mut SeededRng) -> GameSnapshot,
{
    fn step(
        &self,
        previous: &GameSnapshot,
        inputs: &FrameInputs,
        rng: &mut SeededRng,
    ) -> GameSnapshot {
        self(previous, inputs, rng)
    }
}

/// Deterministic entity id from the spawning frame and the frame's RNG.
///
/// Consumes exactly one draw. Ids are never zero.
pub fn derive_entity_id(frame: Frame, rng: &mut SeededRng) -> u32 {
    let id = frame.wrapping_mul(0x9E37_79B1) ^ rng.next_u32();
    if id == 0 { 1 } else { id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_implements_step() {
        let step = |prev: &GameSnapshot, _: &FrameInputs, rng: &mut SeededRng| {
            let mut next = prev.clone();
            next.game_time = prev.game_time + rng.next_f32();
            next
        };

        let prev = GameSnapshot::new(0, 7);
        let mut rng_a = SeededRng::new(7);
        let mut rng_b = SeededRng::new(7);
        let a = step.step(&prev, &FrameInputs::new(), &mut rng_a);
        let b = step.step(&prev, &FrameInputs::new(), &mut rng_b);
        assert_eq!(a, b);
        assert_eq!(rng_a, rng_b);
    }

    #[test]
    fn test_derive_entity_id_deterministic() {
        let a = derive_entity_id(30, &mut SeededRng::new(42));
        let b = derive_entity_id(30, &mut SeededRng::new(42));
        assert_eq!(a, b);
        assert_ne!(a, 0);

        let other_frame = derive_entity_id(31, &mut SeededRng::new(42));
        assert_ne!(a, other_frame);
    }
}
