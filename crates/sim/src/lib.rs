//! arcsync Simulation Core
//!
//! Deterministic building blocks shared by every participant in a match:
//! the seeded RNG, snapshot and input data types, the snapshot checksum, and
//! the contract a per-frame step function has to honor.
//!
//! # Architecture Constraints
//!
//! Code in this crate MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time
//! - Use ambient/unseeded randomness
//! - Compute simulation state in `f64`
//!
//! Two independent copies fed the same initial snapshot and the same ordered
//! inputs produce bit-identical snapshots and checksums at every frame. The
//! rollback layer depends on nothing weaker than that.

#![deny(unsafe_code)]

pub mod angle;
pub mod arena;
pub mod checksum;
pub mod input;
pub mod rng;
pub mod snapshot;
pub mod step;

// ============================================================================
// Type Aliases
// ============================================================================

/// One discrete, fixed-duration simulation step. 32 bits on the wire.
pub type Frame = u32;

/// Player identifier; ordering of ids defines iteration order.
pub type PlayerId = String;

pub use angle::{ANGLE_STEP, dequantize_angle, normalize_angle, quantize_angle};
pub use arena::ArenaRules;
pub use checksum::{CHECKSUM_ALGO_ID, compute_checksum, stamp_checksum};
pub use input::{FrameInput, FrameInputs};
pub use rng::SeededRng;
pub use snapshot::{
    BallSnapshot, GameSnapshot, PlayerFlags, PlayerSnapshot, PowerupSnapshot, SpecialSnapshot,
    WaveState, WaveType,
};
pub use step::{SimulationStep, derive_entity_id};

/// Run `frames` steps of `step` from `initial`, stamping each result the way
/// the rollback layer does. Returns every produced snapshot in frame order.
///
/// Inputs for frame `f` come from `inputs_for(f)`.
pub fn run_frames<S, I>(
    step: &S,
    initial: &GameSnapshot,
    frames: u32,
    mut inputs_for: I,
) -> Vec<GameSnapshot>
where
    S: SimulationStep + ?Sized,
    I: FnMut(Frame) -> FrameInputs,
{
    let mut rng = SeededRng::new(initial.rng_state);
    let mut previous = stamp_checksum(initial.clone());
    let mut produced = Vec::with_capacity(frames as usize);

    for _ in 0..frames {
        let frame = previous.frame.wrapping_add(1);
        let inputs = inputs_for(frame);
        let mut next = step.step(&previous, &inputs, &mut rng);
        next.frame = frame;
        next.rng_state = rng.get_state();
        let next = stamp_checksum(next);
        produced.push(next.clone());
        previous = next;
    }

    produced
}

// ============================================================================
// Tests
// ============================================================================
