//! Seeded deterministic random source.
//!
//! Mulberry32: a single 32-bit word of state, one add/multiply/xor-shift round
//! per draw. Identical state plus an identical call sequence yields identical
//! output on every platform; every float this module hands out is derived from
//! integer bits with exact `f32` operations.

use std::f32::consts::TAU;

/// Mulberry32 state increment (Weyl sequence constant).
const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;

/// Scale for turning the top 24 bits of a draw into a float in `[0, 1)`.
const F32_UNIT: f32 = 1.0 / (1u32 << 24) as f32;

/// Scale for turning a full 32-bit draw into a float in `[0, 1)`.
const F64_UNIT: f64 = 1.0 / 4_294_967_296.0;

/// Deterministic pseudo-random generator owned by exactly one simulation.
///
/// The state word is never zero. Zero is remapped to one on construction,
/// on [`SeededRng::set_state`], and if a step ever lands on it, so
/// `set_state(get_state())` is always an exact round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    /// Create a generator from a seed.
    pub fn new(seed: u32) -> Self {
        Self {
            state: non_zero(seed),
        }
    }

    /// Current state word, suitable for storing in a snapshot.
    pub fn get_state(&self) -> u32 {
        self.state
    }

    /// Restore a previously captured state word.
    pub fn set_state(&mut self, state: u32) {
        self.state = non_zero(state);
    }

    /// Next raw 32-bit draw.
    pub fn next_u32(&mut self) -> u32 {
        self.state = non_zero(self.state.wrapping_add(MULBERRY_INCREMENT));
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform float in `[0, 1)` at full 32-bit resolution.
    ///
    /// Host-side only: simulation steps use [`SeededRng::next_f32`].
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) * F64_UNIT
    }

    /// Uniform float in `[0, 1)` with single precision.
    ///
    /// Uses the top 24 bits so the conversion is exact and the result can
    /// never round up to `1.0`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * F32_UNIT
    }

    /// Uniform integer in the inclusive range `[min, max]`.
    ///
    /// # Panics
    /// If `min > max`.
    pub fn int_range(&mut self, min: i32, max: i32) -> i32 {
        assert!(min <= max, "int_range: min {min} > max {max}");
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        let offset = (u64::from(self.next_u32()) * span) >> 32;
        (i64::from(min) + offset as i64) as i32
    }

    /// Uniform float in `[min, max)`.
    pub fn float_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform angle in `[0, 2π)`.
    pub fn angle(&mut self) -> f32 {
        let a = self.next_f32() * TAU;
        if a >= TAU { 0.0 } else { a }
    }

    /// Weighted coin flip: `true` with probability `probability`.
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    /// Uniform pick from a slice. `None` for an empty slice (no draw consumed).
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let last = i32::try_from(items.len() - 1).unwrap_or(i32::MAX);
        let index = self.int_range(0, last) as usize;
        items.get(index)
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let upper = i32::try_from(i).unwrap_or(i32::MAX);
            let j = self.int_range(0, upper) as usize;
            items.swap(i, j);
        }
    }
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::new(1)
    }
}

fn non_zero(state: u32) -> u32 {
    if state == 0 { 1 } else { state }
}
