//! Visual easing of rollback corrections.
//!
//! Presentation only: nothing here is read by the simulation. When a rollback
//! moves an entity, the host starts a correction from the position it was
//! drawing to the corrected one, then asks for the smoothed position each
//! render frame. At completion the smoothed position is exactly the
//! authoritative one.

use std::collections::BTreeMap;

/// Default correction length in frames.
pub const DEFAULT_DURATION_FRAMES: u32 = 6;

pub type Position = [f32; 2];

#[derive(Debug, Clone)]
pub struct SmootherConfig {
    pub default_duration_frames: u32,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            default_duration_frames: DEFAULT_DURATION_FRAMES,
        }
    }
}

/// One entity's in-flight correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub start: Position,
    pub target: Position,
    pub elapsed_frames: u32,
    pub duration_frames: u32,
}

impl Correction {
    /// `0.0` at start, `1.0` when done.
    pub fn progress(&self) -> f32 {
        self.elapsed_frames.min(self.duration_frames) as f32 / self.duration_frames as f32
    }

    pub fn is_done(&self) -> bool {
        self.elapsed_frames >= self.duration_frames
    }
}

/// Per-entity correction state, keyed by any ordered entity key.
#[derive(Debug, Clone)]
pub struct VisualSmoother<K: Ord = u32> {
    config: SmootherConfig,
    corrections: BTreeMap<K, Correction>,
}

impl<K: Ord> VisualSmoother<K> {
    pub fn new(config: SmootherConfig) -> Self {
        Self {
            config,
            corrections: BTreeMap::new(),
        }
    }

    /// Begin easing `key` from `start` to `target`, replacing any running
    /// correction. A zero duration snaps immediately.
    pub fn start_correction(
        &mut self,
        key: K,
        start: Position,
        target: Position,
        duration_frames: Option<u32>,
    ) {
        let duration_frames = duration_frames.unwrap_or(self.config.default_duration_frames);
        if duration_frames == 0 {
            self.corrections.remove(&key);
            return;
        }
        self.corrections.insert(
            key,
            Correction {
                start,
                target,
                elapsed_frames: 0,
                duration_frames,
            },
        );
    }

    /// Advance every correction by one frame and drop finished ones.
    pub fn update(&mut self) {
        for c in self.corrections.values_mut() {
            c.elapsed_frames += 1;
        }
        self.corrections.retain(|_, c| !c.is_done());
    }

    /// Position to draw for `key` given its authoritative position `actual`.
    pub fn get_smoothed_position(&self, key: &K, actual: Position) -> Position {
        let Some(c) = self.corrections.get(key) else {
            return actual;
        };
        let progress = c.progress();
        let along = lerp(c.start, c.target, ease_out_cubic(progress));
        lerp(along, actual, progress)
    }

    pub fn correction(&self, key: &K) -> Option<&Correction> {
        self.corrections.get(key)
    }

    pub fn is_correcting(&self, key: &K) -> bool {
        self.corrections.contains_key(key)
    }

    pub fn active_count(&self) -> usize {
        self.corrections.len()
    }

    pub fn cancel(&mut self, key: &K) {
        self.corrections.remove(key);
    }

    pub fn clear(&mut self) {
        self.corrections.clear();
    }
}

impl<K: Ord> Default for VisualSmoother<K> {
    fn default() -> Self {
        Self::new(SmootherConfig::default())
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

fn lerp(a: Position, b: Position, t: f32) -> Position {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_correction_returns_actual() {
        let smoother: VisualSmoother = VisualSmoother::default();
        assert_eq!(smoother.get_smoothed_position(&7, [1.0, 2.0]), [1.0, 2.0]);
    }

    #[test]
    fn test_starts_at_previous_position() {
        let mut smoother = VisualSmoother::default();
        smoother.start_correction(1u32, [0.0, 0.0], [1.0, 0.0], None);
        assert_eq!(smoother.get_smoothed_position(&1, [1.0, 0.0]), [0.0, 0.0]);
    }

    #[test]
    fn test_moves_monotonically_then_completes() {
        let mut smoother = VisualSmoother::default();
        smoother.start_correction("ball", [0.0, 0.0], [1.0, 1.0], Some(4));

        let mut last = 0.0;
        for _ in 0..3 {
            smoother.update();
            let [x, _] = smoother.get_smoothed_position(&"ball", [1.0, 1.0]);
            assert!(x > last && x < 1.0, "x {x}");
            last = x;
        }
        smoother.update();
        assert!(!smoother.is_correcting(&"ball"));
        assert_eq!(smoother.get_smoothed_position(&"ball", [1.0, 1.0]), [1.0, 1.0]);
    }

    #[test]
    fn test_converges_onto_moving_actual() {
        let mut smoother = VisualSmoother::default();
        smoother.start_correction(3u32, [0.0, 0.0], [1.0, 0.0], Some(2));
        smoother.update();
        let halfway = smoother.get_smoothed_position(&3, [2.0, 0.0]);
        assert!(halfway[0] > 0.0 && halfway[0] < 2.0);
        smoother.update();
        assert_eq!(smoother.active_count(), 0);
    }

    #[test]
    fn test_zero_duration_snaps() {
        let mut smoother = VisualSmoother::default();
        smoother.start_correction(1u32, [0.0, 0.0], [5.0, 5.0], Some(0));
        assert!(!smoother.is_correcting(&1));
    }

    #[test]
    fn test_finishes_after_exactly_duration_updates() {
        for duration in 1..=120u32 {
            let mut smoother = VisualSmoother::default();
            smoother.start_correction(0u32, [0.0, 0.0], [1.0, 0.0], Some(duration));
            for frame in 1..duration {
                smoother.update();
                assert!(smoother.is_correcting(&0), "duration {duration} ended at {frame}");
            }
            smoother.update();
            assert!(!smoother.is_correcting(&0), "duration {duration} overran");
        }
    }

    #[test]
    fn test_replacing_and_cancelling() {
        let mut smoother = VisualSmoother::default();
        smoother.start_correction(1u32, [0.0, 0.0], [1.0, 0.0], None);
        smoother.update();
        smoother.start_correction(1u32, [0.5, 0.0], [2.0, 0.0], None);
        assert_eq!(smoother.correction(&1).map(Correction::progress), Some(0.0));

        smoother.start_correction(2u32, [0.0, 0.0], [1.0, 0.0], None);
        smoother.cancel(&1);
        assert_eq!(smoother.active_count(), 1);
        smoother.clear();
        assert_eq!(smoother.active_count(), 0);
    }
}
