//! Per-frame, per-player input history.
//!
//! - Keyed by frame, then player id
//! - Same (frame, player) pair: last write wins
//! - After every insert, frames older than `newest - capacity` are pruned

use std::collections::BTreeMap;

use arcsync_sim::{Frame, FrameInput, FrameInputs};

/// Capacity-bounded ordered map of received inputs.
#[derive(Debug, Clone)]
pub struct InputHistory {
    frames: BTreeMap<Frame, FrameInputs>,
    capacity: u32,
    oldest: Option<Frame>,
    newest: Option<Frame>,
}

impl InputHistory {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "input history capacity must be positive");
        Self {
            frames: BTreeMap::new(),
            capacity,
            oldest: None,
            newest: None,
        }
    }

    /// Merge one player's input into its frame bucket.
    pub fn add_input(&mut self, input: FrameInput) {
        let frame = input.frame;
        self.frames
            .entry(frame)
            .or_default()
            .insert(input.player_id.clone(), input);

        let newest = self.newest.map_or(frame, |n| n.max(frame));
        self.newest = Some(newest);
        self.prune(newest.saturating_sub(self.capacity));
    }

    fn prune(&mut self, keep_from: Frame) {
        self.frames = self.frames.split_off(&keep_from);
        self.oldest = self.frames.keys().next().copied();
        if self.oldest.is_none() {
            self.newest = None;
        }
    }

    pub fn get_inputs(&self, frame: Frame) -> Option<&FrameInputs> {
        self.frames.get(&frame)
    }

    pub fn get_input(&self, frame: Frame, player_id: &str) -> Option<&FrameInput> {
        self.frames.get(&frame)?.get(player_id)
    }

    pub fn has_input(&self, frame: Frame, player_id: &str) -> bool {
        self.get_input(frame, player_id).is_some()
    }

    /// The newest input from `player_id` at or before `frame`.
    pub fn latest_input_at_or_before(&self, player_id: &str, frame: Frame) -> Option<&FrameInput> {
        self.frames
            .range(..=frame)
            .rev()
            .find_map(|(_, inputs)| inputs.get(player_id))
    }

    /// Frames in `from..=to` with no input from `player_id`.
    pub fn get_missing_input_frames(&self, player_id: &str, from: Frame, to: Frame) -> Vec<Frame> {
        (from..=to)
            .filter(|&frame| !self.has_input(frame, player_id))
            .collect()
    }

    pub fn oldest_frame(&self) -> Option<Frame> {
        self.oldest
    }

    pub fn newest_frame(&self) -> Option<Frame> {
        self.newest
    }

    /// Number of frames holding at least one input.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.oldest = None;
        self.newest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut history = InputHistory::new(32);
        history.add_input(FrameInput::with_velocity(5, "p1", 1.0));
        history.add_input(FrameInput::with_velocity(5, "p1", -1.0));
        history.add_input(FrameInput::with_velocity(5, "p2", 0.5));

        assert_eq!(history.get_input(5, "p1").and_then(|i| i.velocity), Some(-1.0));
        assert_eq!(history.get_inputs(5).map(|f| f.len()), Some(2));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_bounds_track_inserts() {
        let mut history = InputHistory::new(32);
        assert_eq!(history.oldest_frame(), None);

        history.add_input(FrameInput::idle(10, "p1"));
        history.add_input(FrameInput::idle(4, "p1"));
        history.add_input(FrameInput::idle(7, "p2"));

        assert_eq!(history.oldest_frame(), Some(4));
        assert_eq!(history.newest_frame(), Some(10));
    }

    #[test]
    fn test_prunes_older_than_capacity() {
        let mut history = InputHistory::new(10);
        for frame in 0..=30 {
            history.add_input(FrameInput::idle(frame, "p1"));
        }

        // Kept: 20..=30
        assert_eq!(history.oldest_frame(), Some(20));
        assert!(!history.has_input(19, "p1"));
        assert!(history.has_input(20, "p1"));
        assert_eq!(history.len(), 11);
    }

    #[test]
    fn test_input_behind_window_is_pruned_immediately() {
        let mut history = InputHistory::new(10);
        history.add_input(FrameInput::idle(50, "p1"));
        history.add_input(FrameInput::idle(3, "p1"));
        assert!(!history.has_input(3, "p1"));
        assert_eq!(history.oldest_frame(), Some(50));
    }

    #[test]
    fn test_missing_input_frames() {
        let mut history = InputHistory::new(32);
        for frame in [1, 2, 4, 7] {
            history.add_input(FrameInput::idle(frame, "p1"));
        }
        history.add_input(FrameInput::idle(3, "p2"));

        assert_eq!(history.get_missing_input_frames("p1", 1, 8), vec![3, 5, 6, 8]);
        assert_eq!(history.get_missing_input_frames("p2", 2, 4), vec![2, 4]);
        assert!(history.get_missing_input_frames("p1", 1, 2).is_empty());
    }

    #[test]
    fn test_latest_input_at_or_before() {
        let mut history = InputHistory::new(32);
        history.add_input(FrameInput::with_velocity(5, "p1", 0.5));
        history.add_input(FrameInput::with_velocity(15, "p1", -1.0));
        history.add_input(FrameInput::idle(8, "p2"));

        let at = |frame| history.latest_input_at_or_before("p1", frame).map(|i| i.frame);
        assert_eq!(at(4), None);
        assert_eq!(at(5), Some(5));
        assert_eq!(at(10), Some(5));
        assert_eq!(at(15), Some(15));
        assert_eq!(at(99), Some(15));
        assert_eq!(history.latest_input_at_or_before("p3", 99), None);
    }

    #[test]
    fn test_clear() {
        let mut history = InputHistory::new(4);
        history.add_input(FrameInput::idle(1, "p1"));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.newest_frame(), None);
    }
}
