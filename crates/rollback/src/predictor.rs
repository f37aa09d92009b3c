//! Last-known-input prediction.
//!
//! A missing input is replaced by the player's most recent known input with
//! the one-shot ring switch cleared. Continuous movement intent repeats;
//! discrete actions are never guessed.

use std::collections::BTreeMap;

use arcsync_sim::{Frame, FrameInput, PlayerId};

#[derive(Debug, Clone, Default)]
pub struct InputPredictor {
    last_known: BTreeMap<PlayerId, FrameInput>,
}

impl InputPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a real input. Only an input at the same or a later frame
    /// replaces the remembered one.
    pub fn update(&mut self, input: &FrameInput) {
        match self.last_known.get(&input.player_id) {
            Some(known) if known.frame > input.frame => {}
            _ => {
                self.last_known.insert(input.player_id.clone(), input.clone());
            }
        }
    }

    /// Synthetic input for `player_id` at `frame`.
    pub fn predict(&self, player_id: &str, frame: Frame) -> FrameInput {
        match self.last_known.get(player_id) {
            Some(known) => Self::repeat(known, frame),
            None => FrameInput::idle(frame, player_id),
        }
    }

    /// `known` carried forward to `frame`.
    pub fn repeat(known: &FrameInput, frame: Frame) -> FrameInput {
        FrameInput {
            frame,
            ring_switch: false,
            ..known.clone()
        }
    }

    pub fn last_known(&self, player_id: &str) -> Option<&FrameInput> {
        self.last_known.get(player_id)
    }

    /// Every player with a known input, in id order.
    pub fn known_players(&self) -> impl Iterator<Item = &PlayerId> {
        self.last_known.keys()
    }

    pub fn clear(&mut self) {
        self.last_known.clear();
    }
}
