//! Fixed-capacity frame-indexed history.
//!
//! - Slot for frame `f` is `f % capacity`
//! - `oldest` advances only once the window spans more than `capacity` frames
//! - Lookups check the slot's own frame, so residue from an earlier lap of
//!   the ring is never returned
//!
//! Values are copied in and out; nothing stored here aliases live state.

use arcsync_sim::{Frame, GameSnapshot};

/// Snapshot history owned by the rollback manager.
pub type StateHistory = FrameRing<GameSnapshot>;

/// Ring buffer of per-frame values.
#[derive(Debug, Clone)]
pub struct FrameRing<T> {
    slots: Vec<Option<(Frame, T)>>,
    oldest: Option<Frame>,
    newest: Option<Frame>,
}

impl<T> FrameRing<T> {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be positive");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            oldest: None,
            newest: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, frame: Frame) -> usize {
        frame as usize % self.slots.len()
    }

    /// Store `value` for `frame`, replacing whatever the slot held.
    ///
    /// Re-pushing a frame inside the window (resimulation) overwrites it in
    /// place without moving the window. A frame that would already have been
    /// evicted is ignored, since its slot belongs to a newer frame.
    pub fn push(&mut self, frame: Frame, value: T) {
        let capacity = self.slots.len() as u64;
        if let Some(newest) = self.newest
            && u64::from(frame) + capacity <= u64::from(newest)
        {
            return;
        }

        let slot = self.slot(frame);
        self.slots[slot] = Some((frame, value));

        let newest = match self.newest {
            Some(n) if n >= frame => n,
            _ => frame,
        };
        self.newest = Some(newest);

        let oldest = match self.oldest {
            Some(o) if o <= frame => o,
            _ => frame,
        };
        // Window spans newest - oldest + 1 frames
        let oldest = if u64::from(newest) - u64::from(oldest) + 1 > capacity {
            (u64::from(newest) + 1 - capacity) as Frame
        } else {
            oldest
        };
        self.oldest = Some(oldest);
    }

    /// Value for `frame` if it is inside the window and still in its slot.
    pub fn get(&self, frame: Frame) -> Option<&T> {
        let (oldest, newest) = (self.oldest?, self.newest?);
        if frame < oldest || frame > newest {
            return None;
        }
        match &self.slots[self.slot(frame)] {
            Some((stored, value)) if *stored == frame => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, frame: Frame) -> bool {
        self.get(frame).is_some()
    }

    pub fn oldest_frame(&self) -> Option<Frame> {
        self.oldest
    }

    pub fn newest_frame(&self) -> Option<Frame> {
        self.newest
    }

    /// Value at the newest frame.
    pub fn latest(&self) -> Option<&T> {
        self.get(self.newest?)
    }

    /// Number of frames currently retrievable.
    pub fn len(&self) -> usize {
        match (self.oldest, self.newest) {
            (Some(o), Some(n)) => (o..=n).filter(|&f| self.contains(f)).count(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.newest.is_none()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.oldest = None;
        self.newest = None;
    }
}
