//! arcsync Rollback Manager
//!
//! Keeps one participant's copy of the simulation in agreement with every
//! other copy despite late, lost and reordered messages. It owns:
//! - The canonical [`SeededRng`]
//! - Snapshot history and applied-input history (fixed rings)
//! - Received-input history and the last-known-input predictor
//! - Rollback-and-resimulate on late inputs and checksum mismatches
//!
//! # Frame Convention
//!
//! The input tagged with frame `f` is consumed by the step that turns
//! snapshot `f - 1` into snapshot `f`. Rolling back to frame `t` therefore
//! restores snapshot `t - 1` and resimulates `t..=current_frame`. The current
//! frame itself never moves backwards.
//!
//! # Concurrency
//!
//! One manager per match, driven from a single thread. Managers share no
//! state; independent matches may run in parallel.

#![deny(unsafe_code)]

pub mod error;
pub mod input_delay;
pub mod input_history;
pub mod predictor;
pub mod smoothing;
pub mod state_history;
pub mod stats;
pub mod validation;

use std::collections::BTreeSet;

use arcsync_sim::{
    Frame, FrameInput, FrameInputs, GameSnapshot, PlayerId, SeededRng, SimulationStep,
    stamp_checksum,
};
use arcsync_wire::WireMessage;

pub use error::RollbackError;
pub use input_delay::{InputDelayConfig, InputDelayManager};
pub use input_history::InputHistory;
pub use predictor::InputPredictor;
pub use smoothing::{SmootherConfig, VisualSmoother};
pub use state_history::{FrameRing, StateHistory};
pub use stats::{NetStats, RollbackInfo, RollbackReason};
pub use validation::{ValidationConfig, ValidationResult, validate_input};

use stats::RollbackStats;

// ============================================================================
// Default Parameters
// ============================================================================

/// Simulation tick rate in Hz.
pub const TICK_RATE_HZ: u32 = 60;

/// Oldest frame, relative to the current one, an input may still correct.
pub const MAX_ROLLBACK_FRAMES: u32 = 8;

/// Furthest frame ahead of the current one an input may target.
pub const MAX_FUTURE_FRAMES: u32 = 120;

/// Snapshots kept in the state ring.
pub const STATE_HISTORY_CAPACITY: usize = 64;

/// Frames of received inputs kept behind the newest one.
pub const INPUT_HISTORY_CAPACITY: u32 = 128;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct RollbackConfig {
    pub max_rollback_frames: u32,
    pub max_future_frames: u32,
    pub state_history_capacity: usize,
    pub input_history_capacity: u32,
    pub tick_rate_hz: u32,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            max_rollback_frames: MAX_ROLLBACK_FRAMES,
            max_future_frames: MAX_FUTURE_FRAMES,
            state_history_capacity: STATE_HISTORY_CAPACITY,
            input_history_capacity: INPUT_HISTORY_CAPACITY,
            tick_rate_hz: TICK_RATE_HZ,
        }
    }
}

impl RollbackConfig {
    fn validation(&self) -> ValidationConfig {
        ValidationConfig {
            max_rollback_frames: self.max_rollback_frames,
            max_future_frames: self.max_future_frames,
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// The exact input set a frame was simulated with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppliedInputs {
    pub frame: Frame,
    pub inputs: FrameInputs,
    /// Players whose input was predicted rather than received.
    pub predicted: BTreeSet<PlayerId>,
}

impl AppliedInputs {
    pub fn is_predicted(&self, player_id: &str) -> bool {
        self.predicted.contains(player_id)
    }
}

/// What accepting a single input did.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Stored for a frame not yet simulated (or for prediction only).
    Stored,
    /// Stored and already simulated frames were recomputed.
    Resimulated(RollbackInfo),
}

/// What accepting an input batch did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOutcome {
    pub accepted: usize,
    pub rejected: Vec<RollbackError>,
    pub rollback: Option<RollbackInfo>,
}

/// Result of reconciling with an authoritative checksum.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerStateOutcome {
    /// Checksums agree; the frame is confirmed.
    Confirmed,
    /// Checksums disagreed and history was resimulated. `converged` says
    /// whether the recomputed frame now matches.
    Resimulated { converged: bool, info: RollbackInfo },
    /// Frame not simulated locally yet.
    Pending,
}

/// Result of [`RollbackManager::apply_message`].
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    Input(InputOutcome),
    Batch(BatchOutcome),
    ServerState(ServerStateOutcome),
    /// A full state sync replaced local history.
    Resynced { frame: Frame },
}

// ============================================================================
// Rollback Manager
// ============================================================================

pub struct RollbackManager<S: SimulationStep> {
    config: RollbackConfig,
    step: S,
    rng: SeededRng,
    states: StateHistory,
    applied: FrameRing<AppliedInputs>,
    inputs: InputHistory,
    predictor: InputPredictor,
    current_frame: Frame,
    last_confirmed_frame: Frame,
    /// Frame of the snapshot passed to `initialize`; nothing before it can
    /// be resimulated.
    initial_frame: Frame,
    initialized: bool,
    last_rollback: Option<RollbackInfo>,
    stats: RollbackStats,
}

impl<S: SimulationStep> RollbackManager<S> {
    /// # Panics
    /// If the tick rate is zero, or the state history cannot hold the
    /// snapshot before the oldest correctable frame.
    pub fn new(config: RollbackConfig, step: S) -> Self {
        assert!(config.tick_rate_hz > 0, "tick_rate_hz must be positive");
        assert!(
            config.state_history_capacity as u64 >= u64::from(config.max_rollback_frames) + 2,
            "state_history_capacity must exceed max_rollback_frames + 1"
        );

        Self {
            rng: SeededRng::default(),
            states: StateHistory::new(config.state_history_capacity),
            applied: FrameRing::new(config.state_history_capacity),
            inputs: InputHistory::new(config.input_history_capacity),
            predictor: InputPredictor::new(),
            current_frame: 0,
            last_confirmed_frame: 0,
            initial_frame: 0,
            initialized: false,
            last_rollback: None,
            stats: RollbackStats::new(0),
            step,
            config,
        }
    }

    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    /// Adopt `snapshot` as the authoritative starting point.
    ///
    /// Seeds the RNG from it, restamps its checksum and discards all
    /// previously simulated frames. Received inputs and the predictor are
    /// kept, so a full state sync mid-match loses nothing still pending.
    pub fn initialize(&mut self, snapshot: GameSnapshot) {
        let snapshot = stamp_checksum(snapshot);
        let frame = snapshot.frame;

        self.rng = SeededRng::new(snapshot.rng_state);
        self.states.clear();
        self.applied.clear();
        self.states.push(frame, snapshot);
        self.current_frame = frame;
        self.last_confirmed_frame = frame;
        self.initial_frame = frame;
        self.initialized = true;
        self.last_rollback = None;
        self.stats = RollbackStats::new(frame);

        tracing::debug!(frame, "rollback manager initialized");
    }

    /// Drop everything and reseed. The manager must be initialized again.
    pub fn reset(&mut self, seed: u32) {
        self.rng = SeededRng::new(seed);
        self.states.clear();
        self.applied.clear();
        self.inputs.clear();
        self.predictor.clear();
        self.current_frame = 0;
        self.last_confirmed_frame = 0;
        self.initial_frame = 0;
        self.initialized = false;
        self.last_rollback = None;
        self.stats = RollbackStats::new(0);

        tracing::debug!(seed, "rollback manager reset");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> Result<(), RollbackError> {
        if self.initialized {
            Ok(())
        } else {
            Err(RollbackError::NotInitialized)
        }
    }

    // ------------------------------------------------------------------------
    // Input intake
    // ------------------------------------------------------------------------

    /// Validate and store `input`, recording it for prediction.
    fn accept_input(&mut self, mut input: FrameInput) -> Result<Frame, RollbackError> {
        let result = validate_input(&mut input, self.current_frame, &self.config.validation());
        if let Some(err) = result.into_error(&input) {
            tracing::warn!(
                frame = input.frame,
                player_id = %input.player_id,
                current_frame = self.current_frame,
                error = %err,
                "input rejected"
            );
            return Err(err);
        }

        let frame = input.frame;
        self.predictor.update(&input);
        self.inputs.add_input(input);
        Ok(frame)
    }

    /// True if `frame` was already simulated and can be recomputed.
    fn is_late(&self, frame: Frame) -> bool {
        frame > self.initial_frame && frame <= self.current_frame
    }

    /// Accept one player's input. An input for an already simulated frame
    /// rolls back to that frame.
    pub fn add_input(&mut self, input: FrameInput) -> Result<InputOutcome, RollbackError> {
        self.ensure_initialized()?;
        let player_id = input.player_id.clone();
        let frame = self.accept_input(input)?;

        if !self.is_late(frame) {
            return Ok(InputOutcome::Stored);
        }
        let info = self.rollback(frame, RollbackReason::LateInput, Some(player_id), None, None)?;
        Ok(InputOutcome::Resimulated(info))
    }

    /// Accept a batch of inputs, then perform at most one rollback to the
    /// earliest already simulated frame among them.
    ///
    /// Invalid entries are reported in the outcome and skipped; they do not
    /// fail the batch.
    pub fn add_input_batch<I>(&mut self, inputs: I) -> Result<BatchOutcome, RollbackError>
    where
        I: IntoIterator<Item = FrameInput>,
    {
        self.ensure_initialized()?;

        let mut outcome = BatchOutcome::default();
        let mut earliest_late: Option<Frame> = None;
        for input in inputs {
            match self.accept_input(input) {
                Ok(frame) => {
                    outcome.accepted += 1;
                    if self.is_late(frame) {
                        earliest_late = Some(earliest_late.map_or(frame, |e| e.min(frame)));
                    }
                }
                Err(err) => outcome.rejected.push(err),
            }
        }

        if let Some(target) = earliest_late {
            outcome.rollback = Some(self.rollback(target, RollbackReason::Correction, None, None, None)?);
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Frame advance
    // ------------------------------------------------------------------------

    /// Simulate the next frame.
    ///
    /// `local_inputs` are retagged with the new frame number and stored
    /// before simulating. Every tracked player gets an input, real or
    /// predicted. Nothing changes if any local input is invalid.
    pub fn advance_frame<I>(&mut self, local_inputs: I) -> Result<GameSnapshot, RollbackError>
    where
        I: IntoIterator<Item = FrameInput>,
    {
        self.ensure_initialized()?;
        let frame = self.current_frame + 1;

        let mut local: Vec<FrameInput> = Vec::new();
        for mut input in local_inputs {
            input.frame = frame;
            let result = validate_input(&mut input, self.current_frame, &self.config.validation());
            if let Some(err) = result.into_error(&input) {
                tracing::warn!(frame, player_id = %input.player_id, error = %err, "local input rejected");
                return Err(err);
            }
            local.push(input);
        }
        for input in local {
            self.predictor.update(&input);
            self.inputs.add_input(input);
        }

        let previous = self
            .states
            .get(self.current_frame)
            .cloned()
            .ok_or_else(|| self.history_unavailable(self.current_frame))?;
        let next = self.simulate_frame(&previous, frame);
        self.current_frame = frame;

        tracing::trace!(frame, checksum = next.checksum, "frame advanced");
        Ok(next)
    }

    /// Run the step for `frame` on top of `previous` and store the result.
    fn simulate_frame(&mut self, previous: &GameSnapshot, frame: Frame) -> GameSnapshot {
        let applied = self.gather_inputs(previous, frame);

        let mut rng = self.rng.clone();
        let mut next = self.step.step(previous, &applied.inputs, &mut rng);
        next.frame = frame;
        next.rng_state = rng.get_state();
        let next = stamp_checksum(next);

        self.rng = rng;
        self.states.push(frame, next.clone());
        self.applied.push(frame, applied);
        next
    }

    /// Known inputs for `frame`, plus predictions for every tracked player
    /// without one.
    ///
    /// A prediction repeats the player's newest received input at or before
    /// `frame`, so resimulating a frame never sees intent from a later one.
    /// Only a player with no such input in history falls back to the
    /// predictor's last known input.
    fn gather_inputs(&mut self, previous: &GameSnapshot, frame: Frame) -> AppliedInputs {
        let mut applied = AppliedInputs {
            frame,
            inputs: self.inputs.get_inputs(frame).cloned().unwrap_or_default(),
            predicted: BTreeSet::new(),
        };

        let tracked: BTreeSet<&PlayerId> = previous
            .players
            .keys()
            .chain(self.predictor.known_players())
            .collect();
        for player_id in tracked {
            if applied.inputs.contains_key(player_id) {
                continue;
            }
            let predicted = match self.inputs.latest_input_at_or_before(player_id, frame) {
                Some(known) => InputPredictor::repeat(known, frame),
                None => self.predictor.predict(player_id, frame),
            };
            applied.inputs.insert(player_id.clone(), predicted);
            applied.predicted.insert(player_id.clone());
            self.stats.record_prediction();
        }
        applied
    }

    // ------------------------------------------------------------------------
    // Rollback
    // ------------------------------------------------------------------------

    fn history_unavailable(&self, frame: Frame) -> RollbackError {
        RollbackError::HistoryUnavailable {
            frame,
            oldest: self.states.oldest_frame(),
            newest: self.states.newest_frame(),
        }
    }

    /// Restore snapshot `target - 1` and resimulate `target..=current_frame`.
    fn rollback(
        &mut self,
        target: Frame,
        reason: RollbackReason,
        player_id: Option<PlayerId>,
        expected_checksum: Option<u32>,
        actual_checksum: Option<u32>,
    ) -> Result<RollbackInfo, RollbackError> {
        let from_frame = self.current_frame;
        let base_frame = target.saturating_sub(1);
        let base = match self.states.get(base_frame) {
            Some(base) if target > self.initial_frame => base.clone(),
            _ => {
                let err = self.history_unavailable(base_frame);
                tracing::warn!(
                    from_frame,
                    to_frame = target,
                    reason = reason.as_str(),
                    error = %err,
                    "rollback abandoned, full state sync required"
                );
                return Err(err);
            }
        };

        let info = RollbackInfo {
            from_frame,
            to_frame: target,
            reason,
            player_id,
            expected_checksum,
            actual_checksum,
        };
        self.stats.record_rollback(info.frames_rolled_back());

        self.rng.set_state(base.rng_state);
        let mut previous = base;
        for frame in target..=from_frame {
            previous = self.simulate_frame(&previous, frame);
        }

        tracing::debug!(
            from_frame,
            to_frame = target,
            frames = info.frames_rolled_back(),
            reason = reason.as_str(),
            "rolled back"
        );
        self.last_rollback = Some(info.clone());
        Ok(info)
    }

    // ------------------------------------------------------------------------
    // Server reconciliation
    // ------------------------------------------------------------------------

    /// Compare the local snapshot at `frame` with an authoritative checksum.
    ///
    /// A missing local snapshot is a desync risk the manager cannot repair;
    /// it is logged and returned as [`RollbackError::HistoryUnavailable`] so
    /// the host can request a full state sync.
    pub fn receive_server_state(
        &mut self,
        frame: Frame,
        checksum: u32,
    ) -> Result<ServerStateOutcome, RollbackError> {
        self.ensure_initialized()?;
        if frame > self.current_frame {
            return Ok(ServerStateOutcome::Pending);
        }

        let Some(local) = self.states.get(frame).map(|s| s.checksum) else {
            let err = self.history_unavailable(frame);
            tracing::warn!(frame, current_frame = self.current_frame, "no local state for server checksum, desync risk");
            return Err(err);
        };

        if local == checksum {
            self.confirm(frame);
            return Ok(ServerStateOutcome::Confirmed);
        }

        let info = self.rollback(
            frame,
            RollbackReason::StateMismatch,
            None,
            Some(checksum),
            Some(local),
        )?;
        let converged = self.states.get(frame).is_some_and(|s| s.checksum == checksum);
        if converged {
            self.confirm(frame);
        } else {
            tracing::warn!(frame, expected = checksum, actual = local, "desync persists after resimulation");
        }
        Ok(ServerStateOutcome::Resimulated { converged, info })
    }

    fn confirm(&mut self, frame: Frame) {
        if frame > self.last_confirmed_frame {
            self.last_confirmed_frame = frame;
            tracing::debug!(frame, "frame confirmed");
        }
    }

    /// Route a decoded wire message to the matching operation.
    pub fn apply_message(&mut self, msg: &WireMessage) -> Result<MessageOutcome, RollbackError> {
        match msg {
            WireMessage::Input(input) => Ok(MessageOutcome::Input(self.add_input(input.clone())?)),
            WireMessage::InputBatch(inputs) => Ok(MessageOutcome::Batch(
                self.add_input_batch(inputs.iter().cloned())?,
            )),
            WireMessage::InputAck(ack) => Ok(MessageOutcome::ServerState(
                self.receive_server_state(ack.server_frame, ack.checksum)?,
            )),
            WireMessage::StateUpdate(snapshot) => Ok(MessageOutcome::ServerState(
                self.receive_server_state(snapshot.frame, snapshot.checksum)?,
            )),
            WireMessage::FullStateSync(snapshot) => {
                self.initialize(snapshot.clone());
                Ok(MessageOutcome::Resynced {
                    frame: snapshot.frame,
                })
            }
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn current_frame(&self) -> Frame {
        self.current_frame
    }

    pub fn last_confirmed_frame(&self) -> Frame {
        self.last_confirmed_frame
    }

    pub fn get_current_state(&self) -> Option<&GameSnapshot> {
        self.states.get(self.current_frame)
    }

    pub fn get_state_at(&self, frame: Frame) -> Option<&GameSnapshot> {
        self.states.get(frame)
    }

    /// Inputs (real and predicted) the step consumed for `frame`.
    pub fn applied_inputs(&self, frame: Frame) -> Option<&AppliedInputs> {
        self.applied.get(frame)
    }

    pub fn input_history(&self) -> &InputHistory {
        &self.inputs
    }

    /// Frames in `from..=to` still lacking a real input from `player_id`.
    pub fn missing_input_frames(&self, player_id: &str, from: Frame, to: Frame) -> Vec<Frame> {
        self.inputs.get_missing_input_frames(player_id, from, to)
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.get_state()
    }

    pub fn get_last_rollback_info(&self) -> Option<&RollbackInfo> {
        self.last_rollback.as_ref()
    }

    /// Current statistics. Closes the per-second rate window once a full
    /// second of frames has passed since it opened.
    pub fn get_net_stats(&mut self) -> NetStats {
        self.stats.sample(
            self.current_frame,
            self.last_confirmed_frame,
            self.config.tick_rate_hz,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
