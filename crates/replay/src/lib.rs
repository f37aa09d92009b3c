//! arcsync Replay System
//!
//! Records the exact inputs every frame was simulated with and re-runs them
//! offline to prove the simulation is deterministic.
//!
//! # Architecture
//!
//! - [`ReplayRecorder`]: collects the initial state and per-frame applied
//!   inputs and checksums during a match
//! - [`verify_replay`]: re-simulates an artifact and checks every checksum
//! - [`write_replay`] / [`read_replay`]: artifact persistence
//!
//! The initial state is stored as a FULL_STATE_SYNC message so a replay
//! starts from the same bits a resyncing client would.

#![deny(unsafe_code)]

pub mod artifact;
pub mod error;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use arcsync_sim::{
    CHECKSUM_ALGO_ID, Frame, FrameInputs, GameSnapshot, PlayerId, SimulationStep, run_frames,
    stamp_checksum,
};
use arcsync_wire::{WireMessage, decode_message, encode_full_state_sync};
use sha2::{Digest, Sha256};

pub use artifact::{AppliedInputProto, FrameRecordProto, REPLAY_FORMAT_VERSION, ReplayArtifact};
pub use error::{RecordError, VerifyError};

// ============================================================================
// Replay Recorder
// ============================================================================

/// Configuration for replay recording.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub tick_rate_hz: u32,
    pub seed_label: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            seed_label: String::new(),
        }
    }
}

struct InitialState {
    frame: Frame,
    checksum: u32,
    bytes: Vec<u8>,
}

/// Records match data for replay artifact generation.
///
/// Frames may be recorded more than once; the latest record wins, so a host
/// re-records `to_frame..=from_frame` after every rollback.
pub struct ReplayRecorder {
    config: ReplayConfig,
    initial: Option<InitialState>,
    frames: BTreeMap<Frame, FrameRecordProto>,
}

impl ReplayRecorder {
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            config,
            initial: None,
            frames: BTreeMap::new(),
        }
    }

    /// Record the starting snapshot and discard any recorded frames.
    pub fn record_initial_state(&mut self, snapshot: &GameSnapshot) -> Result<(), RecordError> {
        let snapshot = stamp_checksum(snapshot.clone());
        let bytes = encode_full_state_sync(&snapshot)?;

        tracing::debug!(
            frame = snapshot.frame,
            checksum = snapshot.checksum,
            bytes = bytes.len(),
            "replay initial state recorded"
        );
        self.initial = Some(InitialState {
            frame: snapshot.frame,
            checksum: snapshot.checksum,
            bytes,
        });
        self.frames.clear();
        Ok(())
    }

    /// Record the inputs `frame` was simulated with and the checksum it
    /// produced. `predicted` marks players whose input was a prediction.
    pub fn record_frame(
        &mut self,
        frame: Frame,
        inputs: &FrameInputs,
        predicted: &BTreeSet<PlayerId>,
        checksum: u32,
    ) -> Result<(), RecordError> {
        let start = self.initial.as_ref().ok_or(RecordError::NotStarted)?.frame;
        if frame <= start {
            return Err(RecordError::FrameBeforeStart { frame, start });
        }

        let inputs = inputs
            .iter()
            .map(|(id, input)| AppliedInputProto::from_input(input, predicted.contains(id)))
            .collect();
        self.frames.insert(
            frame,
            FrameRecordProto {
                frame,
                inputs,
                checksum,
            },
        );
        Ok(())
    }

    pub fn recorded_frames(&self) -> usize {
        self.frames.len()
    }

    /// Finalize the replay artifact. Recorded frames must run without gaps
    /// from the frame after the initial one.
    pub fn finalize(self, end_reason: &str) -> Result<ReplayArtifact, RecordError> {
        let initial = self.initial.ok_or(RecordError::NotStarted)?;

        // Every recorded frame is after the initial one, so this never overflows
        let mut expected = initial.frame;
        for &frame in self.frames.keys() {
            expected += 1;
            if frame != expected {
                return Err(RecordError::MissingFrame(expected));
            }
        }

        let (final_frame, final_checksum) = self
            .frames
            .values()
            .next_back()
            .map_or((initial.frame, initial.checksum), |r| (r.frame, r.checksum));

        tracing::info!(
            initial_frame = initial.frame,
            final_frame,
            frames = self.frames.len(),
            end_reason,
            "replay finalized"
        );

        Ok(ReplayArtifact {
            replay_format_version: REPLAY_FORMAT_VERSION,
            initial_state_sha256: sha256_hex(&initial.bytes),
            initial_state: initial.bytes,
            tick_rate_hz: self.config.tick_rate_hz,
            seed_label: self.config.seed_label,
            checksum_algo_id: CHECKSUM_ALGO_ID.to_string(),
            frames: self.frames.into_values().collect(),
            final_frame,
            final_checksum,
            end_reason: end_reason.to_string(),
        })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Replay Verification
// ============================================================================

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub initial_frame: Frame,
    pub final_frame: Frame,
    pub final_checksum: u32,
    pub frames_verified: usize,
    /// Inputs that were predictions when the match was played.
    pub predicted_inputs: usize,
}

/// Verify that `step` reproduces every checksum recorded in `artifact`.
///
/// # Verification Steps
/// 1. Check format version, checksum algorithm and tick rate
/// 2. Check the initial state digest, then decode it
/// 3. Validate the frame stream (contiguous, one input per player)
/// 4. Re-simulate every frame and compare checksums
/// 5. Compare the final frame and checksum
pub fn verify_replay<S>(artifact: &ReplayArtifact, step: &S) -> Result<ReplayReport, VerifyError>
where
    S: SimulationStep + ?Sized,
{
    // Step 1: Header
    if artifact.replay_format_version != REPLAY_FORMAT_VERSION {
        return Err(VerifyError::InvalidFormat {
            reason: format!(
                "unsupported format version {}",
                artifact.replay_format_version
            ),
        });
    }
    if artifact.checksum_algo_id != CHECKSUM_ALGO_ID {
        return Err(VerifyError::InvalidFormat {
            reason: format!("unknown checksum algorithm {}", artifact.checksum_algo_id),
        });
    }
    if artifact.tick_rate_hz == 0 {
        return Err(VerifyError::InvalidFormat {
            reason: "tick rate is zero".to_string(),
        });
    }

    // Step 2: Initial state
    if artifact.initial_state.is_empty() {
        return Err(VerifyError::MissingInitialState);
    }
    let actual_digest = sha256_hex(&artifact.initial_state);
    if actual_digest != artifact.initial_state_sha256 {
        return Err(VerifyError::InitialStateCorrupted {
            expected: artifact.initial_state_sha256.clone(),
            actual: actual_digest,
        });
    }
    let initial = match decode_message(&artifact.initial_state)
        .map_err(VerifyError::InitialStateDecode)?
    {
        WireMessage::FullStateSync(snapshot) => stamp_checksum(snapshot),
        other => {
            return Err(VerifyError::InvalidFormat {
                reason: format!(
                    "initial state is {:?}, not a full state sync",
                    other.message_type()
                ),
            });
        }
    };

    // Step 3: Frame stream
    validate_frame_stream(artifact, initial.frame)?;

    // Step 4: Re-simulate
    let mut records = artifact.frames.iter();
    let produced = run_frames(step, &initial, artifact.frames.len() as u32, |frame| {
        records
            .next()
            .map(|record| {
                record
                    .inputs
                    .iter()
                    .map(|i| (i.player_id.clone(), i.to_input(frame)))
                    .collect()
            })
            .unwrap_or_default()
    });

    for (record, snapshot) in artifact.frames.iter().zip(&produced) {
        if record.checksum != snapshot.checksum {
            tracing::warn!(
                frame = record.frame,
                expected = record.checksum,
                actual = snapshot.checksum,
                "replay diverged"
            );
            return Err(VerifyError::ChecksumMismatch {
                frame: record.frame,
                expected: record.checksum,
                actual: snapshot.checksum,
            });
        }
    }

    // Step 5: Final frame
    let (final_frame, final_checksum) = produced
        .last()
        .map_or((initial.frame, initial.checksum), |s| (s.frame, s.checksum));
    if final_frame != artifact.final_frame {
        return Err(VerifyError::FinalFrameMismatch {
            expected: artifact.final_frame,
            actual: final_frame,
        });
    }
    if final_checksum != artifact.final_checksum {
        return Err(VerifyError::ChecksumMismatch {
            frame: final_frame,
            expected: artifact.final_checksum,
            actual: final_checksum,
        });
    }

    let predicted_inputs = artifact
        .frames
        .iter()
        .flat_map(|r| &r.inputs)
        .filter(|i| i.predicted)
        .count();

    Ok(ReplayReport {
        initial_frame: initial.frame,
        final_frame,
        final_checksum,
        frames_verified: produced.len(),
        predicted_inputs,
    })
}

/// Frames must follow the initial frame without gaps, each with at most one
/// input per player, in player id order.
fn validate_frame_stream(artifact: &ReplayArtifact, initial_frame: Frame) -> Result<(), VerifyError> {
    let mut expected = initial_frame;
    for record in &artifact.frames {
        expected = expected
            .checked_add(1)
            .ok_or_else(|| VerifyError::InvalidFormat {
                reason: format!("frame records run past frame {}", Frame::MAX),
            })?;
        if record.frame != expected {
            return Err(VerifyError::InputStreamInvalid {
                reason: format!("expected frame {expected}, found {}", record.frame),
            });
        }

        let mut previous: Option<&str> = None;
        for input in &record.inputs {
            if input.player_id.is_empty() {
                return Err(VerifyError::InputStreamInvalid {
                    reason: format!("empty player id at frame {}", record.frame),
                });
            }
            if previous.is_some_and(|p| p >= input.player_id.as_str()) {
                return Err(VerifyError::InputStreamInvalid {
                    reason: format!(
                        "duplicate or unordered input for player {} at frame {}",
                        input.player_id, record.frame
                    ),
                });
            }
            previous = Some(&input.player_id);
        }
    }
    Ok(())
}

// ============================================================================
// Replay I/O
// ============================================================================

/// Write a replay artifact to a file. Never overwrites an existing file.
pub fn write_replay(artifact: &ReplayArtifact, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Replay artifact already exists at {}", path.display()),
        ));
    }

    let mut file = fs::File::create(path)?;
    file.write_all(&artifact.to_bytes())?;

    Ok(())
}

/// Read a replay artifact from a file.
pub fn read_replay(path: &Path) -> io::Result<ReplayArtifact> {
    let data = fs::read(path)?;
    ReplayArtifact::from_bytes(&data).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to decode replay: {e}"),
        )
    })
}

// ============================================================================
// Tests
// ============================================================================
