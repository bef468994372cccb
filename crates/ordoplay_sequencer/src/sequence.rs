// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence: a fixed-length timeline of keyframes and its play head.

use std::sync::Arc;

use crate::config::PlaybackConfig;
use crate::index::TimelineIndex;
use crate::keyframe::{
    EventHandler, FreshKeyframes, HandlerError, Keyframe, KeyframeFactory, KeyframeId,
};
use crate::playback::{Direction, PlayState, PlaybackMode, PlaybackModeController};

/// Sequencer errors
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// Keyframe position outside `0..duration`
    #[error("Keyframe position {position} is outside 0..{duration}")]
    InvalidPosition {
        /// Rejected position
        position: u64,
        /// Duration of the sequence
        duration: u64,
    },

    /// Bad argument to a constructor or call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An event handler failed while emitting
    #[error("Event handler at position {position} failed: {source}")]
    Handler {
        /// Position being emitted
        position: u64,
        /// Error reported by the handler
        #[source]
        source: HandlerError,
    },

    /// Playback config could not be parsed
    #[error("Invalid playback config: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Playback config could not be written
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequenceError>;

/// How an `advance` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceStatus {
    /// Sequence is still playing
    Playing,
    /// This call reached the terminal state
    Finished,
    /// Sequence was already terminal; nothing happened
    SequenceCompleted,
}

/// What a single `advance` call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Occupied positions crossed, in traversal order (repeats across passes)
    pub positions_visited: Vec<u64>,
    /// Number of keyframe emissions
    pub emissions: usize,
    /// Playback status after the call
    pub status: AdvanceStatus,
}

impl AdvanceReport {
    /// Whether the sequence is terminal after this call
    pub fn is_completed(&self) -> bool {
        self.status != AdvanceStatus::Playing
    }
}

/// A fixed-length millisecond timeline with keyframes and a play head.
///
/// The sequence owns its keyframes and is driven by an external tick loop
/// through [`Sequence::advance`].
#[derive(Debug, Clone)]
pub struct Sequence {
    index: TimelineIndex,
    controller: PlaybackModeController,
    state: PlayState,
}

impl Sequence {
    /// Create an empty sequence of `total_duration` milliseconds, playing forward once
    pub fn new(total_duration: u64) -> Result<Self> {
        Self::with_mode(total_duration, PlaybackMode::NonloopForward, None)
    }

    /// Create an empty sequence with a playback mode
    pub fn with_mode(
        total_duration: u64,
        mode: PlaybackMode,
        iterations: Option<u32>,
    ) -> Result<Self> {
        let controller = PlaybackModeController::new(mode, total_duration, iterations)?;
        Ok(Self {
            index: TimelineIndex::new(total_duration),
            controller,
            state: PlayState::START,
        })
    }

    /// Create an empty sequence from a playback config
    pub fn from_config(total_duration: u64, config: &PlaybackConfig) -> Result<Self> {
        Self::with_mode(total_duration, config.mode, config.iterations)
    }

    /// Add a keyframe
    pub fn add_keyframe(&mut self, keyframe: Keyframe) -> Result<KeyframeId> {
        self.index.insert(keyframe)
    }

    /// Add a keyframe for `handler` at `position`
    pub fn add_event(
        &mut self,
        position: u64,
        handler: Arc<dyn EventHandler>,
    ) -> Result<KeyframeId> {
        self.add_keyframe_from(&FreshKeyframes, position, handler)
    }

    /// Add a keyframe built by `factory`
    pub fn add_keyframe_from<F>(
        &mut self,
        factory: &F,
        position: u64,
        handler: Arc<dyn EventHandler>,
    ) -> Result<KeyframeId>
    where
        F: KeyframeFactory + ?Sized,
    {
        self.add_keyframe(factory.obtain(handler, position))
    }

    /// Switch playback mode and rewind.
    ///
    /// On error the previous mode and play head are kept.
    pub fn set_mode(&mut self, mode: PlaybackMode, iterations: Option<u32>) -> Result<()> {
        self.controller = PlaybackModeController::new(mode, self.total_duration(), iterations)?;
        self.state = PlayState::START;
        tracing::debug!(
            mode = %mode,
            iterations = self.controller.target_iterations(),
            "Playback mode set"
        );
        Ok(())
    }

    /// Apply a playback config, see [`Sequence::set_mode`]
    pub fn apply_config(&mut self, config: &PlaybackConfig) -> Result<()> {
        self.set_mode(config.mode, config.iterations)
    }

    /// Rewind the play head to the start of the plan and zero the counters
    pub fn reset(&mut self) {
        self.state = PlayState::START;
        tracing::debug!("Sequence reset");
    }

    /// Move the play head forward in time by `delta_time` milliseconds.
    ///
    /// Every occupied position crossed is emitted, pass by pass, in traversal
    /// order. The play head and counters are committed before emitting; if a
    /// handler fails the remaining emissions of this step are skipped and the
    /// error is returned.
    pub fn advance(&mut self, delta_time: i64) -> Result<AdvanceReport> {
        let delta = u64::try_from(delta_time).map_err(|_| {
            SequenceError::InvalidArgument(format!(
                "delta time must be non-negative, got {delta_time}"
            ))
        })?;

        if self.is_completed() {
            return Ok(AdvanceReport {
                positions_visited: Vec::new(),
                emissions: 0,
                status: AdvanceStatus::SequenceCompleted,
            });
        }

        let passes_before = self.completed_passes();
        let step = self.controller.step(self.state, delta);
        self.state = step.state;

        let passes_after = self.completed_passes();
        if passes_after > passes_before {
            tracing::debug!(
                completed_passes = passes_after,
                completed_iterations = self.completed_iterations(),
                "Pass finished"
            );
        }

        let mut report = AdvanceReport {
            positions_visited: Vec::new(),
            emissions: 0,
            status: if step.completed {
                AdvanceStatus::Finished
            } else {
                AdvanceStatus::Playing
            },
        };

        // An empty timeline has nothing to emit, however many passes were crossed
        let segments = step.segments.take_while(|_| !self.index.is_empty());
        for segment in segments {
            let positions =
                self.index.positions_in_range(segment.from, segment.to, segment.direction);
            for position in positions {
                for keyframe in self.index.keyframes_at(position) {
                    if let Err(source) = keyframe.emit() {
                        tracing::warn!(position, "Keyframe handler failed: {}", source);
                        return Err(SequenceError::Handler { position, source });
                    }
                    report.emissions += 1;
                }
                tracing::trace!(position, pass = segment.pass, "Emitted keyframes");
                report.positions_visited.push(position);
            }
        }

        if step.completed {
            tracing::debug!(
                mode = %self.mode(),
                play_head = self.play_head(),
                "Sequence completed"
            );
        }

        Ok(report)
    }

    /// Length of the timeline in milliseconds
    pub fn total_duration(&self) -> u64 {
        self.controller.duration()
    }

    /// Current play head position
    pub fn play_head(&self) -> u64 {
        self.controller.position(self.state)
    }

    /// Direction of the current pass
    pub fn direction(&self) -> Direction {
        self.controller.direction(self.state)
    }

    /// Active playback mode
    pub fn mode(&self) -> PlaybackMode {
        self.controller.mode()
    }

    /// Iterations the active mode runs
    pub fn target_iterations(&self) -> u32 {
        self.controller.target_iterations()
    }

    /// Iterations finished so far
    pub fn completed_iterations(&self) -> u64 {
        self.controller.completed_iterations(self.state)
    }

    /// Passes finished so far
    pub fn completed_passes(&self) -> u64 {
        self.controller.completed_passes(self.state)
    }

    /// Whether further `advance` calls are no-ops
    pub fn is_completed(&self) -> bool {
        self.controller.is_terminal(self.state)
    }

    /// Number of keyframes
    pub fn keyframe_count(&self) -> usize {
        self.index.len()
    }

    /// The keyframe index
    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::keyframe::EmitResult;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn any_mode() -> impl Strategy<Value = PlaybackMode> {
        prop::sample::select(PlaybackMode::all().to_vec())
    }

    /// Sequence whose keyframes log their own position
    fn logging_sequence(
        duration: u64,
        mode: PlaybackMode,
        iterations: u32,
        positions: &[u64],
    ) -> (Sequence, Arc<Mutex<Vec<u64>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut seq = Sequence::with_mode(duration, mode, Some(iterations)).unwrap();
        for &position in positions {
            let position = position % duration;
            let sink = Arc::clone(&log);
            seq.add_event(
                position,
                Arc::new(move || -> EmitResult {
                    sink.lock().unwrap().push(position);
                    Ok(())
                }),
            )
            .unwrap();
        }
        (seq, log)
    }

    proptest! {
        /// Property: the play head never leaves the timeline
        #[test]
        fn prop_play_head_bounded(
            mode in any_mode(),
            duration in 1u64..200,
            iterations in 1u32..4,
            deltas in prop::collection::vec(0i64..500, 0..40)
        ) {
            let mut seq = Sequence::with_mode(duration, mode, Some(iterations)).unwrap();
            for delta in deltas {
                seq.advance(delta).unwrap();
                prop_assert!(seq.play_head() < duration);
                prop_assert!(seq.completed_iterations() <= u64::from(seq.target_iterations()));
            }
        }

        /// Property: splitting elapsed time across calls changes nothing
        #[test]
        fn prop_time_is_conserved(
            mode in any_mode(),
            duration in 1u64..120,
            iterations in 1u32..4,
            positions in prop::collection::vec(0u64..120, 0..12),
            deltas in prop::collection::vec(0i64..90, 1..30)
        ) {
            let (mut split, split_log) = logging_sequence(duration, mode, iterations, &positions);
            let (mut whole, whole_log) = logging_sequence(duration, mode, iterations, &positions);

            let mut split_visits = Vec::new();
            for &delta in &deltas {
                split_visits.extend(split.advance(delta).unwrap().positions_visited);
            }
            let whole_visits = whole.advance(deltas.iter().sum()).unwrap().positions_visited;

            prop_assert_eq!(split.play_head(), whole.play_head());
            prop_assert_eq!(split.completed_iterations(), whole.completed_iterations());
            prop_assert_eq!(split.completed_passes(), whole.completed_passes());
            prop_assert_eq!(split.is_completed(), whole.is_completed());
            prop_assert_eq!(split_visits, whole_visits);
            let split_log = split_log.lock().unwrap().clone();
            let whole_log = whole_log.lock().unwrap().clone();
            prop_assert_eq!(split_log, whole_log);
        }
    }
}
