// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback modes and the play head state machine.
//!
//! A mode expands into a fixed plan of passes over the timeline. Inside a pass
//! the play head moves one position per millisecond from the pass start
//! boundary to its end boundary; stepping from the end of one pass onto the
//! start of the next costs one more millisecond. A plan of `P` passes over a
//! timeline of `D` milliseconds is thus `P * D - 1` milliseconds long, and any
//! split of elapsed time across steps lands on the same state.

use serde::{Deserialize, Serialize};

use crate::sequence::{Result, SequenceError};

/// Traversal direction of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending positions
    Forward,
    /// Descending positions
    Reverse,
}

impl Direction {
    /// `+1` for forward, `-1` for reverse
    pub fn sign(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }
}

/// Playback mode of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// One pass from `0` to `n-1`
    #[default]
    NonloopForward,
    /// One pass from `n-1` to `0`
    NonloopReverse,
    /// `x` forward passes, restarting at `0` each time
    LoopForwardX,
    /// `x` reverse passes, restarting at `n-1` each time
    LoopReverseX,
    /// One forward pass followed by one reverse pass.
    ///
    /// The reverse pass starts on `n-1`, so keyframes seated there fire at
    /// the end of the first pass and again at the start of the second.
    NonloopPingPong,
    /// One reverse pass followed by one forward pass.
    ///
    /// Keyframes on `0` fire on both sides of the turnaround.
    NonloopPongPing,
    /// `x` ping-pong double passes
    LoopPingPongX,
    /// `x` pong-ping double passes
    LoopPongPingX,
}

impl PlaybackMode {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::NonloopForward => "NONLOOP_FORWARD",
            Self::NonloopReverse => "NONLOOP_REVERSE",
            Self::LoopForwardX => "LOOP_FORWARD_X",
            Self::LoopReverseX => "LOOP_REVERSE_X",
            Self::NonloopPingPong => "NONLOOP_PINGPONG",
            Self::NonloopPongPing => "NONLOOP_PONGPING",
            Self::LoopPingPongX => "LOOP_PINGPONG_X",
            Self::LoopPongPingX => "LOOP_PONGPING_X",
        }
    }

    /// Get all playback modes
    pub fn all() -> &'static [PlaybackMode] {
        &[
            Self::NonloopForward,
            Self::NonloopReverse,
            Self::LoopForwardX,
            Self::LoopReverseX,
            Self::NonloopPingPong,
            Self::NonloopPongPing,
            Self::LoopPingPongX,
            Self::LoopPongPingX,
        ]
    }

    /// Whether the mode repeats a caller-supplied number of iterations
    pub fn is_counted(&self) -> bool {
        matches!(
            self,
            Self::LoopForwardX | Self::LoopReverseX | Self::LoopPingPongX | Self::LoopPongPingX
        )
    }

    /// Passes making up one iteration
    pub fn passes_per_iteration(&self) -> u64 {
        match self {
            Self::NonloopForward
            | Self::NonloopReverse
            | Self::LoopForwardX
            | Self::LoopReverseX => 1,
            Self::NonloopPingPong
            | Self::NonloopPongPing
            | Self::LoopPingPongX
            | Self::LoopPongPingX => 2,
        }
    }

    /// Direction of the pass with index `pass`
    pub fn pass_direction(&self, pass: u64) -> Direction {
        let even = pass % 2 == 0;
        match self {
            Self::NonloopForward | Self::LoopForwardX => Direction::Forward,
            Self::NonloopReverse | Self::LoopReverseX => Direction::Reverse,
            Self::NonloopPingPong | Self::LoopPingPongX if even => Direction::Forward,
            Self::NonloopPongPing | Self::LoopPongPingX if !even => Direction::Forward,
            _ => Direction::Reverse,
        }
    }
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Play head state: which pass, and how far into it.
///
/// `offset` counts milliseconds from the pass start boundary, so it is the
/// position for forward passes and `n-1-position` for reverse ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayState {
    pass: u64,
    offset: u64,
    started: bool,
}

impl PlayState {
    /// State before the first step: first pass, start boundary, nothing fired yet
    pub const START: Self = Self {
        pass: 0,
        offset: 0,
        started: false,
    };

    /// Index of the current pass
    pub fn pass(&self) -> u64 {
        self.pass
    }
}

/// Part of a single pass crossed during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Pass index
    pub pass: u64,
    /// First position crossed
    pub from: u64,
    /// Last position crossed (where the play head stopped, or the pass end)
    pub to: u64,
    /// Traversal direction
    pub direction: Direction,
}

/// Outcome of a controller step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State after the step
    pub state: PlayState,
    /// Crossed spans, in traversal order
    pub segments: Segments,
    /// Whether the plan has reached its terminal state
    pub completed: bool,
}

/// Pure play head state machine for one mode over one timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackModeController {
    mode: PlaybackMode,
    duration: u64,
    target_iterations: u32,
}

impl PlaybackModeController {
    /// Create a controller.
    ///
    /// Counted modes need `iterations >= 1`; uncounted modes ignore it.
    pub fn new(mode: PlaybackMode, duration: u64, iterations: Option<u32>) -> Result<Self> {
        if duration == 0 {
            return Err(SequenceError::InvalidArgument(
                "total duration must be positive".to_string(),
            ));
        }

        let target_iterations = if mode.is_counted() {
            match iterations {
                Some(n) if n > 0 => n,
                Some(_) => {
                    return Err(SequenceError::InvalidArgument(format!(
                        "{mode} needs a positive iteration count"
                    )))
                }
                None => {
                    return Err(SequenceError::InvalidArgument(format!(
                        "{mode} needs an iteration count"
                    )))
                }
            }
        } else {
            1
        };

        Ok(Self {
            mode,
            duration,
            target_iterations,
        })
    }

    /// Active mode
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Timeline length in milliseconds
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Iterations the plan runs (1 for uncounted modes)
    pub fn target_iterations(&self) -> u32 {
        self.target_iterations
    }

    /// Number of passes in the plan
    pub fn total_passes(&self) -> u64 {
        u64::from(self.target_iterations) * self.mode.passes_per_iteration()
    }

    /// Milliseconds from plan start to the terminal state
    pub fn plan_length(&self) -> u128 {
        u128::from(self.total_passes()) * u128::from(self.duration) - 1
    }

    /// Milliseconds of the plan already travelled in `state`
    pub fn elapsed(&self, state: PlayState) -> u128 {
        u128::from(state.pass) * u128::from(self.duration) + u128::from(state.offset)
    }

    /// Direction of the pass `state` is in
    pub fn direction(&self, state: PlayState) -> Direction {
        self.mode.pass_direction(state.pass)
    }

    /// Play head position for `state`
    pub fn position(&self, state: PlayState) -> u64 {
        self.position_in_pass(state.pass, state.offset)
    }

    /// Passes whose end boundary has been reached
    pub fn completed_passes(&self, state: PlayState) -> u64 {
        if !state.started {
            return 0;
        }
        state.pass + u64::from(state.offset == self.duration - 1)
    }

    /// Iterations whose final pass has ended
    pub fn completed_iterations(&self, state: PlayState) -> u64 {
        self.completed_passes(state) / self.mode.passes_per_iteration()
    }

    /// Whether `state` is terminal for this plan
    pub fn is_terminal(&self, state: PlayState) -> bool {
        state.started && self.completed_passes(state) >= self.total_passes()
    }

    /// Advance `state` by `delta` milliseconds.
    ///
    /// Every boundary crossed inside the step is handled, and the excess time
    /// carries into the next pass. A terminal state is returned unchanged.
    /// The crossed spans are produced lazily, one per pass touched.
    pub fn step(&self, state: PlayState, delta: u64) -> Step {
        let start = self.elapsed(state);
        if self.is_terminal(state) {
            return Step {
                state,
                segments: Segments::empty(*self),
                completed: true,
            };
        }

        let end = (start + u128::from(delta)).min(self.plan_length());
        // The start position is only pending before the first step
        let first = if state.started { start + 1 } else { start };
        let state = self.state_at(end);
        Step {
            state,
            segments: Segments {
                controller: *self,
                next: first,
                end,
            },
            completed: self.is_terminal(state),
        }
    }

    /// State after travelling `elapsed` milliseconds into the plan
    fn state_at(&self, elapsed: u128) -> PlayState {
        let duration = u128::from(self.duration);
        // Both fit: the pass is below `total_passes` and the offset below `duration`
        PlayState {
            pass: (elapsed / duration) as u64,
            offset: (elapsed % duration) as u64,
            started: true,
        }
    }

    fn position_in_pass(&self, pass: u64, offset: u64) -> u64 {
        match self.mode.pass_direction(pass) {
            Direction::Forward => offset,
            Direction::Reverse => self.duration - 1 - offset,
        }
    }

    fn segment(&self, pass: u64, from_offset: u64, to_offset: u64) -> Segment {
        Segment {
            pass,
            from: self.position_in_pass(pass, from_offset),
            to: self.position_in_pass(pass, to_offset),
            direction: self.mode.pass_direction(pass),
        }
    }
}

/// Lazy walk over the spans crossed by one [`Step`], one per pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    controller: PlaybackModeController,
    /// Next plan millisecond to visit
    next: u128,
    /// Last plan millisecond to visit, inclusive
    end: u128,
}

impl Segments {
    fn empty(controller: PlaybackModeController) -> Self {
        Self {
            controller,
            next: 1,
            end: 0,
        }
    }
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.next > self.end {
            return None;
        }

        let ctl = &self.controller;
        let from = ctl.state_at(self.next);
        let pass_end = self.next - u128::from(from.offset) + u128::from(ctl.duration) - 1;
        let to = ctl.state_at(pass_end.min(self.end));
        self.next = pass_end.min(self.end) + 1;
        Some(ctl.segment(from.pass, from.offset, to.offset))
    }
}
