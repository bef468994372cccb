// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe timeline engine for OrdoPlay.
//!
//! This crate advances a play head through a fixed-length, millisecond
//! resolution timeline and fires caller-supplied handlers whenever the play
//! head crosses a position holding keyframes:
//! - Keyframes bound to event handlers
//! - Ordered timeline index with shared positions
//! - Eight playback modes (forward, reverse, looped, ping-pong, pong-ping)
//! - Explicit ticking by the host loop
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - [`TimelineIndex`] mapping positions to keyframes
//! - [`PlaybackModeController`], a pure play head state machine
//! - [`Sequence`], which owns both and emits crossings on [`Sequence::advance`]
//!
//! ```
//! use std::sync::Arc;
//! use ordoplay_sequencer::{EmitResult, PlaybackMode, Sequence};
//!
//! let mut sequence = Sequence::with_mode(1000, PlaybackMode::LoopForwardX, Some(2))?;
//! sequence.add_event(250, Arc::new(|| -> EmitResult { Ok(()) }))?;
//!
//! let report = sequence.advance(300)?;
//! assert_eq!(report.positions_visited, vec![250]);
//! # Ok::<(), ordoplay_sequencer::SequenceError>(())
//! ```

pub mod config;
pub mod index;
pub mod keyframe;
pub mod playback;
pub mod sequence;

pub use config::PlaybackConfig;
pub use index::{PositionsInRange, TimelineIndex};
pub use keyframe::{
    EmitResult, EventHandler, FreshKeyframes, HandlerError, Keyframe, KeyframeFactory, KeyframeId,
};
pub use playback::{
    Direction, PlayState, PlaybackMode, PlaybackModeController, Segment, Segments, Step,
};
pub use sequence::{AdvanceReport, AdvanceStatus, Result, Sequence, SequenceError};
