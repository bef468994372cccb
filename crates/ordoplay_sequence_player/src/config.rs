// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player file format.
//!
//! A player file describes a preview run: timeline length, tick size,
//! playback preset and a list of named markers. It is a preview input only;
//! sequences themselves are built in memory from it.

use ordoplay_sequencer::{PlaybackConfig, PlaybackMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default tick, roughly one frame at 60 Hz
pub const DEFAULT_TICK_MS: u64 = 16;

/// Player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Player file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Player file could not be parsed
    #[error("Invalid player file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Sequence rejected the player file contents
    #[error("Sequence error: {0}")]
    Sequence(#[from] ordoplay_sequencer::SequenceError),

    /// Tick of zero would never finish
    #[error("Tick must be at least 1ms")]
    ZeroTick,
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// A named marker on the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Position in milliseconds
    pub position: u64,
    /// Label written to the log when the marker fires
    pub label: String,
}

impl Marker {
    /// Create a marker
    pub fn new(position: u64, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
        }
    }
}

/// Preview run description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Timeline length in milliseconds
    pub duration_ms: u64,
    /// Elapsed time per tick
    #[serde(default = "default_tick")]
    pub tick_ms: u64,
    /// Playback preset
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Markers to place
    #[serde(default)]
    pub markers: Vec<Marker>,
}

fn default_tick() -> u64 {
    DEFAULT_TICK_MS
}

impl PlayerConfig {
    /// Built-in demo: a one second ping-pong played twice
    pub fn demo() -> Self {
        Self {
            duration_ms: 1000,
            tick_ms: DEFAULT_TICK_MS,
            playback: PlaybackConfig::new(PlaybackMode::LoopPingPongX).with_iterations(2),
            markers: vec![
                Marker::new(0, "fade in"),
                Marker::new(250, "camera cut"),
                Marker::new(250, "play sfx"),
                Marker::new(600, "spawn particles"),
                Marker::new(999, "hold"),
            ],
        }
    }

    /// Parse from RON
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron(&source)
    }
}
