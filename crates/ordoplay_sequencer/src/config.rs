// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback configuration.
//!
//! Stored as RON so playback presets can live next to other editor settings:
//!
//! ```ron
//! (mode: LoopPingPongX, iterations: Some(2))
//! ```

use serde::{Deserialize, Serialize};

use crate::playback::{PlaybackMode, PlaybackModeController};
use crate::sequence::Result;

/// Playback mode plus its iteration count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Playback mode
    pub mode: PlaybackMode,
    /// Iteration count, required by counted modes
    #[serde(default)]
    pub iterations: Option<u32>,
}

impl PlaybackConfig {
    /// Create a config for an uncounted mode
    pub fn new(mode: PlaybackMode) -> Self {
        Self {
            mode,
            iterations: None,
        }
    }

    /// Set the iteration count
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Check the config against a timeline of `duration` milliseconds
    pub fn validate(&self, duration: u64) -> Result<()> {
        PlaybackModeController::new(self.mode, duration, self.iterations).map(|_| ())
    }

    /// Parse from RON
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::SequenceError;

    #[test]
    fn test_default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.mode, PlaybackMode::NonloopForward);
        assert!(config.iterations.is_none());
        assert!(config.validate(100).is_ok());
    }

    #[test]
    fn test_serialization() {
        let config = PlaybackConfig::new(PlaybackMode::LoopPongPingX).with_iterations(4);
        let ron_str = config.to_ron().unwrap();
        let loaded = PlaybackConfig::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_without_iterations() {
        let config = PlaybackConfig::from_ron("(mode: NonloopPongPing)").unwrap();
        assert_eq!(config.mode, PlaybackMode::NonloopPongPing);
        assert_eq!(config.iterations, None);
    }

    #[test]
    fn test_validate_counted_mode() {
        let config = PlaybackConfig::new(PlaybackMode::LoopForwardX);
        assert!(matches!(config.validate(100), Err(SequenceError::InvalidArgument(_))));
        assert!(config.with_iterations(2).validate(100).is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = PlaybackConfig::from_ron("(mode: Sideways)").unwrap_err();
        assert!(matches!(err, SequenceError::Config(_)));
    }
}
