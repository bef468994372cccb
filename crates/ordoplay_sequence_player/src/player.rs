// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless preview loop.
//!
//! Builds a sequence from a [`PlayerConfig`] and ticks it with a fixed step
//! until it completes, logging every marker as it fires.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ordoplay_sequencer::{AdvanceStatus, EmitResult, EventHandler, Sequence};

use crate::config::{PlayerConfig, PlayerError, Result};

/// Marker handler that logs its label
#[derive(Debug)]
pub struct MarkerEvent {
    label: String,
    fired: AtomicUsize,
}

impl MarkerEvent {
    /// Create a marker handler
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fired: AtomicUsize::new(0),
        }
    }

    /// How many times the marker fired
    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::Relaxed)
    }
}

impl EventHandler for MarkerEvent {
    fn emit(&self) -> EmitResult {
        let count = self.fired.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(marker = %self.label, count, "Marker fired");
        Ok(())
    }
}

/// Result of a finished preview run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks taken
    pub frame_count: u64,
    /// Wall time fed into the sequence, in milliseconds
    pub elapsed_ms: u64,
    /// Total keyframe emissions
    pub emissions: usize,
    /// Play head position at the end
    pub play_head: u64,
    /// Iterations completed
    pub completed_iterations: u64,
}

/// Preview runner
pub struct PreviewRunner {
    sequence: Sequence,
    markers: Vec<Arc<MarkerEvent>>,
    tick_ms: u64,
    /// Frames ticked since start
    pub frame_count: u64,
    /// Elapsed time since start
    pub elapsed_ms: u64,
}

impl PreviewRunner {
    /// Build the sequence described by `config`
    pub fn new(config: &PlayerConfig) -> Result<Self> {
        if config.tick_ms == 0 {
            return Err(PlayerError::ZeroTick);
        }

        let mut sequence = Sequence::from_config(config.duration_ms, &config.playback)?;
        let mut markers = Vec::with_capacity(config.markers.len());
        for marker in &config.markers {
            let handler = Arc::new(MarkerEvent::new(marker.label.clone()));
            sequence.add_event(marker.position, Arc::clone(&handler) as Arc<dyn EventHandler>)?;
            markers.push(handler);
        }

        tracing::info!(
            duration_ms = config.duration_ms,
            mode = %sequence.mode(),
            iterations = sequence.target_iterations(),
            keyframes = sequence.keyframe_count(),
            "Sequence loaded"
        );

        Ok(Self {
            sequence,
            markers,
            tick_ms: config.tick_ms,
            frame_count: 0,
            elapsed_ms: 0,
        })
    }

    /// Advance one tick, returning the sequence status afterwards
    pub fn tick(&mut self) -> Result<AdvanceStatus> {
        let delta = i64::try_from(self.tick_ms).unwrap_or(i64::MAX);
        let report = self.sequence.advance(delta)?;
        if report.status != AdvanceStatus::SequenceCompleted {
            self.frame_count += 1;
            self.elapsed_ms += self.tick_ms;
        }
        if !report.positions_visited.is_empty() {
            tracing::debug!(
                frame = self.frame_count,
                positions = ?report.positions_visited,
                "Crossed keyframes"
            );
        }
        Ok(report.status)
    }

    /// Tick until the sequence completes
    pub fn run(&mut self) -> Result<RunSummary> {
        while self.tick()? == AdvanceStatus::Playing {}

        let summary = RunSummary {
            frame_count: self.frame_count,
            elapsed_ms: self.elapsed_ms,
            emissions: self.markers.iter().map(|m| m.fired()).sum(),
            play_head: self.sequence.play_head(),
            completed_iterations: self.sequence.completed_iterations(),
        };
        tracing::info!(
            frames = summary.frame_count,
            elapsed_ms = summary.elapsed_ms,
            emissions = summary.emissions,
            "Preview finished"
        );
        Ok(summary)
    }

    /// Marker handlers in file order
    pub fn markers(&self) -> &[Arc<MarkerEvent>] {
        &self.markers
    }
}
