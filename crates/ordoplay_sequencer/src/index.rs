// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline index: position -> keyframes seated there.

use std::collections::btree_map::{self, BTreeMap};

use crate::keyframe::{Keyframe, KeyframeId};
use crate::playback::Direction;
use crate::sequence::{Result, SequenceError};

/// Ordered lookup of keyframes by position.
///
/// Keyframes sharing a position are all retained, in insertion order.
#[derive(Debug, Clone)]
pub struct TimelineIndex {
    /// Duration of the owning sequence; valid positions are `0..duration`
    duration: u64,
    frames: BTreeMap<u64, Vec<Keyframe>>,
    len: usize,
}

impl TimelineIndex {
    /// Create an empty index for a timeline of `duration` milliseconds
    pub fn new(duration: u64) -> Self {
        Self {
            duration,
            frames: BTreeMap::new(),
            len: 0,
        }
    }

    /// Insert a keyframe, rejecting positions outside `0..duration`.
    pub fn insert(&mut self, keyframe: Keyframe) -> Result<KeyframeId> {
        let position = keyframe.position();
        if position >= self.duration {
            return Err(SequenceError::InvalidPosition {
                position,
                duration: self.duration,
            });
        }

        let id = keyframe.id();
        self.frames.entry(position).or_default().push(keyframe);
        self.len += 1;
        Ok(id)
    }

    /// Keyframes seated at exactly `position` (empty if none)
    pub fn keyframes_at(&self, position: u64) -> &[Keyframe] {
        self.frames.get(&position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occupied positions between `from` and `to` inclusive, ordered by `direction`.
    ///
    /// The bounds may be given in either order. The returned iterator is lazy
    /// and can be cloned to restart the walk.
    pub fn positions_in_range(
        &self,
        from: u64,
        to: u64,
        direction: Direction,
    ) -> PositionsInRange<'_> {
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        PositionsInRange {
            range: self.frames.range(lo..=hi),
            direction,
        }
    }

    /// All occupied positions, ascending
    pub fn occupied_positions(&self) -> impl Iterator<Item = u64> + '_ {
        self.frames.keys().copied()
    }

    /// Iterate `(position, keyframes)` pairs in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[Keyframe])> + '_ {
        self.frames.iter().map(|(p, k)| (*p, k.as_slice()))
    }

    /// Total number of keyframes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no keyframes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Lazy walk over occupied positions, see [`TimelineIndex::positions_in_range`].
#[derive(Debug, Clone)]
pub struct PositionsInRange<'a> {
    range: btree_map::Range<'a, u64, Vec<Keyframe>>,
    direction: Direction,
}

impl Iterator for PositionsInRange<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let entry = match self.direction {
            Direction::Forward => self.range.next(),
            Direction::Reverse => self.range.next_back(),
        };
        entry.map(|(position, _)| *position)
    }
}
