// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for the sequencer.
//!
//! A keyframe binds one position on a sequence timeline to one event handler.
//! What the handler does is entirely up to the embedding application.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error reported by an event handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single emission
pub type EmitResult = Result<(), HandlerError>;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability invoked when the play head crosses a keyframe.
///
/// Emission is fire-and-forget from the sequence's point of view: if the
/// effect of an event is long-running, the handler is responsible for
/// scheduling that work itself and returning promptly.
pub trait EventHandler: Send + Sync {
    /// Signal the event
    fn emit(&self) -> EmitResult;
}

impl<F> EventHandler for F
where
    F: Fn() -> EmitResult + Send + Sync,
{
    fn emit(&self) -> EmitResult {
        self()
    }
}

/// A single position-bound event trigger.
///
/// Keyframes are immutable once built. The handler is shared, so the same
/// handler may back several keyframes; the keyframe never owns its lifetime
/// exclusively.
#[derive(Clone)]
pub struct Keyframe {
    id: KeyframeId,
    position: u64,
    handler: Arc<dyn EventHandler>,
}

impl Keyframe {
    /// Create a new keyframe seated at `position` milliseconds.
    ///
    /// The position is not validated here; the owning sequence checks it
    /// against its duration on insertion.
    pub fn new(handler: Arc<dyn EventHandler>, position: u64) -> Self {
        Self {
            id: KeyframeId::new(),
            position,
            handler,
        }
    }

    /// Keyframe ID
    pub fn id(&self) -> KeyframeId {
        self.id
    }

    /// Seated position in milliseconds
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The handler fired by this keyframe
    pub fn handler(&self) -> &Arc<dyn EventHandler> {
        &self.handler
    }

    /// Invoke the handler exactly once.
    pub fn emit(&self) -> EmitResult {
        self.handler.emit()
    }
}

impl fmt::Debug for Keyframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyframe")
            .field("id", &self.id)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Construction capability for keyframes.
///
/// Lets an application recycle keyframe allocations (an object pool, for
/// instance) without the sequence knowing about it.
pub trait KeyframeFactory {
    /// Produce a keyframe for `handler` at `position`
    fn obtain(&self, handler: Arc<dyn EventHandler>, position: u64) -> Keyframe;
}

/// Factory that builds a fresh keyframe on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshKeyframes;

impl KeyframeFactory for FreshKeyframes {
    fn obtain(&self, handler: Arc<dyn EventHandler>, position: u64) -> Keyframe {
        Keyframe::new(handler, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_delegates_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let keyframe = Keyframe::new(
            Arc::new(move || -> EmitResult {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            42,
        );

        keyframe.emit().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // No fired-state is kept: a second emit fires again
        keyframe.emit().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(keyframe.position(), 42);
    }

    #[test]
    fn test_emit_propagates_handler_error() {
        let keyframe = Keyframe::new(Arc::new(|| -> EmitResult { Err("boom".into()) }), 0);
        let err = keyframe.emit().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_out_of_range_construction_is_allowed() {
        let keyframe = Keyframe::new(Arc::new(|| -> EmitResult { Ok(()) }), u64::MAX);
        assert_eq!(keyframe.position(), u64::MAX);
    }

    #[test]
    fn test_factory_assigns_unique_ids() {
        let handler: Arc<dyn EventHandler> = Arc::new(|| -> EmitResult { Ok(()) });
        let a = FreshKeyframes.obtain(Arc::clone(&handler), 10);
        let b = FreshKeyframes.obtain(handler, 10);
        assert_ne!(a.id(), b.id());
        assert!(Arc::ptr_eq(a.handler(), b.handler()));
    }
}
