#![forbid(unsafe_code)]

//! Pointer-move coalescing.
//!
//! A drag produces a flood of move events, one per host frame or faster.
//! Each move re-probes the layout to validate the drag origin, so handling
//! every one of them is wasted work. [`PointerCoalescer`] keeps only the
//! latest move and passes every other kind through.
//!
//! # Design
//!
//! - Move: replaces any pending move. Returns `None`.
//! - Down / Up / Cancel: returned immediately. Flushing is NOT automatic;
//!   the caller flushes first so the pending move is handled before the
//!   release that ends the drag.
//!
//! ```
//! use tagdeck_core::event::PointerEvent;
//! use tagdeck_core::event_coalescer::PointerCoalescer;
//!
//! let mut coalescer = PointerCoalescer::new();
//! assert!(coalescer.push(PointerEvent::moved(1.0, 10.0)).is_none());
//! assert!(coalescer.push(PointerEvent::moved(1.0, 40.0)).is_none());
//!
//! let up = coalescer.push(PointerEvent::up(1.0, 40.0));
//! assert!(up.is_some());
//!
//! let pending = coalescer.flush();
//! assert_eq!(pending.map(|e| e.y), Some(40.0));
//! ```

use crate::event::{PointerEvent, PointerKind};

/// Latest-wins buffer for pointer moves.
///
/// Not thread-safe; use from the single event-processing context.
#[derive(Debug, Clone, Default)]
pub struct PointerCoalescer {
    pending_move: Option<PointerEvent>,
    coalesced: u64,
}

impl PointerCoalescer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event.
    ///
    /// Returns `Some(event)` if it should be handled now, `None` if it was
    /// absorbed into the pending move.
    pub fn push(&mut self, event: PointerEvent) -> Option<PointerEvent> {
        match event.kind {
            PointerKind::Move => {
                if self.pending_move.replace(event).is_some() {
                    self.coalesced = self.coalesced.saturating_add(1);
                }
                None
            }
            PointerKind::Down | PointerKind::Up | PointerKind::Cancel => Some(event),
        }
    }

    /// Take the pending move, if any.
    #[must_use]
    pub fn flush(&mut self) -> Option<PointerEvent> {
        self.pending_move.take()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending_move.is_some()
    }

    /// Moves dropped because a newer one replaced them.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }

    /// Discard the pending move.
    pub fn clear(&mut self) {
        self.pending_move = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_coalescer_has_no_pending() {
        let coalescer = PointerCoalescer::new();
        assert!(!coalescer.has_pending());
        assert_eq!(coalescer.coalesced_count(), 0);
    }

    #[test]
    fn moves_coalesce_latest_wins() {
        let mut coalescer = PointerCoalescer::new();
        assert!(coalescer.push(PointerEvent::moved(0.0, 1.0)).is_none());
        assert!(coalescer.push(PointerEvent::moved(0.0, 2.0)).is_none());
        assert!(coalescer.push(PointerEvent::moved(0.0, 3.0)).is_none());
        assert_eq!(coalescer.coalesced_count(), 2);

        let pending = coalescer.flush().unwrap();
        assert_eq!(pending.y, 3.0);
        assert!(!coalescer.has_pending());
    }

    #[test]
    fn other_kinds_pass_through_without_flushing() {
        let mut coalescer = PointerCoalescer::new();
        coalescer.push(PointerEvent::moved(0.0, 5.0));

        let down = coalescer.push(PointerEvent::down(1.0, 1.0)).unwrap();
        assert_eq!(down.kind, PointerKind::Down);
        assert!(coalescer.has_pending());

        let cancel = coalescer.push(PointerEvent::cancel()).unwrap();
        assert_eq!(cancel.kind, PointerKind::Cancel);
    }

    #[test]
    fn clear_discards_pending() {
        let mut coalescer = PointerCoalescer::new();
        coalescer.push(PointerEvent::moved(0.0, 5.0));
        coalescer.clear();
        assert!(coalescer.flush().is_none());
    }
}
