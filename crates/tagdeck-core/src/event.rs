#![forbid(unsafe_code)]

//! Pointer events delivered by the host.
//!
//! The host translates its native input (mouse, touch, pen) into
//! [`PointerEvent`]s before handing them to the editor. The editor never
//! sees platform event types.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Kind of pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Primary button pressed.
    Down,
    /// Pointer moved, with or without a button held.
    Move,
    /// Primary button released.
    Up,
    /// The host lost the pointer (focus loss, capture revoked, escape key).
    Cancel,
}

/// A pointer event in host pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self { kind, x, y }
    }

    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    #[must_use]
    pub const fn cancel() -> Self {
        Self::new(PointerKind::Cancel, 0.0, 0.0)
    }

    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
