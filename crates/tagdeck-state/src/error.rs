#![forbid(unsafe_code)]

//! Errors raised by the state engine.
//!
//! Only caller mistakes and edit-boundary validation surface as errors.
//! Store-level faults self-heal and stale drags abort quietly; neither
//! appears here.

use std::fmt;

use tagdeck_core::ItemId;

/// Rejection of a lineage edit before any mutation or network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineageError {
    /// A required field was empty after trimming.
    Empty { field: &'static str },
    /// No catalog record has this name.
    UnknownItem(String),
}

impl LineageError {
    /// Name of the offending form field, for field-level messages.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            LineageError::Empty { field } => field,
            LineageError::UnknownItem(_) => "item_name",
        }
    }
}

impl fmt::Display for LineageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineageError::Empty { field } => write!(f, "{field} must not be empty"),
            LineageError::UnknownItem(name) => write!(f, "no item named {name:?}"),
        }
    }
}

impl std::error::Error for LineageError {}

/// Misuse of the drag gesture API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    /// The pressed index is not a rendered selected-pane leaf.
    IndexOutOfRange { index: usize, rendered: usize },
    /// The rendered leaf is not in the selection.
    NotSelected(ItemId),
    /// A press arrived while another gesture was active.
    AlreadyActive,
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragError::IndexOutOfRange { index, rendered } => {
                write!(f, "leaf index {index} out of range ({rendered} rendered)")
            }
            DragError::NotSelected(id) => write!(f, "rendered leaf {id} is not selected"),
            DragError::AlreadyActive => write!(f, "a drag gesture is already active"),
        }
    }
}

impl std::error::Error for DragError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lineage_error_names_field() {
        let err = LineageError::Empty { field: "lineage" };
        assert_eq!(err.field(), "lineage");
        assert_eq!(err.to_string(), "lineage must not be empty");
        assert_eq!(LineageError::UnknownItem("x".into()).field(), "item_name");
    }

    #[test]
    fn drag_error_display() {
        let err = DragError::IndexOutOfRange {
            index: 4,
            rendered: 2,
        };
        assert_eq!(err.to_string(), "leaf index 4 out of range (2 rendered)");
    }
}
