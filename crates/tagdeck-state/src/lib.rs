#![forbid(unsafe_code)]

//! Synchronous state engine for the tag catalog editor.
//!
//! [`EditorState`] is the single owner of editor state. The pieces it is
//! built from are usable on their own:
//!
//! - [`selection::SelectionStore`]: ordered, duplicate-free selection with
//!   single-level clear/undo.
//! - [`reconcile`]: group toggles and derived tri-state group controls.
//! - [`drag`]: the press/drag/release state machine over logical leaf indices.
//! - [`view`]: derived panes for a render pass.

pub mod config;
pub mod drag;
pub mod editor;
pub mod error;
pub mod reconcile;
pub mod selection;
pub mod view;

pub use config::EditorConfig;
pub use drag::{DragConfig, DragPhase, DragSession, LayoutProbe, LiveTarget, RenderedLeaf, StackedLayout};
pub use editor::{
    AbortReason, Dataset, EditorState, GroupScope, PendingSync, PointerOutcome, ReleaseOutcome,
    SyncOutcome, UpdateDisposition,
};
pub use error::{DragError, LineageError};
pub use selection::{ReorderReport, SelectionStore};
pub use view::{ViewCounts, ViewModel};
