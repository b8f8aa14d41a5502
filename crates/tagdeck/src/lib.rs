#![forbid(unsafe_code)]

//! TagDeck public facade crate.
//!
//! Re-exports the common types from the internal crates and offers a
//! prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use tagdeck_core::{
    Catalog, ComplianceFilter, ComplianceFlags, ContainerKey, FilterCriteria, FilterOptions,
    HierarchyNode, ItemId, ItemRecord, Level, LoadReport, Point, PointerCoalescer, PointerEvent,
    PointerKind, RowBounds, ToggleState,
};

// --- State re-exports ------------------------------------------------------

pub use tagdeck_state::{
    AbortReason, Dataset, DragError, DragPhase, EditorConfig, EditorState, GroupScope,
    LayoutProbe, LineageError, PendingSync, PointerOutcome, ReleaseOutcome, RenderedLeaf,
    SelectionStore, StackedLayout, SyncOutcome, UpdateDisposition, ViewModel,
};

// --- Sync re-exports -------------------------------------------------------

#[cfg(feature = "sync")]
pub use tagdeck_sync::{
    CatalogBackend, EditorSession, HttpBackend, MemoryBackend, OrderSyncClient, SyncConfig,
    SyncError,
};

// --- Web re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use tagdeck_web::{DeterministicClock, HostBridge, RenderConfig, RenderScheduler, ViewSnapshot};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for TagDeck hosts.
#[derive(Debug)]
pub enum Error {
    /// Pointer routing misuse.
    Drag(DragError),
    /// Rejected lineage edit.
    Lineage(LineageError),
    /// Backend communication failure.
    #[cfg(feature = "sync")]
    Sync(SyncError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drag(err) => write!(f, "{err}"),
            Self::Lineage(err) => write!(f, "{err}"),
            #[cfg(feature = "sync")]
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Drag(err) => Some(err),
            Self::Lineage(err) => Some(err),
            #[cfg(feature = "sync")]
            Self::Sync(err) => Some(err),
        }
    }
}

impl From<DragError> for Error {
    fn from(err: DragError) -> Self {
        Self::Drag(err)
    }
}

impl From<LineageError> for Error {
    fn from(err: LineageError) -> Self {
        Self::Lineage(err)
    }
}

#[cfg(feature = "sync")]
impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

/// Standard result type for TagDeck APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Catalog, Dataset, EditorConfig, EditorState, Error, FilterCriteria, GroupScope, ItemId,
        ItemRecord, PointerEvent, PointerOutcome, ReleaseOutcome, Result, ViewModel,
    };

    #[cfg(feature = "sync")]
    pub use crate::{CatalogBackend, EditorSession, SyncConfig};

    #[cfg(feature = "web")]
    pub use crate::{HostBridge, RenderConfig, ViewSnapshot};

    pub use crate::{core, state};

    #[cfg(feature = "sync")]
    pub use crate::sync;

    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use tagdeck_core as core;
pub use tagdeck_state as state;

#[cfg(feature = "sync")]
pub use tagdeck_sync as sync;

#[cfg(feature = "web")]
pub use tagdeck_web as web;
