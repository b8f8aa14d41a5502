#![forbid(unsafe_code)]

//! Backend abstraction.
//!
//! [`CatalogBackend`] is the seam between the editor session and whatever
//! stores the catalog. Two implementations ship with the crate:
//!
//! - [`HttpBackend`](crate::http::HttpBackend): the JSON-over-HTTP service.
//! - [`MemoryBackend`]: in-memory (testing, offline demos).
//!
//! # Invariants
//!
//! 1. A `success: false` acknowledgement is reported as
//!    [`SyncError::Rejected`], never as `Ok`.
//! 2. Backends never panic; lock poisoning maps to
//!    [`SyncError::Unavailable`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{RwLock, RwLockWriteGuard};

use serde_json::Value;
use tagdeck_core::normalize;

use crate::error::SyncError;
use crate::wire::{Endpoint, ProcessingStatus, UndoResponse, UploadStatus};

/// Operations the editor needs from a catalog backend.
#[allow(async_fn_in_trait)]
pub trait CatalogBackend {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Raw rows for the full catalog.
    async fn available_items(&self) -> Result<Vec<Value>, SyncError>;

    /// Raw rows for the selection, in authoritative order.
    async fn selected_items(&self) -> Result<Vec<Value>, SyncError>;

    /// Persist the full selection order (wire names).
    async fn update_selected_order(&self, order: &[String]) -> Result<(), SyncError>;

    async fn update_item_lineage(&self, item_name: &str, lineage: &str) -> Result<(), SyncError>;

    /// Ask the backend to revert its last selection change.
    async fn undo_last_move(&self) -> Result<UndoResponse, SyncError>;

    async fn clear_selection(&self) -> Result<(), SyncError>;

    async fn upload_status(&self, filename: &str) -> Result<UploadStatus, SyncError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Backend
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    available: Vec<Value>,
    selected: Vec<String>,
    history: Vec<Vec<String>>,
    upload: VecDeque<UploadStatus>,
    failing: HashSet<Endpoint>,
    rejecting: HashMap<Endpoint, String>,
    calls: Vec<Endpoint>,
}

/// In-memory backend with failure injection.
///
/// Every request is recorded in a call log. Endpoints can be made to fail
/// ([`fail_on`](Self::fail_on)) or to answer `success: false`
/// ([`reject_on`](Self::reject_on)) until recovered.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with catalog rows and a selection (names, in order).
    #[must_use]
    pub fn with_data(available: Vec<Value>, selected: Vec<String>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                available,
                selected,
                ..MemoryState::default()
            }),
        }
    }

    /// Make `endpoint` fail with [`SyncError::Unavailable`].
    pub fn fail_on(&self, endpoint: Endpoint) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(endpoint);
        }
    }

    /// Make `endpoint` answer `success: false` with `message`.
    pub fn reject_on(&self, endpoint: Endpoint, message: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.rejecting.insert(endpoint, message.into());
        }
    }

    /// Undo [`fail_on`](Self::fail_on) and [`reject_on`](Self::reject_on).
    pub fn recover(&self, endpoint: Endpoint) {
        if let Ok(mut state) = self.state.write() {
            state.failing.remove(&endpoint);
            state.rejecting.remove(&endpoint);
        }
    }

    /// Queue processing states for `upload-status`.
    ///
    /// States are consumed in order; the last one sticks.
    pub fn script_upload(&self, statuses: impl IntoIterator<Item = UploadStatus>) {
        if let Ok(mut state) = self.state.write() {
            state.upload.extend(statuses);
        }
    }

    /// Replace the catalog rows the backend serves.
    pub fn set_available(&self, rows: Vec<Value>) {
        if let Ok(mut state) = self.state.write() {
            state.available = rows;
        }
    }

    /// Endpoints called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Endpoint> {
        self.state
            .read()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    /// How many times `endpoint` was called.
    #[must_use]
    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls().into_iter().filter(|e| *e == endpoint).count()
    }

    /// The selection as the backend currently stores it.
    #[must_use]
    pub fn stored_selection(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.selected.clone())
            .unwrap_or_default()
    }

    fn enter(&self, endpoint: Endpoint) -> Result<RwLockWriteGuard<'_, MemoryState>, SyncError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| SyncError::Unavailable("lock poisoned".into()))?;
        state.calls.push(endpoint);
        if state.failing.contains(&endpoint) {
            return Err(SyncError::Unavailable(format!("{endpoint} is down")));
        }
        if let Some(message) = state.rejecting.get(&endpoint) {
            return Err(SyncError::Rejected {
                endpoint,
                message: message.clone(),
            });
        }
        Ok(state)
    }
}

fn row_named(row: &Value, name: &str) -> bool {
    row.as_object()
        .and_then(normalize::normalize_row)
        .is_some_and(|record| record.name.eq_ignore_ascii_case(name))
}

impl CatalogBackend for MemoryBackend {
    fn name(&self) -> &str {
        "MemoryBackend"
    }

    async fn available_items(&self) -> Result<Vec<Value>, SyncError> {
        let state = self.enter(Endpoint::AvailableItems)?;
        Ok(state.available.clone())
    }

    async fn selected_items(&self) -> Result<Vec<Value>, SyncError> {
        let state = self.enter(Endpoint::SelectedItems)?;
        let rows = state
            .selected
            .iter()
            .map(|name| {
                state
                    .available
                    .iter()
                    .find(|row| row_named(row, name))
                    .cloned()
                    .unwrap_or_else(|| Value::String(name.clone()))
            })
            .collect();
        Ok(rows)
    }

    async fn update_selected_order(&self, order: &[String]) -> Result<(), SyncError> {
        let mut state = self.enter(Endpoint::UpdateSelectedOrder)?;
        let previous = std::mem::replace(&mut state.selected, order.to_vec());
        state.history.push(previous);
        Ok(())
    }

    async fn update_item_lineage(&self, item_name: &str, lineage: &str) -> Result<(), SyncError> {
        let mut state = self.enter(Endpoint::UpdateItemLineage)?;
        let row = state
            .available
            .iter_mut()
            .find(|row| row_named(row, item_name));
        match row.and_then(Value::as_object_mut) {
            Some(object) => {
                object.insert("lineage".into(), Value::String(lineage.to_string()));
                Ok(())
            }
            None => Err(SyncError::Rejected {
                endpoint: Endpoint::UpdateItemLineage,
                message: format!("item not found: {item_name}"),
            }),
        }
    }

    async fn undo_last_move(&self) -> Result<UndoResponse, SyncError> {
        let mut state = self.enter(Endpoint::UndoLastMove)?;
        let Some(previous) = state.history.pop() else {
            return Err(SyncError::Rejected {
                endpoint: Endpoint::UndoLastMove,
                message: "nothing to undo".into(),
            });
        };
        state.selected = previous;
        Ok(UndoResponse {
            success: true,
            selected_items: state.selected.clone(),
            available_items: state.available.clone(),
            error: None,
        })
    }

    async fn clear_selection(&self) -> Result<(), SyncError> {
        let mut state = self.enter(Endpoint::ClearSelection)?;
        let previous = std::mem::take(&mut state.selected);
        state.history.push(previous);
        Ok(())
    }

    async fn upload_status(&self, _filename: &str) -> Result<UploadStatus, SyncError> {
        let mut state = self.enter(Endpoint::UploadStatus)?;
        let status = if state.upload.len() > 1 {
            state.upload.pop_front()
        } else {
            state.upload.front().cloned()
        };
        Ok(status.unwrap_or_else(|| UploadStatus::new(ProcessingStatus::Ready)))
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, selected) = self
            .state
            .read()
            .map(|s| (s.available.len(), s.selected.len()))
            .unwrap_or((0, 0));
        f.debug_struct("MemoryBackend")
            .field("rows", &rows)
            .field("selected", &selected)
            .finish()
    }
}
