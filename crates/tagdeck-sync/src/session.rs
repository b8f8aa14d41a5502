#![forbid(unsafe_code)]

//! Editor session: the editor state wired to a backend.
//!
//! [`EditorSession`] owns an [`EditorState`] and a [`CatalogBackend`] and
//! sequences every operation that crosses the network boundary. Local
//! mutations are applied first; the backend call follows. A failed call
//! never rolls the local state back.

use std::time::Duration;

use tagdeck_core::ItemId;
use tagdeck_state::{
    Dataset, EditorState, GroupScope, PendingSync, PointerOutcome, ReleaseOutcome, SyncOutcome,
    UpdateDisposition,
};
use tracing::{Instrument, debug, debug_span, warn};

use crate::backend::CatalogBackend;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::order_sync::OrderSyncClient;
use crate::wire::{ProcessingStatus, UploadStatus, names_from_rows};

/// An editor bound to a backend.
#[derive(Debug)]
pub struct EditorSession<B> {
    backend: B,
    editor: EditorState,
    order_sync: OrderSyncClient,
    config: SyncConfig,
}

impl<B: CatalogBackend> EditorSession<B> {
    #[must_use]
    pub fn new(backend: B, editor: EditorState, config: SyncConfig) -> Self {
        Self {
            backend,
            editor,
            order_sync: OrderSyncClient::new(),
            config,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// Direct access for pointer routing and filtering.
    ///
    /// Selection changes made through this handle are not persisted; prefer
    /// the session's own mutators.
    pub fn editor_mut(&mut self) -> &mut EditorState {
        &mut self.editor
    }

    #[must_use]
    pub fn order_sync(&self) -> &OrderSyncClient {
        &self.order_sync
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // --- Loading -----------------------------------------------------------

    /// Fetch catalog and selection and load them.
    ///
    /// The backend becomes the source of truth, so any pending order retry
    /// is dropped once the load applies.
    pub async fn load(&mut self) -> Result<UpdateDisposition, SyncError> {
        let span = debug_span!("dataset_load", backend = self.backend.name());
        let (available, selected) = async {
            let available = self.backend.available_items().await?;
            let selected = self.backend.selected_items().await?;
            Ok::<_, SyncError>((available, names_from_rows(&selected)))
        }
        .instrument(span)
        .await?;
        let disposition = self.editor.load_dataset(Dataset {
            available,
            selected,
        });
        if disposition == UpdateDisposition::Applied {
            self.order_sync = OrderSyncClient::new();
        }
        Ok(disposition)
    }

    /// Re-fetch the catalog only. The selection is kept.
    pub async fn refresh_catalog(&mut self) -> Result<UpdateDisposition, SyncError> {
        let rows = self.backend.available_items().await?;
        Ok(self.editor.apply_catalog_refresh(rows))
    }

    // --- Drag commit -------------------------------------------------------

    /// Persist a committed drop and finish its committing phase.
    ///
    /// The editor leaves the committing phase whatever the result.
    pub async fn commit(&mut self, pending: PendingSync) -> Result<(), SyncError> {
        let result = self
            .order_sync
            .persist(&self.backend, &pending.wire_order)
            .await;
        let outcome = match &result {
            Ok(()) => SyncOutcome::Confirmed(pending.order),
            Err(err) => SyncOutcome::Failed(err.to_string()),
        };
        let replayed = self.editor.complete_sync(pending.ticket, outcome);
        if replayed > 0 {
            debug!(replayed, ticket = pending.ticket, "deferred updates flushed after sync");
        }
        result
    }

    /// Commit the drop carried by a pointer outcome, if any.
    pub async fn settle(&mut self, outcome: &PointerOutcome) -> Option<Result<(), SyncError>> {
        match outcome {
            PointerOutcome::Released(ReleaseOutcome::Committed(pending)) => {
                Some(self.commit(pending.clone()).await)
            }
            _ => None,
        }
    }

    // --- Selection mutators ------------------------------------------------

    //
    // Each mutator persists the new order when it changed anything. A
    // failed persist leaves the local change in place and is visible through
    // [`OrderSyncClient::last_error`].

    /// Select or deselect one item.
    pub async fn toggle_item(&mut self, id: &ItemId, selected: bool) -> bool {
        let changed = self.editor.toggle_item(id, selected);
        self.sync_selection(changed).await;
        changed
    }

    /// Select or deselect every item under a group.
    pub async fn toggle_group(&mut self, scope: GroupScope, path: &[&str], checked: bool) -> usize {
        let changed = self.editor.toggle_group(scope, path, checked);
        self.sync_selection(changed > 0).await;
        changed
    }

    pub async fn select_visible(&mut self) -> usize {
        let changed = self.editor.select_visible();
        self.sync_selection(changed > 0).await;
        changed
    }

    pub async fn deselect_visible(&mut self) -> usize {
        let changed = self.editor.deselect_visible();
        self.sync_selection(changed > 0).await;
        changed
    }

    /// Send the current order after a selection change.
    ///
    /// Without a change this only retries an earlier failed persist.
    async fn sync_selection(&mut self, changed: bool) -> Option<Result<(), SyncError>> {
        if !changed {
            return self.retry_pending_sync().await;
        }
        let order = self.editor.wire_selection();
        let ids = self.editor.selection().to_vec();
        let result = self.order_sync.persist(&self.backend, &order).await;
        if result.is_ok() {
            self.editor.confirm_order(&ids);
        }
        Some(result)
    }

    /// Re-send the current order if an earlier persist failed.
    ///
    /// Failures stay visible through [`OrderSyncClient::last_error`].
    pub async fn retry_pending_sync(&mut self) -> Option<Result<(), SyncError>> {
        let order = self.editor.wire_selection();
        let ids = self.editor.selection().to_vec();
        let result = self.order_sync.sync_if_needed(&self.backend, &order).await;
        if matches!(result, Some(Ok(()))) {
            self.editor.confirm_order(&ids);
        }
        result
    }

    // --- Clear / undo ------------------------------------------------------

    /// Clear locally, then tell the backend.
    ///
    /// Returns whether anything was cleared. The local clear stands even
    /// when the backend call fails.
    pub async fn clear_selection(&mut self) -> Result<bool, SyncError> {
        let cleared = self.editor.clear_selection();
        if !cleared {
            return Ok(false);
        }
        self.backend.clear_selection().await?;
        Ok(true)
    }

    /// Restore the selection from before the last clear and persist it.
    pub async fn undo_clear(&mut self) -> Result<bool, SyncError> {
        if !self.editor.undo_clear() {
            return Ok(false);
        }
        let order = self.editor.wire_selection();
        self.order_sync.persist(&self.backend, &order).await?;
        Ok(true)
    }

    /// Ask the backend to revert its last selection change and adopt its
    /// answer wholesale.
    pub async fn undo_last_move(&mut self) -> Result<UpdateDisposition, SyncError> {
        let response = self.backend.undo_last_move().await?;
        let disposition = self
            .editor
            .apply_backend_undo(response.selected_items, response.available_items);
        self.order_sync = OrderSyncClient::new();
        Ok(disposition)
    }

    // --- Lineage -----------------------------------------------------------

    /// Validate, send, and on success patch the catalog record in place.
    pub async fn update_lineage(
        &mut self,
        item_name: &str,
        lineage: &str,
    ) -> Result<ItemId, SyncError> {
        let lineage = self.editor.validate_lineage(item_name, lineage)?;
        self.backend
            .update_item_lineage(item_name.trim(), &lineage)
            .await?;
        Ok(self.editor.patch_lineage(item_name, &lineage)?)
    }

    // --- Processing --------------------------------------------------------

    /// Wait for the backend to finish processing an uploaded file.
    pub async fn await_processing(&self, filename: &str) -> Result<UploadStatus, SyncError> {
        await_processing(
            &self.backend,
            filename,
            self.config.poll_interval,
            self.config.poll_max_attempts,
        )
        .await
    }

    /// Wait for processing, then reload the dataset.
    pub async fn load_after_processing(
        &mut self,
        filename: &str,
    ) -> Result<UpdateDisposition, SyncError> {
        self.await_processing(filename).await?;
        self.load().await
    }
}

/// Poll `upload-status` until the file is ready, fails, or the attempt
/// ceiling is reached.
pub async fn await_processing<B: CatalogBackend>(
    backend: &B,
    filename: &str,
    interval: Duration,
    max_attempts: u32,
) -> Result<UploadStatus, SyncError> {
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let status = backend.upload_status(filename).await?;
        match status.status {
            ProcessingStatus::Ready | ProcessingStatus::Done => {
                debug!(filename, attempt, "processing finished");
                return Ok(status);
            }
            ProcessingStatus::Error => {
                return Err(SyncError::ProcessingFailed(
                    status
                        .error
                        .unwrap_or_else(|| "processing failed".to_string()),
                ));
            }
            ProcessingStatus::Processing | ProcessingStatus::Unknown => {
                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
    warn!(filename, attempts = max_attempts, "processing poll timed out");
    Err(SyncError::ProcessingTimeout {
        attempts: max_attempts,
    })
}
