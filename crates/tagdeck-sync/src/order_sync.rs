#![forbid(unsafe_code)]

//! Order persistence with retry-on-next-mutation.
//!
//! # Design
//!
//! The local order is the working truth. A failed persist is logged and
//! remembered, never rolled back. Every later selection change persists the
//! order current at that moment, which supersedes the failed one; a mutation
//! that changes nothing calls [`OrderSyncClient::sync_if_needed`] instead.
//! There is no background retry loop.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Transport or status error | `needs_retry` set, error returned |
//! | `success: false` | Same as above |
//! | Retry fails again | Flag stays set; latest error replaces the old one |

use tracing::{Instrument, debug, debug_span, warn};

use crate::backend::CatalogBackend;
use crate::error::SyncError;

/// Sends the flat selection order to the backend.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderSyncClient {
    needs_retry: bool,
    last_error: Option<String>,
    last_synced: Option<Vec<String>>,
    failures: u64,
}

impl OrderSyncClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last persist failed and has not been superseded.
    #[must_use]
    pub fn needs_retry(&self) -> bool {
        self.needs_retry
    }

    /// Message of the most recent unresolved failure.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The last order the backend acknowledged.
    #[must_use]
    pub fn last_synced(&self) -> Option<&[String]> {
        self.last_synced.as_deref()
    }

    /// Total failed persists since creation.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Persist `order` (wire names).
    pub async fn persist<B: CatalogBackend>(
        &mut self,
        backend: &B,
        order: &[String],
    ) -> Result<(), SyncError> {
        let span = debug_span!("order_sync", backend = backend.name(), len = order.len());
        match backend.update_selected_order(order).instrument(span).await {
            Ok(()) => {
                debug!(len = order.len(), "selection order persisted");
                self.needs_retry = false;
                self.last_error = None;
                self.last_synced = Some(order.to_vec());
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, len = order.len(), "failed to persist selection order");
                self.needs_retry = true;
                self.last_error = Some(err.to_string());
                self.failures += 1;
                Err(err)
            }
        }
    }

    /// Retry with the current order if an earlier persist failed.
    ///
    /// Returns `None` when nothing was pending.
    pub async fn sync_if_needed<B: CatalogBackend>(
        &mut self,
        backend: &B,
        order: &[String],
    ) -> Option<Result<(), SyncError>> {
        if !self.needs_retry {
            return None;
        }
        debug!(len = order.len(), "retrying order sync with latest order");
        Some(self.persist(backend, order).await)
    }
}
