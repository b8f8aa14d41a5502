#![forbid(unsafe_code)]

//! Network-boundary errors.
//!
//! These are the only faults surfaced to the user, and always non-fatally:
//! local state stays the working truth when any of them occurs.

use tagdeck_state::LineageError;

use crate::wire::Endpoint;

/// Failure talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server error: HTTP {status} - {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: Endpoint, message: String },

    #[error("invalid input: {0}")]
    Validation(#[from] LineageError),

    #[error("processing did not finish after {attempts} polls")]
    ProcessingTimeout { attempts: u32 },

    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl SyncError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Http(_) | SyncError::Unavailable(_) | SyncError::ProcessingTimeout { .. } => true,
            SyncError::Status { status, .. } => *status >= 500,
            SyncError::Json(_)
            | SyncError::Rejected { .. }
            | SyncError::Validation(_)
            | SyncError::ProcessingFailed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_endpoint() {
        let err = SyncError::Rejected {
            endpoint: Endpoint::UpdateItemLineage,
            message: "no such item".into(),
        };
        assert_eq!(
            err.to_string(),
            "update-item-lineage rejected the request: no such item"
        );
    }

    #[test]
    fn transience() {
        assert!(SyncError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!SyncError::Status { status: 400, body: String::new() }.is_transient());
        assert!(!SyncError::Validation(LineageError::Empty { field: "lineage" }).is_transient());
    }
}
