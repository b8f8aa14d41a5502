#![forbid(unsafe_code)]

//! Wire types for the catalog backend.
//!
//! Every endpoint is a bare path segment appended to the configured base
//! URL. Item rows stay as raw JSON here; normalization happens in the core
//! crate so both backends feed identical data into the editor.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tagdeck_core::normalize;

/// A backend endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    AvailableItems,
    SelectedItems,
    UpdateSelectedOrder,
    UpdateItemLineage,
    UndoLastMove,
    ClearSelection,
    UploadStatus,
}

impl Endpoint {
    /// Path segment relative to the base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::AvailableItems => "available-items",
            Self::SelectedItems => "selected-items",
            Self::UpdateSelectedOrder => "update-selected-order",
            Self::UpdateItemLineage => "update-item-lineage",
            Self::UndoLastMove => "undo-last-move",
            Self::ClearSelection => "clear-selection",
            Self::UploadStatus => "upload-status",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// `GET available-items` / `GET selected-items`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}

/// `POST update-selected-order`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub order: Vec<String>,
}

/// `POST update-item-lineage`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRequest {
    pub item_name: String,
    pub lineage: String,
}

/// Acknowledgement shared by the mutating endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuccessResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// `POST undo-last-move`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub selected_items: Vec<String>,
    #[serde(default)]
    pub available_items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Processing state reported by `GET upload-status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Processing,
    Ready,
    Done,
    Error,
    /// Anything this client does not recognize; treated as still running.
    #[serde(other)]
    Unknown,
}

impl ProcessingStatus {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Ready | Self::Done)
    }
}

/// `GET upload-status?filename=`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadStatus {
    pub status: ProcessingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadStatus {
    #[must_use]
    pub fn new(status: ProcessingStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }
}

/// Extract item names from `selected-items` rows, keeping order.
///
/// Rows may be full item objects or bare name strings. Rows without a
/// usable name are dropped.
#[must_use]
pub fn names_from_rows(rows: &[Value]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| match row {
            Value::String(name) => {
                let name = name.trim();
                (!name.is_empty()).then(|| name.to_string())
            }
            Value::Object(map) => normalize::normalize_row(map).map(|record| record.name),
            _ => None,
        })
        .collect()
}
