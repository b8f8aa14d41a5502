#![forbid(unsafe_code)]

//! JSON-over-HTTP backend.

use std::fmt;

use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::backend::CatalogBackend;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::wire::{
    Endpoint, ItemsResponse, LineageRequest, SuccessResponse, UndoResponse, UpdateOrderRequest,
    UploadStatus,
};

/// Talks to the catalog service over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client with the configured timeout.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }

    async fn get<R: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> Result<R, SyncError> {
        let response = self.client.get(self.url(endpoint)).query(query).send().await?;
        read_json(endpoint, response).await
    }

    async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &T,
    ) -> Result<R, SyncError> {
        let response = self.client.post(self.url(endpoint)).json(body).send().await?;
        read_json(endpoint, response).await
    }

    async fn acknowledge<T: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: &T,
    ) -> Result<(), SyncError> {
        let ack: SuccessResponse = self.post(endpoint, body).await?;
        check_success(endpoint, ack.success, ack.error)
    }
}

async fn read_json<R: DeserializeOwned>(endpoint: Endpoint, response: Response) -> Result<R, SyncError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(%endpoint, status = status.as_u16(), "backend returned error status");
        return Err(SyncError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

fn check_success(endpoint: Endpoint, success: bool, error: Option<String>) -> Result<(), SyncError> {
    if success {
        return Ok(());
    }
    Err(SyncError::Rejected {
        endpoint,
        message: error.unwrap_or_else(|| "backend reported failure".to_string()),
    })
}

impl CatalogBackend for HttpBackend {
    fn name(&self) -> &str {
        "HttpBackend"
    }

    async fn available_items(&self) -> Result<Vec<Value>, SyncError> {
        let response: ItemsResponse = self.get(Endpoint::AvailableItems, &[]).await?;
        Ok(response.items)
    }

    async fn selected_items(&self) -> Result<Vec<Value>, SyncError> {
        let response: ItemsResponse = self.get(Endpoint::SelectedItems, &[]).await?;
        Ok(response.items)
    }

    async fn update_selected_order(&self, order: &[String]) -> Result<(), SyncError> {
        let request = UpdateOrderRequest {
            order: order.to_vec(),
        };
        self.acknowledge(Endpoint::UpdateSelectedOrder, &request).await
    }

    async fn update_item_lineage(&self, item_name: &str, lineage: &str) -> Result<(), SyncError> {
        let request = LineageRequest {
            item_name: item_name.to_string(),
            lineage: lineage.to_string(),
        };
        self.acknowledge(Endpoint::UpdateItemLineage, &request).await
    }

    async fn undo_last_move(&self) -> Result<UndoResponse, SyncError> {
        let mut response: UndoResponse = self
            .post(Endpoint::UndoLastMove, &serde_json::json!({}))
            .await?;
        check_success(Endpoint::UndoLastMove, response.success, response.error.take())?;
        Ok(response)
    }

    async fn clear_selection(&self) -> Result<(), SyncError> {
        self.acknowledge(Endpoint::ClearSelection, &serde_json::json!({}))
            .await
    }

    async fn upload_status(&self, filename: &str) -> Result<UploadStatus, SyncError> {
        self.get(Endpoint::UploadStatus, &[("filename", filename)])
            .await
    }
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
