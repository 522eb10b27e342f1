//! HTTP client for the table API served by `agrofacil-server`.

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use super::{GatewayError, PersistenceGateway};
use crate::config::SyncConfig;
use crate::models::{BackendId, RecordKind, RecordPayload, StoredRecord};
use crate::sync::connectivity;

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

/// Gateway that keeps records on a remote table server.
#[derive(Clone)]
pub struct RemoteGateway {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

/// Normalizes a configured server URL: bare hosts get `http://`, trailing
/// slashes are dropped.
pub(crate) fn base_url(server_url: &str) -> String {
    let trimmed = server_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

impl RemoteGateway {
    /// Creates a new remote gateway with explicit parameters.
    pub fn new(server_url: String, api_key: String) -> Self {
        Self {
            server_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Creates a remote gateway from config.
    ///
    /// Returns an error if sync is not configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, GatewayError> {
        let server_url = config
            .server_url
            .clone()
            .ok_or(GatewayError::NotConfigured)?;
        let api_key = config.api_key.clone().ok_or(GatewayError::NotConfigured)?;

        Ok(Self::new(server_url, api_key))
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Probes `GET /health`.
    pub async fn is_reachable(&self, timeout: Duration) -> bool {
        connectivity::check_server(&self.client, &self.server_url, timeout).await
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", base_url(&self.server_url), path)
    }

    fn records_url(&self, kind: RecordKind) -> String {
        self.build_url(&format!("/records/{}", kind))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_decode() {
        GatewayError::Protocol(e.to_string())
    } else {
        GatewayError::Unavailable(e.to_string())
    }
}

async fn rejection(response: reqwest::Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        GatewayError::Rejected(status.to_string())
    } else {
        GatewayError::Rejected(format!("{}: {}", status, body))
    }
}

impl PersistenceGateway for RemoteGateway {
    async fn create(&self, payload: &RecordPayload) -> Result<BackendId, GatewayError> {
        let url = self.records_url(payload.data.kind());
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let created: CreatedResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(e.to_string()))?;
        Ok(BackendId(created.id))
    }

    async fn delete(&self, kind: RecordKind, id: &BackendId) -> Result<(), GatewayError> {
        let url = format!("{}/{}", self.records_url(kind), id);
        tracing::debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::debug!("{} {} was already absent on the server", kind, id);
                Ok(())
            }
            _ => Err(rejection(response).await),
        }
    }

    async fn list_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, GatewayError> {
        let url = self.records_url(kind);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let records: Vec<StoredRecord> = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(e.to_string()))?;

        if let Some(stray) = records.iter().find(|r| r.data.kind() != kind) {
            return Err(GatewayError::Protocol(format!(
                "listing {} returned a {} record",
                kind,
                stray.data.kind()
            )));
        }
        Ok(records)
    }
}
