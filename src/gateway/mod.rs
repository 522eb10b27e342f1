//! Persistence gateways: where records live once they leave the client.
//!
//! The store only depends on [`PersistenceGateway`]. Two backends ship with
//! the crate:
//! - [`SqliteGateway`]: a local SQLite table store
//! - [`RemoteGateway`]: an HTTP client for the `agrofacil-server` table API

#[cfg(test)]
pub mod memory;
pub(crate) mod remote;
mod sqlite;

pub use remote::RemoteGateway;
pub use sqlite::SqliteGateway;

use std::time::Duration;
use thiserror::Error;

use crate::config::{BackendKind, Config};
use crate::models::{BackendId, RecordKind, RecordPayload, StoredRecord};

/// Errors reported by a persistence gateway.
///
/// None of these are fatal: a failed create leaves the record unsynced and a
/// failed delete leaves it in place.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Sync not configured. Add sync.server_url and sync.api_key to config.")]
    NotConfigured,
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("gateway did not answer within {0:?}")]
    Timeout(Duration),
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("unexpected gateway response: {0}")]
    Protocol(String),
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        GatewayError::Storage(e.to_string())
    }
}

/// Create/read/delete contract of a record backend.
///
/// No transactional guarantees are assumed between calls.
#[allow(async_fn_in_trait)]
pub trait PersistenceGateway {
    /// Persists a record and returns the identity the backend assigned.
    async fn create(&self, payload: &RecordPayload) -> Result<BackendId, GatewayError>;

    /// Removes a record. Removing an id the backend no longer has succeeds.
    async fn delete(&self, kind: RecordKind, id: &BackendId) -> Result<(), GatewayError>;

    /// All records of a kind, in insertion order.
    async fn list_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, GatewayError>;
}

/// The gateway selected by configuration.
pub enum Gateway {
    Local(SqliteGateway),
    Remote(RemoteGateway),
}

impl Gateway {
    /// Opens the backend named by `config.backend`.
    pub async fn open(config: &Config) -> Result<Self, GatewayError> {
        match config.backend.value {
            BackendKind::Local => {
                let gateway = SqliteGateway::open(&config.database_path.value).await?;
                Ok(Gateway::Local(gateway))
            }
            BackendKind::Remote => Ok(Gateway::Remote(RemoteGateway::from_config(&config.sync)?)),
        }
    }

    /// Whether the backend can be reached right now. The local backend
    /// always can.
    pub async fn is_reachable(&self, timeout: Duration) -> bool {
        match self {
            Gateway::Local(_) => true,
            Gateway::Remote(remote) => remote.is_reachable(timeout).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Gateway::Local(_) => "local (SQLite)".to_string(),
            Gateway::Remote(remote) => format!("remote ({})", remote.server_url()),
        }
    }
}

impl PersistenceGateway for Gateway {
    async fn create(&self, payload: &RecordPayload) -> Result<BackendId, GatewayError> {
        match self {
            Gateway::Local(g) => g.create(payload).await,
            Gateway::Remote(g) => g.create(payload).await,
        }
    }

    async fn delete(&self, kind: RecordKind, id: &BackendId) -> Result<(), GatewayError> {
        match self {
            Gateway::Local(g) => g.delete(kind, id).await,
            Gateway::Remote(g) => g.delete(kind, id).await,
        }
    }

    async fn list_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, GatewayError> {
        match self {
            Gateway::Local(g) => g.list_all(kind).await,
            Gateway::Remote(g) => g.list_all(kind).await,
        }
    }
}
