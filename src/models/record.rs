use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Cost, Product, Sale, ValidationError};

/// The three record collections kept by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Product,
    Cost,
    Sale,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Product, RecordKind::Cost, RecordKind::Sale];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Product => "product",
            RecordKind::Cost => "cost",
            RecordKind::Sale => "sale",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product" => Ok(RecordKind::Product),
            "cost" => Ok(RecordKind::Cost),
            "sale" => Ok(RecordKind::Sale),
            _ => Err(format!(
                "Invalid record kind '{}'. Valid options: product, cost, sale",
                s
            )),
        }
    }
}

/// Client-side identity, assigned by the store in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity assigned by the persistence gateway after a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(pub String);

impl BackendId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record held by the store, wrapped with its identities.
///
/// A record is synced exactly when it carries a backend id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub local_id: LocalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_id: Option<BackendId>,
    pub created_at: DateTime<Utc>,
    pub record: T,
}

impl<T> Entry<T> {
    pub fn is_synced(&self) -> bool {
        self.backend_id.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Entry<U> {
        Entry {
            local_id: self.local_id,
            backend_id: self.backend_id,
            created_at: self.created_at,
            record: f(self.record),
        }
    }
}

/// Any record, tagged with its kind. This is the gateway's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordData {
    Product(Product),
    Cost(Cost),
    Sale(Sale),
}

impl RecordData {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordData::Product(_) => RecordKind::Product,
            RecordData::Cost(_) => RecordKind::Cost,
            RecordData::Sale(_) => RecordKind::Sale,
        }
    }

    /// Checks the field rules shared by local creation and the table server.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            RecordData::Product(p) => p.validate(),
            RecordData::Cost(c) => c.validate(),
            RecordData::Sale(s) => s.validate(),
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::Product(p) => write!(f, "{}", p),
            RecordData::Cost(c) => write!(f, "{}", c),
            RecordData::Sale(s) => write!(f, "{}", s),
        }
    }
}

/// A record as submitted to the gateway for creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: RecordData,
}

/// A record as returned by the gateway's listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: BackendId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: RecordData,
}
