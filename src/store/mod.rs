//! The client-side record store.
//!
//! Records are kept in memory, one ordered collection per kind, and pushed to
//! a [`PersistenceGateway`]. A record the gateway did not accept stays in the
//! store unsynced until a reconciliation pass succeeds.

mod snapshot;

pub use snapshot::{Snapshot, SnapshotError, SnapshotStorage};

use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::gateway::{GatewayError, PersistenceGateway};
use crate::models::{
    BackendId, Cost, Entry, LocalId, Product, RecordData, RecordDraft, RecordKind, RecordPayload,
    Sale, StoredRecord, ValidationError,
};

/// Upper bound on the number of records across all collections.
pub const MAX_RECORDS: usize = 999;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("record limit of {limit} reached")]
    Capacity { limit: usize },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("no {kind} with id {id}")]
    NotFound { kind: RecordKind, id: LocalId },
}

/// What happened to a new record after it was stored locally.
#[derive(Debug, Clone)]
pub enum Persistence {
    Synced(BackendId),
    Deferred(GatewayError),
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub kind: RecordKind,
    pub local_id: LocalId,
    pub persistence: Persistence,
}

impl CreateOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self.persistence, Persistence::Synced(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record was never synced; the gateway was not contacted.
    RemovedLocally,
    /// The gateway confirmed the delete.
    Removed,
}

/// Runs a gateway call, turning an elapsed deadline into [`GatewayError::Timeout`].
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(limit)),
    }
}

fn position<T>(entries: &[Entry<T>], id: LocalId) -> Option<usize> {
    entries.iter().position(|e| e.local_id == id)
}

fn payload_of<T: Clone>(entry: &Entry<T>, wrap: fn(T) -> RecordData) -> RecordPayload {
    RecordPayload {
        created_at: entry.created_at,
        data: wrap(entry.record.clone()),
    }
}

/// Rebuilds a collection from a gateway listing: synced records in gateway
/// order, keeping known local ids, followed by the unsynced local ones.
fn rebuild<T>(
    current: Vec<Entry<T>>,
    stored: Vec<StoredRecord>,
    next_local_id: &mut u64,
    extract: fn(RecordData) -> Option<T>,
) -> Vec<Entry<T>> {
    let mut known: HashMap<BackendId, LocalId> = current
        .iter()
        .filter_map(|e| e.backend_id.clone().map(|b| (b, e.local_id)))
        .collect();

    let mut rebuilt = Vec::with_capacity(stored.len());
    for record in stored {
        let Some(value) = extract(record.data) else {
            continue;
        };
        let local_id = known.remove(&record.id).unwrap_or_else(|| {
            let id = LocalId(*next_local_id);
            *next_local_id += 1;
            id
        });
        rebuilt.push(Entry {
            local_id,
            backend_id: Some(record.id),
            created_at: record.created_at,
            record: value,
        });
    }

    rebuilt.extend(current.into_iter().filter(|e| !e.is_synced()));
    rebuilt
}

pub struct RecordStore<G> {
    products: Vec<Entry<Product>>,
    costs: Vec<Entry<Cost>>,
    sales: Vec<Entry<Sale>>,
    next_local_id: u64,
    gateway: G,
    request_timeout: Duration,
}

impl<G: PersistenceGateway> RecordStore<G> {
    pub fn new(gateway: G, request_timeout: Duration) -> Self {
        Self {
            products: Vec::new(),
            costs: Vec::new(),
            sales: Vec::new(),
            next_local_id: 1,
            gateway,
            request_timeout,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn products(&self) -> &[Entry<Product>] {
        &self.products
    }

    pub fn costs(&self) -> &[Entry<Cost>] {
        &self.costs
    }

    pub fn sales(&self) -> &[Entry<Sale>] {
        &self.sales
    }

    /// Records of one kind, in collection order.
    pub fn list(&self, kind: RecordKind) -> Vec<Entry<RecordData>> {
        match kind {
            RecordKind::Product => self
                .products
                .iter()
                .map(|e| e.clone().map(RecordData::Product))
                .collect(),
            RecordKind::Cost => self
                .costs
                .iter()
                .map(|e| e.clone().map(RecordData::Cost))
                .collect(),
            RecordKind::Sale => self
                .sales
                .iter()
                .map(|e| e.clone().map(RecordData::Sale))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len() + self.costs.len() + self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a product with this name (case-insensitive) exists.
    pub fn has_product_named(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.products
            .iter()
            .any(|e| e.record.name.to_lowercase() == name)
    }

    /// Unsynced records as (kind, local id), products first, then costs,
    /// then sales.
    pub fn pending(&self) -> Vec<(RecordKind, LocalId)> {
        let products = self
            .products
            .iter()
            .filter(|e| !e.is_synced())
            .map(|e| (RecordKind::Product, e.local_id));
        let costs = self
            .costs
            .iter()
            .filter(|e| !e.is_synced())
            .map(|e| (RecordKind::Cost, e.local_id));
        let sales = self
            .sales
            .iter()
            .filter(|e| !e.is_synced())
            .map(|e| (RecordKind::Sale, e.local_id));
        products.chain(costs).chain(sales).collect()
    }

    /// Validates and stores a new record, then tries to persist it.
    ///
    /// The record is kept whether or not the gateway accepts it.
    pub async fn create(&mut self, draft: RecordDraft) -> Result<CreateOutcome, StoreError> {
        if self.len() >= MAX_RECORDS {
            return Err(StoreError::Capacity { limit: MAX_RECORDS });
        }

        let created_at = Utc::now();
        let data = draft.into_record(created_at)?;
        let kind = data.kind();
        let local_id = LocalId(self.next_local_id);
        self.next_local_id += 1;

        let payload = RecordPayload {
            created_at,
            data: data.clone(),
        };
        match data {
            RecordData::Product(record) => self.products.push(Entry {
                local_id,
                backend_id: None,
                created_at,
                record,
            }),
            RecordData::Cost(record) => self.costs.push(Entry {
                local_id,
                backend_id: None,
                created_at,
                record,
            }),
            RecordData::Sale(record) => self.sales.push(Entry {
                local_id,
                backend_id: None,
                created_at,
                record,
            }),
        }

        let result = with_timeout(self.request_timeout, self.gateway.create(&payload)).await;
        let persistence = match result {
            Ok(backend_id) => {
                tracing::debug!("{} {} persisted as {}", kind, local_id, backend_id);
                self.assign_backend_id(kind, local_id, backend_id.clone());
                Persistence::Synced(backend_id)
            }
            Err(e) => {
                tracing::warn!("{} {} saved locally only: {}", kind, local_id, e);
                Persistence::Deferred(e)
            }
        };

        Ok(CreateOutcome {
            kind,
            local_id,
            persistence,
        })
    }

    /// Deletes a record. Unsynced records are removed without contacting the
    /// gateway; synced ones are removed only after the gateway confirms.
    pub async fn delete(
        &mut self,
        kind: RecordKind,
        id: LocalId,
    ) -> Result<DeleteOutcome, StoreError> {
        let backend_id = self
            .backend_id(kind, id)
            .ok_or(StoreError::NotFound { kind, id })?;

        match backend_id {
            None => {
                self.remove(kind, id);
                tracing::debug!("{} {} removed locally", kind, id);
                Ok(DeleteOutcome::RemovedLocally)
            }
            Some(backend_id) => {
                with_timeout(self.request_timeout, self.gateway.delete(kind, &backend_id)).await?;
                self.remove(kind, id);
                tracing::debug!("{} {} ({}) deleted", kind, id, backend_id);
                Ok(DeleteOutcome::Removed)
            }
        }
    }

    /// Replaces the synced part of every collection with the gateway's
    /// listing. Returns the number of synced records.
    ///
    /// Nothing changes unless every listing succeeds.
    pub async fn hydrate(&mut self) -> Result<usize, StoreError> {
        let mut listings = Vec::with_capacity(RecordKind::ALL.len());
        for kind in RecordKind::ALL {
            let records = with_timeout(self.request_timeout, self.gateway.list_all(kind)).await?;
            listings.push(records);
        }
        let synced = listings.iter().map(Vec::len).sum();

        let mut listings = listings.into_iter();
        let mut next = self.next_local_id;

        let products = listings.next().unwrap_or_default();
        self.products = rebuild(
            std::mem::take(&mut self.products),
            products,
            &mut next,
            |data: RecordData| match data {
                RecordData::Product(p) => Some(p),
                _ => None,
            },
        );
        let costs = listings.next().unwrap_or_default();
        self.costs = rebuild(std::mem::take(&mut self.costs), costs, &mut next, |data: RecordData| {
            match data {
                RecordData::Cost(c) => Some(c),
                _ => None,
            }
        });
        let sales = listings.next().unwrap_or_default();
        self.sales = rebuild(std::mem::take(&mut self.sales), sales, &mut next, |data: RecordData| {
            match data {
                RecordData::Sale(s) => Some(s),
                _ => None,
            }
        });

        self.next_local_id = next;
        tracing::debug!("hydrated {} synced records", synced);
        Ok(synced)
    }

    /// Pushes one unsynced record to the gateway. A record that is already
    /// synced is not submitted again.
    pub(crate) async fn sync_entry(
        &mut self,
        kind: RecordKind,
        id: LocalId,
    ) -> Result<BackendId, StoreError> {
        let (payload, backend_id) = self
            .payload(kind, id)
            .ok_or(StoreError::NotFound { kind, id })?;
        if let Some(backend_id) = backend_id {
            return Ok(backend_id);
        }

        let backend_id = with_timeout(self.request_timeout, self.gateway.create(&payload)).await?;
        self.assign_backend_id(kind, id, backend_id.clone());
        Ok(backend_id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_local_id: self.next_local_id,
            products: self.products.clone(),
            costs: self.costs.clone(),
            sales: self.sales.clone(),
        }
    }

    /// Replaces the store contents with a snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let highest = snapshot
            .products
            .iter()
            .map(|e| e.local_id.0)
            .chain(snapshot.costs.iter().map(|e| e.local_id.0))
            .chain(snapshot.sales.iter().map(|e| e.local_id.0))
            .max()
            .unwrap_or(0);

        self.next_local_id = snapshot.next_local_id.max(highest + 1);
        self.products = snapshot.products;
        self.costs = snapshot.costs;
        self.sales = snapshot.sales;
    }

    fn backend_id(&self, kind: RecordKind, id: LocalId) -> Option<Option<BackendId>> {
        match kind {
            RecordKind::Product => position(&self.products, id)
                .map(|i| self.products[i].backend_id.clone()),
            RecordKind::Cost => position(&self.costs, id).map(|i| self.costs[i].backend_id.clone()),
            RecordKind::Sale => position(&self.sales, id).map(|i| self.sales[i].backend_id.clone()),
        }
    }

    fn payload(
        &self,
        kind: RecordKind,
        id: LocalId,
    ) -> Option<(RecordPayload, Option<BackendId>)> {
        match kind {
            RecordKind::Product => position(&self.products, id).map(|i| {
                let entry = &self.products[i];
                (payload_of(entry, RecordData::Product), entry.backend_id.clone())
            }),
            RecordKind::Cost => position(&self.costs, id).map(|i| {
                let entry = &self.costs[i];
                (payload_of(entry, RecordData::Cost), entry.backend_id.clone())
            }),
            RecordKind::Sale => position(&self.sales, id).map(|i| {
                let entry = &self.sales[i];
                (payload_of(entry, RecordData::Sale), entry.backend_id.clone())
            }),
        }
    }

    fn assign_backend_id(&mut self, kind: RecordKind, id: LocalId, backend_id: BackendId) {
        let slot = match kind {
            RecordKind::Product => position(&self.products, id)
                .map(|i| &mut self.products[i].backend_id),
            RecordKind::Cost => position(&self.costs, id).map(|i| &mut self.costs[i].backend_id),
            RecordKind::Sale => position(&self.sales, id).map(|i| &mut self.sales[i].backend_id),
        };
        if let Some(slot) = slot {
            *slot = Some(backend_id);
        }
    }

    fn remove(&mut self, kind: RecordKind, id: LocalId) {
        match kind {
            RecordKind::Product => self.products.retain(|e| e.local_id != id),
            RecordKind::Cost => self.costs.retain(|e| e.local_id != id),
            RecordKind::Sale => self.sales.retain(|e| e.local_id != id),
        }
    }
}
