use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::SyncConfig;
use crate::gateway::PersistenceGateway;
use crate::store::RecordStore;

/// Counts for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Totals over every pass of [`SyncReconciler::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub passes: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Pushes unsynced records to the gateway.
pub struct SyncReconciler {
    auto_sync: bool,
    backoff: Duration,
}

impl SyncReconciler {
    pub fn new(auto_sync: bool, backoff: Duration) -> Self {
        Self { auto_sync, backoff }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.auto_sync, config.retry_backoff())
    }

    pub fn auto_sync(&self) -> bool {
        self.auto_sync
    }

    /// Runs one pass: a single create attempt per unsynced record.
    ///
    /// Runs regardless of `auto_sync`; this is what a manual sync calls.
    pub async fn reconcile<G: PersistenceGateway>(
        &self,
        store: &mut RecordStore<G>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (kind, id) in store.pending() {
            report.attempted += 1;
            match store.sync_entry(kind, id).await {
                Ok(backend_id) => {
                    tracing::debug!("{} {} synced as {}", kind, id, backend_id);
                    report.synced += 1;
                }
                Err(e) => {
                    tracing::debug!("{} {} still unsynced: {}", kind, id, e);
                    report.failed += 1;
                }
            }
        }

        if report.attempted > 0 {
            tracing::info!(
                "reconciled {} of {} unsynced records ({} failed)",
                report.synced,
                report.attempted,
                report.failed
            );
        }
        report
    }

    /// Reacts to a connectivity signal. Only runs a pass when the backend is
    /// online and `auto_sync` is on.
    pub async fn on_connectivity<G: PersistenceGateway>(
        &self,
        store: &mut RecordStore<G>,
        online: bool,
    ) -> Option<ReconcileReport> {
        if !online || !self.auto_sync {
            return None;
        }
        Some(self.reconcile(store).await)
    }

    /// Consumes connectivity events until the sender goes away.
    ///
    /// Events that arrive during a pass collapse into one follow-up pass.
    /// After a pass with failures the reconciler sleeps for the backoff and,
    /// if still online, tries again.
    pub async fn run<G: PersistenceGateway>(
        &self,
        store: &mut RecordStore<G>,
        mut events: watch::Receiver<bool>,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        loop {
            let online = *events.borrow_and_update();
            if let Some(report) = self.on_connectivity(store, online).await {
                summary.passes += 1;
                summary.synced += report.synced;
                summary.failed += report.failed;

                if report.failed > 0 {
                    tokio::time::sleep(self.backoff).await;
                    if events.has_changed().is_err() {
                        break;
                    }
                    continue;
                }
            }

            if events.changed().await.is_err() {
                break;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::models::{BackendId, CostDraft, ProductDraft, RecordDraft, RecordKind};

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn store_with_unsynced(count: usize) -> (RecordStore<MemoryGateway>, MemoryGateway) {
        let gateway = MemoryGateway::offline();
        let mut store = RecordStore::new(gateway.clone(), TIMEOUT);
        for i in 0..count {
            store
                .create(RecordDraft::Product(ProductDraft::new(format!("P{}", i))))
                .await
                .unwrap();
        }
        gateway.set_online(true);
        (store, gateway)
    }

    #[tokio::test]
    async fn test_unsynced_product_is_synced_exactly_once() {
        let (mut store, gateway) = store_with_unsynced(1).await;
        assert!(!store.products()[0].is_synced());
        let calls_before = gateway.create_calls();

        let reconciler = SyncReconciler::new(true, Duration::from_millis(10));
        let first = reconciler.reconcile(&mut store).await;
        assert_eq!(
            first,
            ReconcileReport {
                attempted: 1,
                synced: 1,
                failed: 0
            }
        );
        assert!(store.products()[0].is_synced());

        let second = reconciler.reconcile(&mut store).await;
        assert_eq!(second.attempted, 0);
        assert_eq!(gateway.create_calls(), calls_before + 1);
        assert_eq!(gateway.records(RecordKind::Product).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_records_wait_for_next_pass() {
        let (mut store, gateway) = store_with_unsynced(2).await;
        gateway.fail_creates(true);

        let reconciler = SyncReconciler::new(true, Duration::from_millis(10));
        let report = reconciler.reconcile(&mut store).await;
        assert_eq!(report.failed, 2);
        assert_eq!(store.pending().len(), 2);

        gateway.fail_creates(false);
        let report = reconciler.reconcile(&mut store).await;
        assert_eq!(report.synced, 2);
        assert!(store.pending().is_empty());
    }

    #[tokio::test]
    async fn test_pending_order_is_products_then_costs() {
        let gateway = MemoryGateway::offline();
        let mut store = RecordStore::new(gateway.clone(), TIMEOUT);
        store
            .create(RecordDraft::Cost(CostDraft::new(10.0)))
            .await
            .unwrap();
        store
            .create(RecordDraft::Product(ProductDraft::new("Milho")))
            .await
            .unwrap();
        gateway.set_online(true);

        SyncReconciler::new(true, Duration::ZERO)
            .reconcile(&mut store)
            .await;
        // Products are submitted first, so they get the lower ids.
        let product_ids: Vec<BackendId> = gateway
            .records(RecordKind::Product)
            .into_iter()
            .map(|r| r.id)
            .collect();
        let cost_ids: Vec<BackendId> = gateway
            .records(RecordKind::Cost)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(product_ids, vec![BackendId("mem-1".to_string())]);
        assert_eq!(cost_ids, vec![BackendId("mem-2".to_string())]);
    }

    #[tokio::test]
    async fn test_connectivity_event_respects_auto_sync() {
        let (mut store, gateway) = store_with_unsynced(1).await;
        let calls_before = gateway.create_calls();

        let disabled = SyncReconciler::new(false, Duration::ZERO);
        assert!(disabled.on_connectivity(&mut store, true).await.is_none());
        assert_eq!(gateway.create_calls(), calls_before);

        let enabled = SyncReconciler::new(true, Duration::ZERO);
        assert!(enabled.on_connectivity(&mut store, false).await.is_none());
        let report = enabled.on_connectivity(&mut store, true).await.unwrap();
        assert_eq!(report.synced, 1);
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_is_dropped() {
        let (mut store, _gateway) = store_with_unsynced(1).await;
        let (sender, receiver) = watch::channel(true);
        drop(sender);

        let summary = SyncReconciler::new(true, Duration::ZERO)
            .run(&mut store, receiver)
            .await;
        assert_eq!(summary.passes, 1);
        assert_eq!(summary.synced, 1);
        assert!(store.pending().is_empty());
    }

    #[tokio::test]
    async fn test_events_during_a_pass_coalesce() {
        let (mut store, gateway) = store_with_unsynced(1).await;
        gateway.set_delay(Duration::from_millis(100));
        let (sender, receiver) = watch::channel(false);
        let reconciler = SyncReconciler::new(true, Duration::ZERO);

        let events = async move {
            sender.send(true).unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            // Pass in flight: these collapse into a single follow-up.
            sender.send(false).unwrap();
            sender.send(true).unwrap();
            sender.send(false).unwrap();
            sender.send(true).unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
        };

        let (summary, ()) = tokio::join!(reconciler.run(&mut store, receiver), events);
        assert_eq!(summary.passes, 2);
        assert_eq!(summary.synced, 1);
        assert_eq!(gateway.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_run_retries_after_backoff() {
        let (mut store, gateway) = store_with_unsynced(1).await;
        gateway.fail_creates(true);
        let (sender, receiver) = watch::channel(true);
        let reconciler = SyncReconciler::new(true, Duration::from_millis(30));

        let heal = {
            let gateway = gateway.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(45)).await;
                gateway.fail_creates(false);
                tokio::time::sleep(Duration::from_millis(100)).await;
                drop(sender);
            }
        };

        let (summary, ()) = tokio::join!(reconciler.run(&mut store, receiver), heal);
        assert!(summary.failed >= 1);
        assert_eq!(summary.synced, 1);
        assert!(store.pending().is_empty());
    }
}
