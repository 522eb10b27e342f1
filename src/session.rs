//! One CLI invocation's worth of state: config, store, snapshot and
//! reconciler, wired together.

use thiserror::Error;
use tokio::sync::watch;

use crate::config::Config;
use crate::gateway::{Gateway, GatewayError};
use crate::store::{RecordStore, SnapshotError, SnapshotStorage, StoreError};
use crate::sync::{ConnectivityMonitor, ReconcileReport, ReconcileSummary, SyncReconciler};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub struct Session {
    pub config: Config,
    pub store: RecordStore<Gateway>,
    reconciler: SyncReconciler,
    snapshots: SnapshotStorage,
    online: bool,
}

impl Session {
    /// Opens the configured backend and restores the last snapshot.
    pub async fn open(config: Config) -> Result<Self, SessionError> {
        let gateway = Gateway::open(&config).await?;
        let mut store = RecordStore::new(gateway, config.sync.request_timeout());

        let snapshots = SnapshotStorage::new(config.data_dir.value.clone());
        if let Some(snapshot) = snapshots.load()? {
            store.restore(snapshot);
        }

        let reconciler = SyncReconciler::from_config(&config.sync);
        Ok(Self {
            config,
            store,
            reconciler,
            snapshots,
            online: false,
        })
    }

    /// Result of the last connectivity probe.
    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn auto_sync(&self) -> bool {
        self.reconciler.auto_sync()
    }

    pub async fn probe(&mut self) -> bool {
        self.online = self
            .store
            .gateway()
            .is_reachable(self.config.sync.request_timeout())
            .await;
        self.online
    }

    /// Probes the backend and, if it is reachable and auto-sync is on,
    /// pushes unsynced records and refreshes from the backend.
    ///
    /// Failures are logged and never stop the command that follows.
    pub async fn try_auto_sync(&mut self) -> Option<ReconcileReport> {
        if !self.probe().await {
            tracing::warn!("{} unreachable, working offline", self.store.gateway().describe());
            return None;
        }

        let report = self
            .reconciler
            .on_connectivity(&mut self.store, self.online)
            .await?;
        if let Err(e) = self.store.hydrate().await {
            tracing::warn!("could not refresh records: {}", e);
        }
        Some(report)
    }

    /// A manual sync: runs a pass whatever the `auto_sync` setting, then
    /// refreshes from the backend.
    pub async fn sync_now(&mut self) -> Result<ReconcileReport, SessionError> {
        if !self.probe().await {
            return Err(GatewayError::Unavailable(self.store.gateway().describe()).into());
        }

        let report = self.reconciler.reconcile(&mut self.store).await;
        self.store.hydrate().await?;
        Ok(report)
    }

    /// Reconciles on every connectivity change until Ctrl-C.
    pub async fn watch(&mut self) -> ReconcileSummary {
        let (sender, receiver) = watch::channel(false);

        let forwarder = match self.store.gateway() {
            Gateway::Local(_) => {
                let _ = sender.send(true);
                tokio::spawn(async move {
                    let _ = tokio::signal::ctrl_c().await;
                    drop(sender);
                })
            }
            Gateway::Remote(remote) => {
                let monitor = ConnectivityMonitor::new(
                    remote.server_url(),
                    self.config.sync.probe_interval(),
                    self.config.sync.request_timeout(),
                );
                let (mut probes, probe_task) = monitor.spawn();
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            changed = probes.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                                let online = *probes.borrow_and_update();
                                if sender.send(online).is_err() {
                                    break;
                                }
                            }
                            _ = tokio::signal::ctrl_c() => break,
                        }
                    }
                    probe_task.abort();
                })
            }
        };

        let summary = self.reconciler.run(&mut self.store, receiver).await;
        let _ = forwarder.await;
        summary
    }

    /// Writes the store to the snapshot file.
    pub fn save(&self) -> Result<(), SessionError> {
        self.snapshots.save(&self.store.snapshot())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendKind, ConfigSource, ConfigValue, SyncConfig};
    use crate::models::{ProductDraft, RecordDraft};
    use std::path::Path;
    use tempfile::TempDir;

    fn local_config(dir: &Path) -> Config {
        Config {
            data_dir: ConfigValue::new(dir.to_path_buf(), ConfigSource::Default),
            database_path: ConfigValue::new(dir.join("agrofacil.db"), ConfigSource::Default),
            backend: ConfigValue::new(BackendKind::Local, ConfigSource::Default),
            config_file: None,
            sync: SyncConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_local_session_roundtrip() {
        let temp_dir = TempDir::new().unwrap();

        let mut session = Session::open(local_config(temp_dir.path())).await.unwrap();
        assert!(session.try_auto_sync().await.is_some());
        let outcome = session
            .store
            .create(RecordDraft::Product(ProductDraft::new("Milho")))
            .await
            .unwrap();
        assert!(outcome.is_synced());
        session.save().unwrap();

        let mut reopened = Session::open(local_config(temp_dir.path())).await.unwrap();
        assert_eq!(reopened.store.products().len(), 1);
        reopened.try_auto_sync().await;
        assert_eq!(reopened.store.products().len(), 1);
        assert_eq!(reopened.store.products()[0].local_id, outcome.local_id);
    }

    #[tokio::test]
    async fn test_remote_backend_requires_sync_settings() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = local_config(temp_dir.path());
        config.backend = ConfigValue::new(BackendKind::Remote, ConfigSource::File);

        let result = Session::open(config).await;
        assert!(matches!(
            result,
            Err(SessionError::Gateway(GatewayError::NotConfigured))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_remote_defers_records() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = local_config(temp_dir.path());
        config.backend = ConfigValue::new(BackendKind::Remote, ConfigSource::File);
        config.sync.server_url = Some("http://127.0.0.1:9".to_string());
        config.sync.api_key = Some("key".to_string());
        config.sync.request_timeout_secs = 1;

        let mut session = Session::open(config).await.unwrap();
        assert!(session.try_auto_sync().await.is_none());
        assert!(!session.is_online());

        let outcome = session
            .store
            .create(RecordDraft::Product(ProductDraft::new("Milho")))
            .await
            .unwrap();
        assert!(!outcome.is_synced());
        assert_eq!(session.store.pending().len(), 1);
        assert!(session.sync_now().await.is_err());
    }
}
