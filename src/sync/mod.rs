//! Keeping the local store and its backend in step.
//!
//! - [`connectivity`]: health probing and online/offline transitions
//! - [`SyncReconciler`]: pushes unsynced records when the backend is reachable

pub mod connectivity;
mod reconciler;

pub use connectivity::{check_server, ConnectivityMonitor};
pub use reconciler::{ReconcileReport, ReconcileSummary, SyncReconciler};
