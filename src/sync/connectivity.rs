//! Online/offline detection for the remote table server.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::gateway::remote::base_url;

/// Returns true if `GET /health` answers with a success status within
/// `timeout`.
pub async fn check_server(client: &reqwest::Client, server_url: &str, timeout: Duration) -> bool {
    let url = format!("{}/health", base_url(server_url));
    match client.get(&url).timeout(timeout).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::debug!("health check {} failed: {}", url, e);
            false
        }
    }
}

/// Periodically probes the server and publishes online/offline transitions.
pub struct ConnectivityMonitor {
    server_url: String,
    interval: Duration,
    timeout: Duration,
    client: reqwest::Client,
}

impl ConnectivityMonitor {
    pub fn new(server_url: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            server_url: server_url.into(),
            interval,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Starts probing in a background task. The receiver starts out offline;
    /// the task stops once every receiver is dropped.
    pub fn spawn(self) -> (watch::Receiver<bool>, JoinHandle<()>) {
        let (sender, receiver) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let online = check_server(&self.client, &self.server_url, self.timeout).await;

                let changed = sender.send_if_modified(|current| {
                    if *current == online {
                        false
                    } else {
                        *current = online;
                        true
                    }
                });
                if changed {
                    tracing::info!(
                        "{} is {}",
                        self.server_url,
                        if online { "online" } else { "offline" }
                    );
                }
                if sender.is_closed() {
                    break;
                }
            }
        });

        (receiver, handle)
    }
}
