//! Sync CLI commands for pushing unsynced records to the backend.

use clap::{Args, Subcommand};
use serde::Serialize;

use agrofacil::config::Config;
use agrofacil::session::Session;

use super::OutputFormat;

/// Sync with the configured backend
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Show backend, server status and pending records
    Status {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Keep syncing whenever the server comes back online (Ctrl-C to stop)
    Watch,
}

#[derive(Serialize)]
struct StatusReport {
    backend: String,
    online: bool,
    auto_sync: bool,
    pending: usize,
    records: usize,
}

impl SyncCommand {
    pub async fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.sync(session).await,
            Some(SyncSubcommand::Status { format }) => self.status(session, format).await,
            Some(SyncSubcommand::Watch) => self.watch(session).await,
        }
    }

    async fn sync(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        println!("Syncing with {}...", session.store.gateway().describe());
        println!();

        let report = session.sync_now().await?;

        if report.attempted == 0 {
            println!("  ✓ nothing pending");
        } else {
            println!("  ✓ synced {} record(s)", report.synced);
            if report.failed > 0 {
                println!("  ✗ {} record(s) still pending", report.failed);
            }
        }

        println!();
        println!("Sync complete. {} record(s) in store.", session.store.len());
        Ok(())
    }

    async fn status(
        &self,
        session: &mut Session,
        format: &OutputFormat,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let online = session.probe().await;
        let status = StatusReport {
            backend: session.store.gateway().describe(),
            online,
            auto_sync: session.auto_sync(),
            pending: session.store.pending().len(),
            records: session.store.len(),
        };

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            OutputFormat::Text => {
                println!("Sync Status");
                println!("===========");
                println!();
                println!("Backend:   {}", status.backend);
                println!(
                    "Server:    {}",
                    if status.online {
                        "✓ reachable"
                    } else {
                        "✗ unreachable"
                    }
                );
                println!(
                    "Auto-sync: {}",
                    if status.auto_sync {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
                println!("Pending:   {} of {} record(s)", status.pending, status.records);

                if !session.config.sync.is_configured() {
                    print_setup_hint(&session.config);
                }
            }
        }
        Ok(())
    }

    async fn watch(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        if !session.auto_sync() {
            return Err("auto_sync is disabled; enable it or run `agro sync` instead".into());
        }

        println!(
            "Watching {} (Ctrl-C to stop)...",
            session.store.gateway().describe()
        );
        let summary = session.watch().await;

        println!();
        println!(
            "Stopped after {} pass(es): {} synced, {} failed attempt(s).",
            summary.passes, summary.synced, summary.failed
        );
        Ok(())
    }
}

fn print_setup_hint(config: &Config) {
    println!();
    println!("Remote sync is not configured (backend: {}).", config.backend.value);
    println!("To use a remote server, add to your config file:");
    println!();
    println!("  backend: remote");
    println!("  sync:");
    println!("    server_url: \"http://localhost:8080\"");
    println!("    api_key: \"your-api-key\"");
    println!();
    println!("Or set environment variables:");
    println!("  AGRO_BACKEND=remote");
    println!("  AGRO_SYNC_URL");
    println!("  AGRO_SYNC_API_KEY");
}
