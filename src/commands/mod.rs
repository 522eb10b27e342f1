mod config_cmd;
mod cost;
mod product;
mod report;
mod sale;
mod sync_cmd;

pub use config_cmd::ConfigCommand;
pub use cost::CostCommand;
pub use product::ProductCommand;
pub use report::ReportCommand;
pub use sale::SaleCommand;
pub use sync_cmd::SyncCommand;

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, Write};

use agrofacil::models::{Entry, LocalId, RecordKind};
use agrofacil::session::Session;
use agrofacil::store::{CreateOutcome, DeleteOutcome, Persistence};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A listed record with its derived sync flag, for JSON output.
#[derive(Serialize)]
struct Listed<'a, T> {
    #[serde(flatten)]
    entry: &'a Entry<T>,
    synced: bool,
}

pub(crate) fn print_json_list<T: Serialize>(entries: &[Entry<T>]) -> serde_json::Result<()> {
    let listed: Vec<Listed<'_, T>> = entries
        .iter()
        .map(|entry| Listed {
            entry,
            synced: entry.is_synced(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&listed)?);
    Ok(())
}

pub(crate) fn sync_mark<T>(entry: &Entry<T>) -> &'static str {
    if entry.is_synced() {
        "yes"
    } else {
        "no"
    }
}

pub(crate) fn print_created(session: &Session, outcome: &CreateOutcome) {
    let record = session
        .store
        .list(outcome.kind)
        .into_iter()
        .find(|e| e.local_id == outcome.local_id);
    if let Some(entry) = record {
        println!("Created {} {}:", outcome.kind, outcome.local_id);
        println!("  {}", entry.record);
    }

    match &outcome.persistence {
        Persistence::Synced(_) => println!("Saved and synced."),
        Persistence::Deferred(e) => {
            println!("Saved locally, will sync later.");
            eprintln!("  ({})", e);
        }
    }
}

pub(crate) async fn delete_record(
    session: &mut Session,
    kind: RecordKind,
    id: u64,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = LocalId(id);
    let entry = session
        .store
        .list(kind)
        .into_iter()
        .find(|e| e.local_id == id)
        .ok_or_else(|| format!("{} not found: {}", kind, id))?;

    // Confirm deletion unless --force is used
    if !force {
        print!("Delete {} '{}'? [y/N] ", kind, entry.record);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    match session.store.delete(kind, id).await? {
        DeleteOutcome::Removed => println!("Deleted {}: {}", kind, entry.record),
        DeleteOutcome::RemovedLocally => {
            println!("Deleted {} (never synced): {}", kind, entry.record)
        }
    }
    Ok(())
}
