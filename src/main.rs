use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use agrofacil::config::Config;
use agrofacil::session::Session;
use commands::{
    ConfigCommand, CostCommand, ProductCommand, ReportCommand, SaleCommand, SyncCommand,
};

#[derive(Parser)]
#[command(name = "agro")]
#[command(version)]
#[command(about = "Bookkeeping for small farms", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products
    Product(ProductCommand),

    /// Manage costs
    Cost(CostCommand),

    /// Manage sales
    Sale(SaleCommand),

    /// Totals and profit for a period
    Report(ReportCommand),

    /// Sync unsynced records with the backend
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrofacil=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let mut session = Session::open(config).await?;

    // Sync commands drive syncing themselves
    if !matches!(command, Commands::Sync(_)) {
        if let Some(report) = session.try_auto_sync().await {
            if report.synced > 0 {
                eprintln!("Auto-sync: synced {} pending record(s)", report.synced);
            }
        }
    }

    let result = match &command {
        Commands::Product(cmd) => cmd.run(&mut session).await,
        Commands::Cost(cmd) => cmd.run(&mut session).await,
        Commands::Sale(cmd) => cmd.run(&mut session).await,
        Commands::Report(cmd) => cmd.run(&session),
        Commands::Sync(cmd) => cmd.run(&mut session).await,
        Commands::Config(cmd) => cmd.run(&session.config),
    };

    // Records created offline must survive a failed command too
    session.save()?;
    result
}
