//! AgroFácil table server
//!
//! Stores products, costs and sales for `agro` clients configured with
//! `backend: remote`.
//!
//! # Configuration
//!
//! Environment variables:
//! - `AGRO_SERVER_PORT`: Port to listen on (default: 8080)
//! - `AGRO_SERVER_DATA_DIR`: Directory for the database (default: ~/.local/share/agrofacil-server)
//! - `AGRO_SERVER_CONFIG`: Path to config file (default: ~/.config/agrofacil-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     user_id: "farm1"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agrofacil::gateway::SqliteGateway;
use agrofacil::server::{router, ApiKeyStore, AppState};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory for the SQLite database
    data_dir: PathBuf,
    /// Path to config file
    config_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("AGRO_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("AGRO_SERVER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("agrofacil-server")
            });

        let config_path = std::env::var("AGRO_SERVER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("agrofacil-server")
                    .join("config.yaml")
            });

        Self {
            port,
            data_dir,
            config_path,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrofacil=info,agrofacil_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(Config::from_env()).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let records = SqliteGateway::open(&config.data_dir.join("agrofacil-server.db")).await?;
    let api_keys = Arc::new(ApiKeyStore::load(&config.config_path));

    let app = router(AppState { api_keys, records });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
