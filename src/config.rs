use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Where records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite database on this machine
    #[default]
    Local,
    /// Remote table server
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" => Ok(BackendKind::Remote),
            _ => Err(format!(
                "Invalid backend '{}'. Valid options: local, remote",
                s
            )),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_retry_backoff_secs() -> u64 {
    5
}

fn default_probe_interval_secs() -> u64 {
    15
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Server URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// API key for authentication
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Reconcile unsynced records when the backend becomes reachable (default: true)
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    /// Upper bound for a single gateway call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause after a reconciliation pass that left records unsynced
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// How often `sync watch` probes the server
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            auto_sync: true,
            request_timeout_secs: default_request_timeout_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

impl SyncConfig {
    /// Returns true if sync is configured (has both server_url and api_key)
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory for the local snapshot and default database
    pub data_dir: ConfigValue<PathBuf>,
    /// Path to the SQLite database used by the local backend
    pub database_path: ConfigValue<PathBuf>,
    /// Which persistence backend to use
    pub backend: ConfigValue<BackendKind>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Sync configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    database_path: Option<PathBuf>,
    backend: Option<BackendKind>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut database_path: Option<ConfigValue<PathBuf>> = None;
        let mut backend = ConfigValue::new(BackendKind::default(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            // Resolve relative paths against config file's directory
            let resolve = |p: PathBuf| {
                if p.is_relative() {
                    path.parent().map(|dir| dir.join(&p)).unwrap_or(p)
                } else {
                    p
                }
            };

            if let Some(dir) = file_config.data_dir {
                data_dir = ConfigValue::new(resolve(dir), ConfigSource::File);
            }
            if let Some(db_path) = file_config.database_path {
                database_path = Some(ConfigValue::new(resolve(db_path), ConfigSource::File));
            }
            if let Some(kind) = file_config.backend {
                backend = ConfigValue::new(kind, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("AGRO_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(db_path) = std::env::var("AGRO_DATABASE_PATH") {
            database_path = Some(ConfigValue::new(
                PathBuf::from(db_path),
                ConfigSource::Environment,
            ));
        }
        if let Ok(kind) = std::env::var("AGRO_BACKEND") {
            let kind = kind.parse::<BackendKind>().map_err(ConfigError::InvalidValue)?;
            backend = ConfigValue::new(kind, ConfigSource::Environment);
        }
        // Sync env var overrides
        if let Ok(url) = std::env::var("AGRO_SYNC_URL") {
            sync.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("AGRO_SYNC_API_KEY") {
            sync.api_key = Some(key);
        }
        if let Ok(flag) = std::env::var("AGRO_AUTO_SYNC") {
            sync.auto_sync = parse_flag(&flag).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "Invalid AGRO_AUTO_SYNC '{}'. Use true or false",
                    flag
                ))
            })?;
        }

        // The database follows the data dir unless set explicitly
        let database_path = database_path.unwrap_or_else(|| {
            ConfigValue::new(
                data_dir.value.join("agrofacil.db"),
                data_dir.source.clone(),
            )
        });

        Ok(Self {
            data_dir,
            database_path,
            backend,
            config_file,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/agrofacil/
    /// - macOS: ~/Library/Application Support/agrofacil/
    /// - Windows: %APPDATA%/agrofacil/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agrofacil")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/agrofacil/
    /// - macOS: ~/Library/Application Support/agrofacil/
    /// - Windows: %APPDATA%/agrofacil/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agrofacil")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
