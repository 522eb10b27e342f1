//! Client-side JSON copy of the whole store.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::models::{Cost, Entry, Product, Sale};

const SNAPSHOT_FILE: &str = "records.json";

/// Everything the store needs to resume where it left off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub next_local_id: u64,
    #[serde(default)]
    pub products: Vec<Entry<Product>>,
    #[serde(default)]
    pub costs: Vec<Entry<Cost>>,
    #[serde(default)]
    pub sales: Vec<Entry<Sale>>,
}

/// Reads and writes the snapshot file inside a data directory.
#[derive(Clone)]
pub struct SnapshotStorage {
    data_dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Loads the snapshot.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let path = self.path();

        match fs::read(&path) {
            Ok(bytes) => {
                let snapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| SnapshotError::ParseError(path, e))?;
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::IoError(path, e)),
        }
    }

    /// Writes the snapshot through a temporary file and a rename, so a crash
    /// never leaves a half-written file behind.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| SnapshotError::IoError(self.data_dir.clone(), e))?;

        let path = self.path();
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| SnapshotError::ParseError(path.clone(), e))?;

        fs::write(&tmp_path, bytes).map_err(|e| SnapshotError::IoError(tmp_path.clone(), e))?;
        fs::rename(&tmp_path, &path).map_err(|e| SnapshotError::IoError(path, e))?;

        Ok(())
    }
}

#[derive(Debug)]
pub enum SnapshotError {
    IoError(PathBuf, io::Error),
    ParseError(PathBuf, serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            SnapshotError::ParseError(path, e) => {
                write!(f, "Invalid snapshot {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::IoError(_, e) => Some(e),
            SnapshotError::ParseError(_, e) => Some(e),
        }
    }
}
