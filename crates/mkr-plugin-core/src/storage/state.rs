//! Previous-sample state file.
//!
//! One JSON document per plugin holding the raw values of the last
//! invocation and when they were taken. It is read once at start and
//! replaced wholesale at the end (last writer wins, no merge).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::MetricSet;

/// Overrides the directory default state files are placed in.
pub const WORKDIR_ENV: &str = "MACKEREL_PLUGIN_WORKDIR";

/// Raw values of the previous invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousSample {
    /// Unix timestamp (seconds) the sample was taken at.
    pub timestamp: i64,
    pub values: MetricSet,
}

/// Error type for state file access.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serde(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "state file I/O error: {}", e),
            StoreError::Serde(e) => write!(f, "state file is not valid: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serde(e) => Some(e),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e)
    }
}

/// State file of one plugin.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `$MACKEREL_PLUGIN_WORKDIR` or the OS temp dir,
    /// joined with `mackerel-plugin-<plugin>`.
    pub fn default_path(plugin: &str) -> PathBuf {
        let dir = std::env::var_os(WORKDIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        dir.join(format!("mackerel-plugin-{}", plugin))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previous sample; a missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<PreviousSample>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no state file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Replaces the stored sample.
    ///
    /// Written to a sibling temp file first and renamed into place, so a
    /// concurrent reader sees either the old or the new sample.
    pub fn save(&self, sample: &PreviousSample) -> Result<(), StoreError> {
        let json = serde_json::to_vec(sample)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", std::process::id()));
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(
            "saved {} values to {}",
            sample.values.len(),
            self.path.display()
        );
        Ok(())
    }
}
