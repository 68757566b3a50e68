//! Installed artifact manifest (`package.json`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Manifest file name, relative to the artifact root
pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The two manifest fields the engine relies on
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl Manifest {
    /// Read the manifest at the root of an artifact tree
    pub fn read(artifact_root: &Path) -> Result<Self, ManifestError> {
        let path = artifact_root.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ManifestError::Malformed { path, source })
    }
}
