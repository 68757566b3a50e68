//! Orchestration: from a project's requirement to an installed, loadable version
//!
//! Ties the local store, the registry client and the installer together.
//! Consumers (build, serve, ebook commands) only need [`Manager::ensure_and_load`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, PROJECT_FILE};
use crate::installer::{InstallError, Installer};
use crate::store::{InstalledVersion, LocalStore, StoreError, VersionRef};
use crate::version::error::RegistryError;
use crate::version::package_manager::{NpmCli, PackageManager};
use crate::version::registries::{NpmCliRegistry, NpmRegistry};
use crate::version::registry::{CatalogSource, RegistryClient};
use crate::version::rule::{ANY, VersionRule};
use crate::version::tags::Tag;
use crate::version::types::RemoteCatalog;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("tag doesn't exist: {0}")]
    TagNotFound(String),

    #[error("installed {installed} but no local version matches {requirement}")]
    InstalledButUnresolved {
        requirement: String,
        installed: String,
    },
}

/// Result of [`Manager::update_version`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The remote version was installed; `previous` is the replaced entry name
    Updated {
        version: String,
        previous: Option<String>,
    },
    /// The newest local version is already at least the remote one
    UpToDate { current: String },
}

/// `book.json` fields read by the manager
#[derive(Debug, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    gitbook: Option<String>,
}

pub struct Manager {
    store: LocalStore,
    registry: RegistryClient,
    installer: Installer,
    rule: VersionRule,
}

impl Manager {
    pub fn new(
        store: LocalStore,
        registry: RegistryClient,
        installer: Installer,
        rule: VersionRule,
    ) -> Self {
        Self {
            store,
            registry,
            installer,
            rule,
        }
    }

    /// Wire the npm-backed components described by `config`
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let rule = VersionRule::new(&config.constraint);
        let store = LocalStore::new(config.versions_root(), &config.package, rule.clone());

        let view_cli: Arc<dyn PackageManager> =
            Arc::new(NpmCli::new(&config.npm_program, config.fetch_timeout));
        let install_cli: Arc<dyn PackageManager> =
            Arc::new(NpmCli::new(&config.npm_program, config.install_timeout));

        let sources: Vec<Arc<dyn CatalogSource>> = vec![
            Arc::new(NpmCliRegistry::new(view_cli)),
            Arc::new(NpmRegistry::new(&config.registry_url, config.fetch_timeout)?),
        ];
        let registry = RegistryClient::new(&config.package, rule.clone(), sources);

        let installer = Installer::new(
            store.clone(),
            registry.clone(),
            install_cli,
            rule.clone(),
            config.lock_timeout,
        );

        Ok(Self::new(store, registry, installer, rule))
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Fresh remote catalog
    pub async fn remote_versions(&self) -> Result<RemoteCatalog, ManagerError> {
        Ok(self.registry.fetch_catalog().await?)
    }

    /// Install a version, range or tag; returns the installed version
    pub async fn install(&self, version: &str) -> Result<String, ManagerError> {
        Ok(self.installer.install(version).await?)
    }

    /// Version requirement declared by the project, `*` when absent or unreadable
    pub fn required_version(&self, project_root: &Path) -> String {
        required_version(project_root)
    }

    /// Resolve the project's requirement (or `version_override`) locally,
    /// installing it first when missing and `allow_install` is set.
    ///
    /// After an install the local store is consulted exactly once more.
    pub async fn ensure_version(
        &self,
        project_root: &Path,
        version_override: Option<&str>,
        allow_install: bool,
    ) -> Result<InstalledVersion, ManagerError> {
        let requirement = match version_override.filter(|v| !v.is_empty()) {
            Some(version) => version.to_string(),
            None => self.required_version(project_root),
        };

        let miss = match self.store.resolve(&requirement) {
            Ok(resolved) => return Ok(resolved),
            Err(e) => e,
        };

        if !allow_install {
            return Err(miss.into());
        }

        debug!("{} not installed locally ({}), installing", requirement, miss);
        let installed = self.installer.install(&requirement).await?;

        self.store.resolve(&requirement).map_err(|e| {
            warn!("Resolving {} after installing {} failed: {}", requirement, installed, e);
            ManagerError::InstalledButUnresolved {
                requirement,
                installed,
            }
        })
    }

    /// Ensure the required version is installed and return its path
    pub async fn ensure_and_load(
        &self,
        project_root: &Path,
        version_override: Option<&str>,
    ) -> Result<PathBuf, ManagerError> {
        let resolved = self
            .ensure_version(project_root, version_override, true)
            .await?;
        Ok(self.store.load(VersionRef::Resolved(resolved))?)
    }

    /// Move to the version the registry currently publishes under `tag`
    /// (stable channel when None), replacing the newest local version.
    pub async fn update_version(&self, tag: Option<&str>) -> Result<UpdateOutcome, ManagerError> {
        let tag = tag.filter(|t| !t.is_empty()).unwrap_or(Tag::STABLE.as_str());

        let current = match self.store.list() {
            Ok(versions) => versions.into_iter().next(),
            Err(e) => {
                warn!("Failed to list installed versions: {}", e);
                None
            }
        };

        let catalog = self.registry.fetch_catalog().await?;
        let remote = catalog
            .tag(tag)
            .ok_or_else(|| ManagerError::TagNotFound(tag.to_string()))?
            .to_string();

        if let Some(current) = current
            .as_ref()
            .filter(|c| !self.rule.compare(&remote, &c.version).is_lt())
        {
            info!("{} is up to date with {} ({})", current.version, tag, remote);
            return Ok(UpdateOutcome::UpToDate {
                current: current.version.clone(),
            });
        }

        let installed = self.installer.install(&remote).await?;

        let previous = current.map(|c| c.name);
        if let Some(name) = previous.as_deref().filter(|name| *name != installed) {
            if let Err(e) = self.store.remove(name) {
                warn!("Failed to remove previous version {}: {}", name, e);
            }
        }

        Ok(UpdateOutcome::Updated {
            version: installed,
            previous,
        })
    }
}

/// Version requirement declared in `<project_root>/book.json`
pub fn required_version(project_root: &Path) -> String {
    let path = project_root.join(PROJECT_FILE);
    let Ok(content) = fs::read_to_string(&path) else {
        return ANY.to_string();
    };

    match serde_json::from_str::<ProjectFile>(&content) {
        Ok(ProjectFile {
            gitbook: Some(version),
        }) if !version.trim().is_empty() => version.trim().to_string(),
        Ok(_) => ANY.to_string(),
        Err(e) => {
            debug!("Ignoring unreadable {}: {}", path.display(), e);
            ANY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn required_version_reads_gitbook_field() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE),
            r#"{"title": "Book", "gitbook": ">=3.0.0"}"#,
        )
        .unwrap();

        assert_eq!(required_version(dir.path()), ">=3.0.0");
    }

    #[test]
    fn required_version_defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();

        assert_eq!(required_version(dir.path()), "*");
    }

    #[test]
    fn required_version_defaults_when_field_missing_or_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), r#"{"title": "Book"}"#).unwrap();
        assert_eq!(required_version(dir.path()), "*");

        fs::write(dir.path().join(PROJECT_FILE), r#"{"gitbook": "  "}"#).unwrap();
        assert_eq!(required_version(dir.path()), "*");
    }

    #[test]
    fn required_version_defaults_when_unparseable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), r#"{"gitbook": 3"#).unwrap();
        assert_eq!(required_version(dir.path()), "*");

        fs::write(dir.path().join(PROJECT_FILE), r#"{"gitbook": 3}"#).unwrap();
        assert_eq!(required_version(dir.path()), "*");
    }
}
