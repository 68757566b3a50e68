//! Installation pipeline: resolve, install into scratch, verify, publish

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::store::lock::{self, LockError};
use crate::store::manifest::{Manifest, ManifestError};
use crate::store::{LocalStore, StoreError};
use crate::version::error::{PackageManagerError, RegistryError};
use crate::version::package_manager::PackageManager;
use crate::version::registry::RegistryClient;
use crate::version::rule::VersionRule;

/// Prefix of scratch directories created under the store root
const SCRATCH_PREFIX: &str = ".install-";

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to install {package}@{version}: {source}")]
    PackageManager {
        package: String,
        version: String,
        #[source]
        source: PackageManagerError,
    },

    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("installed artifact is unreadable: {0}")]
    Manifest(#[from] ManifestError),

    #[error("installed package is {found:?}, expected {expected:?}")]
    WrongPackage { expected: String, found: String },

    #[error("installed version {version} does not satisfy {constraint}")]
    DisallowedVersion { version: String, constraint: String },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Installer {
    store: LocalStore,
    registry: RegistryClient,
    package_manager: Arc<dyn PackageManager>,
    rule: VersionRule,
    lock_timeout: Duration,
}

impl Installer {
    pub fn new(
        store: LocalStore,
        registry: RegistryClient,
        package_manager: Arc<dyn PackageManager>,
        rule: VersionRule,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            package_manager,
            rule,
            lock_timeout,
        }
    }

    /// Install the version designated by `version` (a version, range or tag)
    /// and return the version declared by the installed manifest.
    ///
    /// Any existing store entry with that name is replaced. The scratch
    /// directory is removed on every exit path, including cancellation.
    pub async fn install(&self, version: &str) -> Result<String, InstallError> {
        let package = self.store.package().to_string();
        let resolved = self.registry.resolve(version).await?;
        info!("Installing {} {}", package, resolved);

        // Scratch lives under the store root so publishing is a rename
        fs::create_dir_all(self.store.root()).map_err(InstallError::Scratch)?;
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(self.store.root())
            .map_err(InstallError::Scratch)?;

        self.package_manager
            .install(scratch.path(), &package, &resolved)
            .await
            .map_err(|source| InstallError::PackageManager {
                package: package.clone(),
                version: resolved.clone(),
                source,
            })?;

        let artifact = scratch.path().join("node_modules").join(&package);
        let manifest = Manifest::read(&artifact)?;

        if manifest.name != package {
            return Err(InstallError::WrongPackage {
                expected: package,
                found: manifest.name,
            });
        }

        if !self.rule.is_valid(&manifest.version) {
            return Err(InstallError::DisallowedVersion {
                version: manifest.version,
                constraint: self.rule.constraint().to_string(),
            });
        }

        let _guard = lock::acquire(&self.store.lock_path(), self.lock_timeout).await?;
        let path = self.store.publish(&manifest.version, &artifact)?;
        info!("Installed {} {} at {}", package, manifest.version, path.display());

        Ok(manifest.version)
    }
}
