//! Registry and package-manager fakes

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;

use gitbook_cli::store::manifest::MANIFEST_FILE;
use gitbook_cli::version::error::{PackageManagerError, RegistryError};
use gitbook_cli::version::package_manager::PackageManager;
use gitbook_cli::version::registry::{CatalogSource, RegistryClient};
use gitbook_cli::version::rule::VersionRule;
use gitbook_cli::version::types::RawCatalog;

pub const PACKAGE: &str = "gitbook";
pub const CONSTRAINT: &str = ">1.x.x";

/// Catalog source answering with a fixed listing and counting queries
pub struct StaticSource {
    name: &'static str,
    catalog: Option<RawCatalog>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(versions: &[&str], tags: &[(&str, &str)]) -> Self {
        Self {
            name: "static",
            catalog: Some(RawCatalog::new(
                versions.iter().map(|v| v.to_string()).collect(),
                tags.iter()
                    .map(|(t, v)| (t.to_string(), v.to_string()))
                    .collect::<IndexMap<_, _>>(),
            )),
            calls: AtomicUsize::new(0),
        }
    }

    /// Source that always fails
    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            catalog: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_raw(&self, _package_name: &str) -> Result<RawCatalog, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.catalog
            .clone()
            .ok_or_else(|| RegistryError::InvalidResponse(format!("{} is down", self.name)))
    }
}

pub fn create_registry(sources: Vec<Arc<StaticSource>>) -> RegistryClient {
    RegistryClient::new(
        PACKAGE,
        VersionRule::new(CONSTRAINT),
        sources
            .into_iter()
            .map(|s| s as Arc<dyn CatalogSource>)
            .collect(),
    )
}

/// Package manager writing a minimal artifact instead of downloading one
#[derive(Default)]
pub struct FakePackageManager {
    /// Version written to the manifest, keyed by requested version
    declared: HashMap<String, String>,
    installs: AtomicUsize,
}

impl FakePackageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `declared` in the manifest when `requested` is installed
    pub fn declaring(mut self, requested: &str, declared: &str) -> Self {
        self.declared
            .insert(requested.to_string(), declared.to_string());
        self
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageManager for FakePackageManager {
    async fn view(&self, _package: &str) -> Result<String, PackageManagerError> {
        Err(PackageManagerError::Missing {
            program: "fake".to_string(),
        })
    }

    async fn install(
        &self,
        prefix: &Path,
        package: &str,
        version: &str,
    ) -> Result<(), PackageManagerError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        let declared = self
            .declared
            .get(version)
            .map(String::as_str)
            .unwrap_or(version);
        write_artifact(&prefix.join("node_modules").join(package), package, declared);
        Ok(())
    }
}

/// Write an artifact tree holding only its manifest
pub fn write_artifact(dir: &Path, name: &str, version: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join(MANIFEST_FILE),
        format!(r#"{{"name": "{name}", "version": "{version}"}}"#),
    )
    .unwrap();
}
