//! Remote catalog retrieval with an ordered list of fetch strategies

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::{debug, info, warn};

use crate::version::error::RegistryError;
use crate::version::rule::VersionRule;
use crate::version::types::{RawCatalog, RemoteCatalog};

/// Trait for one way of listing a package's published versions
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name used in diagnostics (e.g. "npm-cli", "npm-http")
    fn name(&self) -> &'static str;

    /// Fetches every published version and dist-tag, unfiltered
    ///
    /// # Returns
    /// * `Ok(RawCatalog)` - Raw listing, in whatever order the source produced
    /// * `Err(RegistryError)` - If the source is unavailable or its output is malformed
    async fn fetch_raw(&self, package_name: &str) -> Result<RawCatalog, RegistryError>;
}

/// Registry client trying each source in order; the first source that
/// answers wins, and only a source error moves on to the next one.
#[derive(Clone)]
pub struct RegistryClient {
    package: String,
    rule: VersionRule,
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl RegistryClient {
    pub fn new(package: &str, rule: VersionRule, sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self {
            package: package.to_string(),
            rule,
            sources,
        }
    }

    /// Query the registry for a fresh catalog. Nothing is cached between calls.
    ///
    /// Only a source error moves on to the next source; a source that answers
    /// without any valid version ends the query with
    /// [`RegistryError::NoValidVersion`].
    pub async fn fetch_catalog(&self) -> Result<RemoteCatalog, RegistryError> {
        let mut attempts = Vec::new();

        for source in &self.sources {
            debug!("Fetching {} versions from {}", self.package, source.name());
            match source.fetch_raw(&self.package).await {
                Ok(raw) => return self.build_catalog(raw, source.name()),
                Err(e) => {
                    warn!("Registry source {} failed: {}", source.name(), e);
                    attempts.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(RegistryError::Unavailable { attempts })
    }

    /// Resolve a version, range or tag to a concrete published version
    pub async fn resolve(&self, version: &str) -> Result<String, RegistryError> {
        let catalog = self.fetch_catalog().await?;
        resolve_in_catalog(&catalog, version)
    }

    fn build_catalog(
        &self,
        raw: RawCatalog,
        source: &'static str,
    ) -> Result<RemoteCatalog, RegistryError> {
        let mut versions: Vec<String> = raw
            .versions
            .into_iter()
            .filter(|v| self.rule.is_valid(v))
            .collect();
        self.rule.sort_newest_first(&mut versions);

        let tags = raw
            .dist_tags
            .into_iter()
            .filter(|(_, v)| self.rule.is_valid(v))
            .collect();

        if versions.is_empty() {
            return Err(RegistryError::NoValidVersion {
                package: self.package.clone(),
            });
        }

        info!(
            "Fetched {} valid versions of {} from {}",
            versions.len(),
            self.package,
            source
        );

        Ok(RemoteCatalog {
            versions,
            tags,
            source,
        })
    }
}

/// Tag names are substituted by the version they designate, then the
/// newest catalog entry satisfying the request wins.
pub fn resolve_in_catalog(catalog: &RemoteCatalog, version: &str) -> Result<String, RegistryError> {
    let wanted = catalog.tag(version).unwrap_or(version);

    catalog
        .versions
        .iter()
        .find(|v| crate::version::rule::satisfies(v, wanted, false))
        .cloned()
        .ok_or_else(|| RegistryError::InvalidVersion(wanted.to_string()))
}
