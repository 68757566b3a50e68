//! Catalog source backed by the `npm view` command

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

use crate::version::error::RegistryError;
use crate::version::package_manager::PackageManager;
use crate::version::registry::CatalogSource;
use crate::version::types::RawCatalog;

/// `npm view <pkg> versions dist-tags --json` output.
///
/// npm prints a bare string instead of an array when only one version exists.
#[derive(Debug, Deserialize)]
struct NpmViewOutput {
    versions: OneOrMany,
    #[serde(rename = "dist-tags", default)]
    dist_tags: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<serde_json::Value>),
}

impl OneOrMany {
    fn into_strings(self) -> Vec<String> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(values) => values
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        }
    }
}

pub struct NpmCliRegistry {
    package_manager: Arc<dyn PackageManager>,
}

impl NpmCliRegistry {
    pub fn new(package_manager: Arc<dyn PackageManager>) -> Self {
        Self { package_manager }
    }
}

#[async_trait::async_trait]
impl CatalogSource for NpmCliRegistry {
    fn name(&self) -> &'static str {
        "npm-cli"
    }

    async fn fetch_raw(&self, package_name: &str) -> Result<RawCatalog, RegistryError> {
        let stdout = self.package_manager.view(package_name).await?;

        let output: NpmViewOutput = serde_json::from_str(&stdout).map_err(|e| {
            warn!("Failed to parse npm view output: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let dist_tags = output
            .dist_tags
            .into_iter()
            .filter_map(|(tag, v)| v.as_str().map(|v| (tag, v.to_string())))
            .collect();

        Ok(RawCatalog::new(output.versions.into_strings(), dist_tags))
    }
}
