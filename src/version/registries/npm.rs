//! npm registry HTTP API implementation

use std::collections::HashMap;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::RegistryError;
use crate::version::registry::CatalogSource;
use crate::version::types::RawCatalog;

/// Default base URL for npm registry
pub const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Response from npm registry API
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
    #[serde(rename = "dist-tags", default)]
    dist_tags: IndexMap<String, serde_json::Value>,
}

/// Catalog source reading the npm registry's package document over HTTP
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL and request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gitbook-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for NpmRegistry {
    fn name(&self) -> &'static str {
        "npm-http"
    }

    async fn fetch_raw(&self, package_name: &str) -> Result<RawCatalog, RegistryError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/{}", self.base_url, encoded_name);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let package_info: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        // Non-string tag targets are dropped rather than failing the fetch
        let dist_tags = package_info
            .dist_tags
            .into_iter()
            .filter_map(|(tag, v)| v.as_str().map(|v| (tag, v.to_string())))
            .collect();

        Ok(RawCatalog::new(
            package_info.versions.into_keys().collect(),
            dist_tags,
        ))
    }
}
