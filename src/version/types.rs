//! Catalog types shared by registry sources and the registry client

use indexmap::IndexMap;

/// Unfiltered listing as returned by a catalog source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCatalog {
    pub versions: Vec<String>,
    pub dist_tags: IndexMap<String, String>,
}

impl RawCatalog {
    pub fn new(versions: Vec<String>, dist_tags: IndexMap<String, String>) -> Self {
        Self {
            versions,
            dist_tags,
        }
    }
}

/// Filtered and sorted listing obtained from one registry query.
///
/// Every version and every tag target passed validity; `versions` is never
/// empty and is ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCatalog {
    pub versions: Vec<String>,
    pub tags: IndexMap<String, String>,
    /// Name of the source that produced this catalog
    pub source: &'static str,
}

impl RemoteCatalog {
    /// Version currently designated by `tag`, if the registry publishes it
    pub fn tag(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }
}
