use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::version::registries::npm::DEFAULT_BASE_URL;

// =============================================================================
// Defaults
// =============================================================================

/// Package managed by this tool
pub const PACKAGE_NAME: &str = "gitbook";

/// Versions accepted by this tool
pub const DEFAULT_CONSTRAINT: &str = ">1.x.x";

/// Package-manager program used for `view` and `install`
pub const DEFAULT_NPM_PROGRAM: &str = "npm";

/// Timeout for registry queries (30 seconds)
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a package-manager install (10 minutes)
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Timeout for acquiring the store lock before publishing (2 minutes)
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Project file declaring the required version
pub const PROJECT_FILE: &str = "book.json";

/// Environment variable overriding the root directory
pub const ROOT_ENV: &str = "GITBOOK_DIR";

/// Environment variable overriding the package-manager program
pub const NPM_ENV: &str = "GITBOOK_NPM";

/// Environment variable overriding the registry base URL
pub const REGISTRY_ENV: &str = "GITBOOK_REGISTRY";

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "GITBOOK_LOG";

/// Engine configuration, passed explicitly to every component
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root directory; installed versions live under `<root>/versions`
    pub root: PathBuf,
    pub package: String,
    pub constraint: String,
    pub registry_url: String,
    pub npm_program: String,
    pub fetch_timeout: Duration,
    pub install_timeout: Duration,
    pub lock_timeout: Duration,
}

impl Config {
    /// Configuration rooted at `root` with every other setting defaulted
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            package: PACKAGE_NAME.to_string(),
            constraint: DEFAULT_CONSTRAINT.to_string(),
            registry_url: DEFAULT_BASE_URL.to_string(),
            npm_program: DEFAULT_NPM_PROGRAM.to_string(),
            fetch_timeout: FETCH_TIMEOUT,
            install_timeout: INSTALL_TIMEOUT,
            lock_timeout: LOCK_TIMEOUT,
        }
    }

    /// Configuration read from the process environment
    pub fn from_env() -> Self {
        config_with_env(
            std::env::var(ROOT_ENV).ok(),
            std::env::var(NPM_ENV).ok(),
            std::env::var(REGISTRY_ENV).ok(),
            dirs::home_dir(),
        )
    }

    pub fn versions_root(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("gitbook-cli.log")
    }

    /// Create the root and versions directories
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.versions_root())
    }
}

fn config_with_env(
    root: Option<String>,
    npm_program: Option<String>,
    registry_url: Option<String>,
    home_dir: Option<PathBuf>,
) -> Config {
    let mut config = Config::with_root(root_with_env(root, home_dir));
    if let Some(program) = non_empty(npm_program) {
        config.npm_program = program;
    }
    if let Some(url) = non_empty(registry_url) {
        config.registry_url = url;
    }
    config
}

/// Returns the root directory.
/// Uses $GITBOOK_DIR if set, otherwise ~/.gitbook,
/// or ./.gitbook if no home directory is available.
fn root_with_env(gitbook_dir: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    non_empty(gitbook_dir)
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".gitbook")))
        .unwrap_or_else(|| Path::new(".").join(".gitbook"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
