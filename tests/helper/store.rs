//! Store and manager fixtures

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use gitbook_cli::installer::Installer;
use gitbook_cli::manager::Manager;
use gitbook_cli::store::LocalStore;
use gitbook_cli::version::rule::VersionRule;

use super::registry::{
    CONSTRAINT, FakePackageManager, PACKAGE, StaticSource, create_registry, write_artifact,
};

pub fn create_test_store(temp_dir: &TempDir) -> LocalStore {
    LocalStore::new(
        temp_dir.path().join("versions"),
        PACKAGE,
        VersionRule::new(CONSTRAINT),
    )
}

/// Pre-install `version` as a regular store entry
pub fn install_entry(store: &LocalStore, version: &str) {
    write_artifact(&store.entry_path(version), PACKAGE, version);
}

pub fn create_test_manager(
    temp_dir: &TempDir,
    source: Arc<StaticSource>,
    package_manager: Arc<FakePackageManager>,
) -> Manager {
    let rule = VersionRule::new(CONSTRAINT);
    let store = create_test_store(temp_dir);
    let registry = create_registry(vec![source]);
    let installer = Installer::new(
        store.clone(),
        registry.clone(),
        package_manager,
        rule.clone(),
        Duration::from_secs(5),
    );
    Manager::new(store, registry, installer, rule)
}
