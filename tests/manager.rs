//! Orchestrator tests against a temporary store and fake registry

mod helper;

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use gitbook_cli::config::PROJECT_FILE;
use gitbook_cli::manager::{ManagerError, UpdateOutcome};
use gitbook_cli::store::StoreError;
use gitbook_cli::version::error::RegistryError;
use gitbook_cli::version::tags::Tag;

use helper::{FakePackageManager, StaticSource, create_test_manager, install_entry};

const VERSIONS: &[&str] = &["3.2.3", "3.2.2", "3.0.0", "2.6.7", "2.0.0-beta.1", "1.5.0"];
const TAGS: &[(&str, &str)] = &[("latest", "3.2.3"), ("beta", "2.0.0-beta.1")];

fn write_book(dir: &TempDir, requirement: &str) {
    fs::write(
        dir.path().join(PROJECT_FILE),
        format!(r#"{{"gitbook": "{requirement}"}}"#),
    )
    .unwrap();
}

#[tokio::test]
async fn ensure_version_returns_installed_match_without_touching_registry() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    write_book(&book, "2.x");
    let source = Arc::new(StaticSource::new(VERSIONS, TAGS));
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(&root, source.clone(), pm.clone());
    install_entry(manager.store(), "2.6.7");
    install_entry(manager.store(), "3.2.3");

    let resolved = manager
        .ensure_version(book.path(), None, true)
        .await
        .unwrap();

    assert_eq!(resolved.version, "2.6.7");
    assert_eq!(source.calls(), 0);
    assert_eq!(pm.installs(), 0);
}

#[tokio::test]
async fn ensure_version_installs_once_then_resolves() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    write_book(&book, ">=3.0.0");
    let source = Arc::new(StaticSource::new(VERSIONS, TAGS));
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(&root, source.clone(), pm.clone());

    let resolved = manager
        .ensure_version(book.path(), None, true)
        .await
        .unwrap();

    assert_eq!(resolved.name, "3.2.3");
    assert_eq!(resolved.tag, Tag::Latest);
    assert_eq!(pm.installs(), 1);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn ensure_version_without_book_installs_stable_release() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(
            &["4.0.0-alpha.6", "3.2.3", "3.2.2"],
            &[("latest", "3.2.3"), ("alpha", "4.0.0-alpha.6")],
        )),
        pm.clone(),
    );

    let resolved = manager
        .ensure_version(book.path(), None, true)
        .await
        .unwrap();

    assert_eq!(resolved.version, "3.2.3");
    assert_eq!(resolved.tag, Tag::Latest);
    assert_eq!(pm.installs(), 1);
}

#[tokio::test]
async fn ensure_version_override_takes_precedence_over_book() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    write_book(&book, "3.2.3");
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        pm.clone(),
    );

    let resolved = manager
        .ensure_version(book.path(), Some("3.0.0"), true)
        .await
        .unwrap();

    assert_eq!(resolved.version, "3.0.0");
    assert_eq!(pm.installs(), 1);
}

#[tokio::test]
async fn ensure_version_without_install_reports_local_miss() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    let source = Arc::new(StaticSource::new(VERSIONS, TAGS));
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(&root, source.clone(), pm.clone());

    let result = manager.ensure_version(book.path(), None, false).await;

    assert!(matches!(
        result,
        Err(ManagerError::Store(StoreError::NoMatch(condition))) if condition == "*"
    ));
    assert_eq!(source.calls(), 0);
    assert_eq!(pm.installs(), 0);
}

#[tokio::test]
async fn ensure_version_reports_inconsistency_after_single_retry() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    write_book(&book, "3.2.3");
    // The artifact installed for 3.2.3 declares 3.2.2
    let pm = Arc::new(FakePackageManager::new().declaring("3.2.3", "3.2.2"));
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        pm.clone(),
    );

    let result = manager.ensure_version(book.path(), None, true).await;

    assert!(matches!(
        result,
        Err(ManagerError::InstalledButUnresolved { requirement, installed })
            if requirement == "3.2.3" && installed == "3.2.2"
    ));
    assert_eq!(pm.installs(), 1);
}

#[tokio::test]
async fn ensure_version_resolves_beta_tag_through_registry() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    write_book(&book, "beta");
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        pm.clone(),
    );

    let resolved = manager
        .ensure_version(book.path(), None, true)
        .await
        .unwrap();

    assert_eq!(resolved.version, "2.0.0-beta.1");
    assert_eq!(resolved.tag, Tag::Beta);
}

#[tokio::test]
async fn ensure_and_load_returns_entry_path() {
    let root = TempDir::new().unwrap();
    let book = TempDir::new().unwrap();
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        Arc::new(FakePackageManager::new()),
    );

    let path = manager.ensure_and_load(book.path(), None).await.unwrap();

    assert_eq!(path, manager.store().entry_path("3.2.3"));
    assert!(path.join("package.json").is_file());
}

#[tokio::test]
async fn update_version_is_noop_when_up_to_date() {
    let root = TempDir::new().unwrap();
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        pm.clone(),
    );
    install_entry(manager.store(), "3.2.3");

    let outcome = manager.update_version(None).await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::UpToDate {
            current: "3.2.3".to_string()
        }
    );
    assert_eq!(pm.installs(), 0);
}

#[tokio::test]
async fn update_version_replaces_older_version() {
    let root = TempDir::new().unwrap();
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        pm.clone(),
    );
    install_entry(manager.store(), "3.0.0");

    let outcome = manager.update_version(Some("latest")).await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            version: "3.2.3".to_string(),
            previous: Some("3.0.0".to_string()),
        }
    );
    let names: Vec<String> = manager
        .store()
        .list()
        .unwrap()
        .into_iter()
        .map(|v| v.name)
        .collect();
    assert_eq!(names, vec!["3.2.3"]);
}

#[tokio::test]
async fn update_version_installs_into_empty_store() {
    let root = TempDir::new().unwrap();
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        pm.clone(),
    );

    let outcome = manager.update_version(None).await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            version: "3.2.3".to_string(),
            previous: None,
        }
    );
    assert_eq!(pm.installs(), 1);
}

#[tokio::test]
async fn update_version_rejects_unknown_tag() {
    let root = TempDir::new().unwrap();
    let manager = create_test_manager(
        &root,
        Arc::new(StaticSource::new(VERSIONS, TAGS)),
        Arc::new(FakePackageManager::new()),
    );

    let result = manager.update_version(Some("pre")).await;

    assert!(matches!(result, Err(ManagerError::TagNotFound(tag)) if tag == "pre"));
}

#[tokio::test]
async fn update_version_propagates_registry_outage() {
    let root = TempDir::new().unwrap();
    let pm = Arc::new(FakePackageManager::new());
    let manager = create_test_manager(&root, Arc::new(StaticSource::failing("down")), pm.clone());
    install_entry(manager.store(), "3.0.0");

    let result = manager.update_version(None).await;

    assert!(matches!(
        result,
        Err(ManagerError::Registry(RegistryError::Unavailable { attempts })) if attempts.len() == 1
    ));
    assert_eq!(pm.installs(), 0);
}
