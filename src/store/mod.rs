//! Local version store
//!
//! One entry per installed version under the versions root: either a real
//! directory holding the artifact tree, or a symlink (alias) to any folder.
//! Every call reads the filesystem afresh; nothing is cached.

pub mod lock;
pub mod manifest;

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::store::manifest::Manifest;
use crate::version::rule::VersionRule;
use crate::version::tags::Tag;

/// Lock file name under the versions root
pub const LOCK_FILE: &str = ".lock";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no version match: {0}")]
    NoMatch(String),

    #[error("version {name} is corrupted: {} is missing", path.display())]
    Corrupted { name: String, path: PathBuf },

    #[error("version {0} is not installed")]
    NotInstalled(String),

    #[error("require a name to represent this version")]
    MissingName,

    #[error("invalid version name {0:?}: must be a single path component")]
    InvalidName(String),

    #[error("require a folder")]
    MissingFolder,

    #[error("I/O error during {operation} on {}: {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
        operation: &'static str,
    },
}

impl StoreError {
    fn io(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| StoreError::Io {
            source,
            path,
            operation,
        }
    }
}

/// A store entry as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    /// Directory name in the store (the version, or an alias name)
    pub name: String,
    /// Version declared by the artifact's manifest
    pub version: String,
    /// Absolute path of the entry
    pub path: PathBuf,
    /// Symlink target when the entry is an alias
    pub link: Option<PathBuf>,
    /// Release channel of `version`
    pub tag: Tag,
}

impl InstalledVersion {
    pub fn is_alias(&self) -> bool {
        self.link.is_some()
    }
}

/// Argument of [`LocalStore::load`]
#[derive(Debug, Clone)]
pub enum VersionRef {
    /// Resolve the condition against installed versions first
    ByCondition(String),
    /// Entry obtained from an earlier resolve
    Resolved(InstalledVersion),
}

impl From<InstalledVersion> for VersionRef {
    fn from(version: InstalledVersion) -> Self {
        VersionRef::Resolved(version)
    }
}

impl From<&str> for VersionRef {
    fn from(condition: &str) -> Self {
        VersionRef::ByCondition(condition.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    package: String,
    rule: VersionRule,
}

impl LocalStore {
    /// `root` is the versions directory; `package` is the name every
    /// artifact manifest must declare.
    pub fn new(root: impl Into<PathBuf>, package: &str, rule: VersionRule) -> Self {
        Self {
            root: root.into(),
            package: package.to_string(),
            rule,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Entry path for a caller-supplied name. Anything but a single normal
    /// path component would escape the root and is rejected.
    fn checked_entry_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty() {
            return Err(StoreError::MissingName);
        }
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(component)), None) if component == name => {
                Ok(self.entry_path(name))
            }
            _ => Err(StoreError::InvalidName(name.to_string())),
        }
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Installed versions, newest first. A missing root yields an empty list.
    pub fn list(&self) -> Result<Vec<InstalledVersion>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("read directory", &self.root)(e)),
        };

        let mut versions: Vec<InstalledVersion> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| self.inspect_entry(&entry.file_name().to_string_lossy()))
            .collect();

        versions.sort_by(|a, b| self.rule.compare(&a.version, &b.version));
        Ok(versions)
    }

    /// Read one store entry; None when it is not a usable installation
    fn inspect_entry(&self, name: &str) -> Option<InstalledVersion> {
        if !self.rule.is_valid(name) {
            return None;
        }

        let path = self.entry_path(name);
        let metadata = fs::symlink_metadata(&path).ok()?;
        let link = if metadata.file_type().is_symlink() {
            Some(fs::read_link(&path).ok()?)
        } else {
            None
        };

        let manifest = match Manifest::read(&path) {
            Ok(manifest) => manifest,
            Err(e) => {
                debug!("Skipping store entry {}: {}", name, e);
                return None;
            }
        };

        if manifest.name != self.package {
            debug!(
                "Skipping store entry {}: manifest declares {:?}, expected {:?}",
                name, manifest.name, self.package
            );
            return None;
        }

        Some(InstalledVersion {
            name: name.to_string(),
            tag: self.rule.classify_tag(&manifest.version),
            version: manifest.version,
            path,
            link,
        })
    }

    /// First installed version (newest first) whose name satisfies `condition`
    pub fn resolve(&self, condition: &str) -> Result<InstalledVersion, StoreError> {
        self.list()?
            .into_iter()
            .find(|v| self.rule.satisfies(&v.name, condition, true))
            .ok_or_else(|| StoreError::NoMatch(condition.to_string()))
    }

    /// Path of a version that still exists on disk
    pub fn load(&self, version: VersionRef) -> Result<PathBuf, StoreError> {
        let resolved = match version {
            VersionRef::ByCondition(condition) => self.resolve(&condition)?,
            VersionRef::Resolved(resolved) => resolved,
        };

        // Follows symlinks: a dangling alias is corrupted too
        if !resolved.path.exists() {
            return Err(StoreError::Corrupted {
                name: resolved.name,
                path: resolved.path,
            });
        }

        Ok(resolved.path)
    }

    /// Point `<root>/<name>` at `folder`, replacing any existing entry
    pub fn link(&self, name: &str, folder: &Path) -> Result<(), StoreError> {
        let entry = self.checked_entry_path(name)?;
        if folder.as_os_str().is_empty() {
            return Err(StoreError::MissingFolder);
        }

        let target = std::path::absolute(folder).map_err(StoreError::io("resolve", folder))?;
        fs::create_dir_all(&self.root).map_err(StoreError::io("create directory", &self.root))?;

        remove_entry(&entry)?;
        symlink_dir(&target, &entry).map_err(StoreError::io("create symlink", &entry))?;

        info!("Linked {} to {}", name, target.display());
        Ok(())
    }

    /// Remove an entry. Aliases are unlinked; their target is left alone.
    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let entry = self.checked_entry_path(name)?;
        if !remove_entry(&entry)? {
            return Err(StoreError::NotInstalled(name.to_string()));
        }

        info!("Removed {}", entry.display());
        Ok(())
    }

    /// Replace the entry `name` with the artifact tree at `artifact`.
    ///
    /// The tree is renamed into place when possible and copied otherwise.
    /// Callers serialize publishes with the store lock.
    pub fn publish(&self, name: &str, artifact: &Path) -> Result<PathBuf, StoreError> {
        let entry = self.checked_entry_path(name)?;
        fs::create_dir_all(&self.root).map_err(StoreError::io("create directory", &self.root))?;

        remove_entry(&entry)?;

        if let Err(e) = fs::rename(artifact, &entry) {
            warn!(
                "Renaming {} failed ({}), copying instead",
                artifact.display(),
                e
            );
            if let Err(e) = copy_tree(artifact, &entry) {
                // Leave no half-written entry behind
                let _ = fs::remove_dir_all(&entry);
                return Err(e);
            }
        }

        Ok(entry)
    }
}

/// Remove whatever is at `path`. Returns false if nothing was there.
fn remove_entry(path: &Path) -> Result<bool, StoreError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(StoreError::io("inspect", path)(e)),
    };

    let file_type = metadata.file_type();
    let result = if file_type.is_symlink() {
        remove_symlink(path)
    } else if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(StoreError::io("remove", path))?;

    Ok(true)
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), StoreError> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            StoreError::Io {
                source: e.into(),
                path,
                operation: "walk",
            }
        })?;

        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let destination = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&destination).map_err(StoreError::io("create directory", &destination))?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path()).map_err(StoreError::io("read symlink", entry.path()))?;
            symlink_any(&target, &destination).map_err(StoreError::io("create symlink", &destination))?;
        } else {
            fs::copy(entry.path(), &destination).map_err(StoreError::io("copy", &destination))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn symlink_any(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_any(target: &Path, link: &Path) -> std::io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(unix)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    // Directory symlinks are removed as directories on Windows
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}
