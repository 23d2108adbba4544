//! Backup persistence adapters
//!
//! A `BackupStore` is a flat namespace of named byte blobs. Failures never
//! cross this boundary as errors: they are logged and reported as
//! `None`/`false`, so a broken disk can never wedge a running draw.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::BackupResult;

// ============ Store Trait ============

/// Named blob storage for backups
pub trait BackupStore: Send + Sync {
    /// Write `bytes` under `name`, returning where it landed
    fn save_backup(&self, name: &str, bytes: &[u8]) -> Option<PathBuf>;

    fn load_backup(&self, name: &str) -> Option<Vec<u8>>;

    /// Names of all stored backups, sorted
    fn list_backups(&self) -> Vec<String>;

    fn delete_backup(&self, name: &str) -> bool;

    fn check_exists(&self, name: &str) -> bool;
}

// ============ Filesystem Store ============

/// Backups as files in one directory
#[derive(Debug, Clone)]
pub struct FsBackupStore {
    dir: PathBuf,
}

impl FsBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a backup. The name is sanitized so it can never leave the
    /// backup directory.
    pub fn backup_path(&self, name: &str) -> PathBuf {
        self.dir.join(sanitize_filename(name))
    }

    fn try_save(&self, name: &str, bytes: &[u8]) -> BackupResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.backup_path(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl BackupStore for FsBackupStore {
    fn save_backup(&self, name: &str, bytes: &[u8]) -> Option<PathBuf> {
        match self.try_save(name, bytes) {
            Ok(path) => {
                log::debug!("Backup written: {:?}", path);
                Some(path)
            }
            Err(e) => {
                log::warn!("Failed to write backup {}: {}", name, e);
                None
            }
        }
    }

    fn load_backup(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.backup_path(name);
        if !path.exists() {
            return None;
        }
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to read backup {:?}: {}", path, e);
                None
            }
        }
    }

    fn list_backups(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn delete_backup(&self, name: &str) -> bool {
        let path = self.backup_path(name);
        if !path.exists() {
            return false;
        }
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to delete backup {:?}: {}", path, e);
                false
            }
        }
    }

    fn check_exists(&self, name: &str) -> bool {
        self.backup_path(name).is_file()
    }
}

// ============ Memory Store ============

/// In-memory store for tests and embedding. Can be switched into a failing
/// mode to exercise persistence errors.
#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write and delete fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::Relaxed)
    }
}

impl BackupStore for MemoryBackupStore {
    fn save_backup(&self, name: &str, bytes: &[u8]) -> Option<PathBuf> {
        if self.is_failing() {
            log::warn!("Failed to write backup {}: store unavailable", name);
            return None;
        }
        let name = sanitize_filename(name);
        self.entries.write().insert(name.clone(), bytes.to_vec());
        Some(PathBuf::from(name))
    }

    fn load_backup(&self, name: &str) -> Option<Vec<u8>> {
        self.entries.read().get(&sanitize_filename(name)).cloned()
    }

    fn list_backups(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn delete_backup(&self, name: &str) -> bool {
        if self.is_failing() {
            return false;
        }
        self.entries.write().remove(&sanitize_filename(name)).is_some()
    }

    fn check_exists(&self, name: &str) -> bool {
        self.entries.read().contains_key(&sanitize_filename(name))
    }
}

/// Sanitize a backup name for cross-platform filenames. Directory
/// separators and ".." are removed so a name cannot escape the store.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    let mut result = sanitized.replace("..", "");
    result = result.trim_matches(|c| c == '.' || c == ' ').to_string();

    if result.is_empty() {
        result = "unnamed".to_string();
    }

    if result.len() > 200 {
        let mut end = 200;
        while !result.is_char_boundary(end) {
            end -= 1;
        }
        result.truncate(end);
    }

    result
}
