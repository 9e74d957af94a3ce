use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transfer from {location} failed: {message}")]
    Transfer { location: String, message: String },
    #[error("No entry named '{0}'")]
    MissingEntry(String),
    #[error("Invalid entry name: '{0}'")]
    InvalidName(String),
}

/// A flat collection of named files: a local directory, a remote listing, or
/// an in-memory map.
pub trait FileStore: Send + Sync {
    /// Human-readable location used in logs and errors.
    fn location(&self) -> String;
    fn list(&self) -> Result<Vec<String>, StoreError>;
    fn fetch(&self, name: &str) -> Result<Vec<u8>, StoreError>;
}

pub trait WritableStore: FileStore {
    /// Stores `bytes` under `name`. Readers never observe a partially written
    /// entry.
    fn store(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

const PARTIAL_SUFFIX: &str = ".part";

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ── Local directory ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileStore for DirectoryStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    /// Regular files only; leftovers of interrupted writes are not listed. A
    /// missing directory lists as empty.
    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet; nothing listed", self.root.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        validate_name(name)?;
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::MissingEntry(name.to_string())
            } else {
                StoreError::Io(e)
            }
        })
    }
}

impl WritableStore for DirectoryStore {
    fn store(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        std::fs::create_dir_all(&self.root)?;
        let dest = self.root.join(name);
        let tmp = self.root.join(format!("{name}{PARTIAL_SUFFIX}"));
        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, &dest) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

// ── In-memory (tests, embedding) ──────────────────────────────────────────────

/// Map-backed store that counts fetches, so callers can assert that a lookup
/// was served without touching it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    label: String,
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_entry(self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), bytes.into());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileStore for MemoryStore {
    fn location(&self) -> String {
        format!("memory:{}", self.label)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.get(name)
            .ok_or_else(|| StoreError::MissingEntry(name.to_string()))
    }
}

impl WritableStore for MemoryStore {
    fn store(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

// ── Offline ───────────────────────────────────────────────────────────────────

/// A remote that never has anything: resolution is limited to the cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl FileStore for Offline {
    fn location(&self) -> String {
        "offline".to_string()
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        Err(StoreError::MissingEntry(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("downloads"));

        assert!(store.list().unwrap().is_empty());
        store.store("TabelaUnificada_202408_v1.zip", b"PK").unwrap();

        assert_eq!(store.list().unwrap(), vec!["TabelaUnificada_202408_v1.zip"]);
        assert_eq!(store.fetch("TabelaUnificada_202408_v1.zip").unwrap(), b"PK");
    }

    #[test]
    fn directory_store_hides_partial_files_and_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("RDMG2408.csv.part"), b"half").unwrap();
        std::fs::create_dir(dir.path().join("RDMG2408_dir")).unwrap();
        std::fs::write(dir.path().join("RDMG2408.csv"), b"full").unwrap();

        let store = DirectoryStore::new(dir.path());
        assert_eq!(store.list().unwrap(), vec!["RDMG2408.csv"]);
    }

    #[test]
    fn directory_store_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        assert!(matches!(
            store.fetch("nope.zip"),
            Err(StoreError::MissingEntry(_))
        ));
    }

    #[test]
    fn directory_store_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        assert!(matches!(
            store.store("../escape.zip", b""),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn memory_store_counts_fetches() {
        let store = MemoryStore::new("remote").with_entry("a.zip", b"1".to_vec());
        assert_eq!(store.fetch_count(), 0);
        assert_eq!(store.fetch("a.zip").unwrap(), b"1");
        assert!(store.fetch("b.zip").is_err());
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn offline_lists_nothing() {
        assert!(Offline.list().unwrap().is_empty());
        assert!(Offline.fetch("x").is_err());
    }
}
