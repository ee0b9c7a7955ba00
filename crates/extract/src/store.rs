//! Targets cache
//!
//! A key-value store from project fingerprint to project node. The store is
//! injected into the extractor; [`TargetsCache`] is the in-memory view a pass
//! reads from and writes back at the end.

use nxgradle_core::output::ProjectNode;
use nxgradle_core::{FileSystem, NodesError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::debug;

pub type CacheEntries = BTreeMap<String, ProjectNode>;

pub trait CacheStore: Send + Sync {
    fn read(&self) -> Result<CacheEntries, NodesError>;

    /// Replaces the stored contents with `entries`.
    fn write(&self, entries: &CacheEntries) -> Result<(), NodesError>;

    fn location(&self) -> String;
}

/// JSON file store, one file per option set.
pub struct JsonFileStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for JsonFileStore {
    fn read(&self) -> Result<CacheEntries, NodesError> {
        if !self.fs.exists(&self.path) {
            return Ok(CacheEntries::new());
        }

        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|source| NodesError::Read {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| NodesError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, entries: &CacheEntries) -> Result<(), NodesError> {
        let json = serde_json::to_string_pretty(entries).map_err(|source| NodesError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        if let Some(dir) = self.path.parent() {
            self.fs
                .create_dir_all(dir)
                .map_err(|source| NodesError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }

        self.fs
            .write(&self.path, &json)
            .map_err(|source| NodesError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store, mostly for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<CacheEntries>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: CacheEntries) -> Self {
        Self {
            entries: RwLock::new(entries),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn entries(&self) -> CacheEntries {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl CacheStore for MemoryStore {
    fn read(&self) -> Result<CacheEntries, NodesError> {
        Ok(self.entries())
    }

    fn write(&self, entries: &CacheEntries) -> Result<(), NodesError> {
        *self.entries.write().unwrap_or_else(|e| e.into_inner()) = entries.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Shared cache state of one extraction pass.
pub struct TargetsCache {
    entries: Mutex<CacheEntries>,
}

impl TargetsCache {
    pub fn load(store: &dyn CacheStore) -> Result<Self, NodesError> {
        let entries = store.read()?;
        debug!(
            location = %store.location(),
            entries = entries.len(),
            "Loaded targets cache"
        );
        Ok(Self {
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheEntries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the node stored under `key`, populating it from `populate` on
    /// a miss. Lookup and population happen under one lock, and a `None` from
    /// `populate` stores nothing.
    pub fn get_or_insert_with<F>(&self, key: &str, populate: F) -> Option<ProjectNode>
    where
        F: FnOnce() -> Option<ProjectNode>,
    {
        let mut entries = self.lock();
        if let Some(node) = entries.get(key) {
            return Some(node.clone());
        }

        let node = populate()?;
        entries.insert(key.to_string(), node.clone());
        Some(node)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn persist(&self, store: &dyn CacheStore) -> Result<(), NodesError> {
        let snapshot = self.lock().clone();
        store.write(&snapshot)?;
        debug!(
            location = %store.location(),
            entries = snapshot.len(),
            "Persisted targets cache"
        );
        Ok(())
    }
}
