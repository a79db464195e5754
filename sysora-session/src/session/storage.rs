//! Session Storage - key-value persistence for session fields
//!
//! Stores apply a batch of writes all-or-nothing, so the session triple is
//! always written and cleared as one unit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DOCUMENT_NAME: &str = "session.json";

/// Storage layer error
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable at {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage quota exceeded: {required} bytes needed, {limit} allowed")]
    QuotaExceeded { required: usize, limit: usize },

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A single write in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StorageOp {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        StorageOp::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        StorageOp::Remove { key: key.into() }
    }
}

/// String key-value store in the manner of browser local storage.
///
/// `apply` must be atomic: on error none of the ops are visible.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn apply(&mut self, ops: Vec<StorageOp>) -> StorageResult<()>;

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.apply(vec![StorageOp::set(key, value)])
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.apply(vec![StorageOp::remove(key)])
    }
}

fn apply_ops(entries: &mut HashMap<String, String>, ops: Vec<StorageOp>) {
    for op in ops {
        match op {
            StorageOp::Set { key, value } => {
                entries.insert(key, value);
            }
            StorageOp::Remove { key } => {
                entries.remove(&key);
            }
        }
    }
}

/// In-process store with an optional byte quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once keys plus values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn apply(&mut self, ops: Vec<StorageOp>) -> StorageResult<()> {
        let mut next = self.entries.clone();
        apply_ops(&mut next, ops);

        if let Some(limit) = self.quota_bytes {
            let required: usize = next.iter().map(|(k, v)| k.len() + v.len()).sum();
            if required > limit {
                return Err(StorageError::QuotaExceeded { required, limit });
            }
        }

        self.entries = next;
        Ok(())
    }
}

/// Store persisting every key in one JSON document.
///
/// Reads and writes always go to the document on disk, so edits made by
/// another process are seen by the next `get`. Each batch rewrites the
/// document through a temp file and a rename, so a crash leaves either the
/// old or the new document on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// An unparsable document is treated as empty; the next write replaces it.
    pub fn open<P: AsRef<Path>>(dir: P) -> StorageResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Unavailable {
            path: dir.to_path_buf(),
            source,
        })?;

        let store = Self {
            path: dir.join(DOCUMENT_NAME),
        };
        store.load_document()?;

        info!("Session storage opened at: {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> StorageResult<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    warn!(
                        "Discarding unreadable session document {}: {}",
                        self.path.display(),
                        e
                    );
                    Ok(HashMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(StorageError::Unavailable {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_document(&self, entries: &HashMap<String, String>) -> StorageResult<()> {
        let json_data = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        std::fs::write(&tmp_path, json_data)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(StorageError::Io(e));
        }

        debug!(
            "Wrote {} session keys to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.load_document()?.remove(key))
    }

    fn apply(&mut self, ops: Vec<StorageOp>) -> StorageResult<()> {
        let current = self.load_document()?;
        let mut next = current.clone();
        apply_ops(&mut next, ops);

        if next == current {
            return Ok(());
        }

        self.write_document(&next)
    }
}
