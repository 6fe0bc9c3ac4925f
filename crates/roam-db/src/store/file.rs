use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{KvStore, Snapshot, StoreError};

/// On-disk layout: one JSON object mapping each key to its entry.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(flatten)]
    entries: BTreeMap<String, Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    version: u64,
    value: String,
}

/// Store backed by a single JSON file.
///
/// Every operation holds an advisory lock on a sibling `<file>.lock`, so
/// the version check and the write are atomic across handles and across
/// processes. Writes go to a uniquely named temp file in the same
/// directory which is then renamed over the original.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: Arc<Paths>,
}

#[derive(Debug)]
struct Paths {
    data: PathBuf,
    lock: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let data = path.into();
        let mut lock = OsString::from(data.as_os_str());
        lock.push(".lock");
        Self {
            paths: Arc::new(Paths {
                data,
                lock: PathBuf::from(lock),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.paths.data
    }

    /// Run `f` on a blocking thread with the lock file held.
    async fn locked<T, F>(&self, exclusive: bool, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Paths) -> Result<T, StoreError> + Send + 'static,
    {
        let paths = Arc::clone(&self.paths);
        tokio::task::spawn_blocking(move || {
            let mut lock = RwLock::new(open_lock_file(&paths)?);
            if exclusive {
                let _guard = lock.write()?;
                f(&paths)
            } else {
                let _guard = lock.read()?;
                f(&paths)
            }
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn open_lock_file(paths: &Paths) -> Result<File, StoreError> {
    std::fs::create_dir_all(parent_dir(&paths.lock))?;
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock)?)
}

fn read_document(path: &Path) -> Result<Document, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(Document::default()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_document(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    serde_json::to_writer_pretty(&mut tmp, doc)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl KvStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Snapshot, StoreError> {
        let key = key.to_owned();
        self.locked(false, move |paths| {
            let doc = read_document(&paths.data)?;
            Ok(match doc.entries.get(&key) {
                Some(entry) => Snapshot {
                    version: entry.version,
                    value: Some(entry.value.clone()),
                },
                None => Snapshot::absent(),
            })
        })
        .await
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let key = key.to_owned();
        self.locked(true, move |paths| {
            let mut doc = read_document(&paths.data)?;
            let actual = doc.entries.get(&key).map(|e| e.version).unwrap_or(0);
            if actual != expected_version {
                return Err(StoreError::VersionConflict {
                    key,
                    expected: expected_version,
                    actual,
                });
            }
            let next = actual + 1;
            doc.entries.insert(
                key.clone(),
                Entry {
                    version: next,
                    value,
                },
            );
            write_document(&paths.data, &doc)?;
            tracing::debug!(key, version = next, path = %paths.data.display(), "wrote file store");
            Ok(next)
        })
        .await
    }
}
