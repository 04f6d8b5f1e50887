//! Object-store port.
//!
//! The engine only ever reads, writes, lists, and removes byte blobs by
//! path. A local filesystem backend covers the CLI; the in-memory backend
//! covers unit tests. Remote backends (S3 and friends) live outside this
//! crate behind the same trait.
//!
//! Paths are relative, `/`-separated, with no leading slash. A read of a
//! missing path is `None`, not an error; only real I/O failures surface
//! as errors. Consistency is single-process read-after-write; nothing more
//! is guaranteed or required.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sc_common::Result;

/// Abstract key/value-of-bytes store.
pub trait ObjectStore {
    /// Read the blob at `path`. `None` if absent.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Write (or overwrite) the blob at `path`.
    fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// All blob paths under `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// All blob paths under `prefix` with their last-modified times, sorted.
    fn list_with_modified(&self, prefix: &str) -> Result<Vec<(String, DateTime<Utc>)>>;

    /// Remove the blob or subtree at `path`. Removing an absent path is a no-op.
    fn remove(&self, path: &str) -> Result<()>;
}

/// Filesystem-backed store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    basedir: PathBuf,
}

impl LocalStore {
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
        }
    }

    fn abspath(&self, path: &str) -> PathBuf {
        self.basedir.join(path)
    }

    fn walk(&self, dir: &Path, out: &mut Vec<(String, DateTime<Utc>)>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, out)?;
            } else if let Ok(rel) = path.strip_prefix(&self.basedir) {
                let name = rel.to_string_lossy().replace('\\', "/");
                let modified = entry.metadata()?.modified()?;
                out.push((name, DateTime::<Utc>::from(modified)));
            }
        }
        Ok(())
    }
}

impl ObjectStore for LocalStore {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.abspath(path)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let abspath = self.abspath(path);
        if let Some(parent) = abspath.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(abspath, data)?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .list_with_modified(prefix)?
            .into_iter()
            .map(|(path, _)| path)
            .collect())
    }

    fn list_with_modified(&self, prefix: &str) -> Result<Vec<(String, DateTime<Utc>)>> {
        let root = self.abspath(prefix);
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        self.walk(&root, &mut out)?;
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn remove(&self, path: &str) -> Result<()> {
        let abspath = self.abspath(path);
        let result = if abspath.is_dir() {
            fs::remove_dir_all(abspath)
        } else {
            fs::remove_file(abspath)
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for unit tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, (Vec<u8>, DateTime<Utc>)>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ObjectStore for MemoryStore {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.locked().get(path).map(|(data, _)| data.clone()))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.locked()
            .insert(path.to_string(), (data.to_vec(), Utc::now()));
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .locked()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn list_with_modified(&self, prefix: &str) -> Result<Vec<(String, DateTime<Utc>)>> {
        Ok(self
            .locked()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (_, modified))| (key.clone(), *modified))
            .collect())
    }

    fn remove(&self, path: &str) -> Result<()> {
        let mut blobs = self.locked();
        let subtree = format!("{}/", path.trim_end_matches('/'));
        blobs.retain(|key, _| key != path && !key.starts_with(&subtree));
        Ok(())
    }
}
