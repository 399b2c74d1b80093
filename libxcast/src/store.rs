//! Shared persistence for the JSON state files
//!
//! Both stores follow the same lifecycle: take the file lock, load the
//! document, mutate it in memory, and write it back before releasing the
//! lock. Reads and writes here return `StoreError`; the stores decide how to
//! degrade (`load_or_default`, `save_best_effort`).
//!
//! Writes go to a temporary file in the same directory which is then
//! renamed over the target, so a reader never sees a half-written document.
//! An advisory lock on `<file>.lock` serializes overlapping invocations.

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Held advisory lock; released on drop.
#[derive(Debug)]
pub struct StateLock {
    file: File,
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// A JSON document on disk.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.dir().join(name)
    }

    /// Lock for a read-only view. Never creates anything, so it works on a
    /// read-only state directory. Returns `None` when no writer has created
    /// the lock file yet or the lock could not be taken.
    pub fn lock_shared(&self) -> Option<StateLock> {
        let lock_path = self.lock_path();
        let attempt = || -> std::io::Result<File> {
            let file = File::open(&lock_path)?;
            FileExt::lock_shared(&file)?;
            Ok(file)
        };

        match attempt() {
            Ok(file) => Some(StateLock { file }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!("Reading {} unlocked: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Lock for a load-mutate-save sequence. Creates the state directory.
    /// On failure the caller proceeds unlocked.
    pub fn lock_exclusive(&self) -> Option<StateLock> {
        let lock_path = self.lock_path();
        let attempt = || -> std::io::Result<File> {
            std::fs::create_dir_all(self.dir())?;
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)?;
            FileExt::lock_exclusive(&file)?;
            Ok(file)
        };

        match attempt() {
            Ok(file) => Some(StateLock { file }),
            Err(e) => {
                tracing::warn!(
                    "Could not lock {}, continuing without it: {}",
                    lock_path.display(),
                    e
                );
                None
            }
        }
    }

    /// Read and parse the document. `Ok(None)` when the file does not exist.
    pub fn read<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Serialize and atomically replace the document.
    pub fn write<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, value)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    /// Missing or unreadable documents load as `T::default()`.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self) -> T {
        match self.read() {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable state file {}: {}",
                    self.path.display(),
                    e
                );
                T::default()
            }
        }
    }

    /// Write failures are logged and dropped; the caller's action has
    /// already happened and must not fail because of bookkeeping.
    pub fn save_best_effort<T: Serialize>(&self, value: &T) {
        if let Err(e) = self.write(value) {
            tracing::warn!("Failed to save state file {}: {}", self.path.display(), e);
        }
    }
}
