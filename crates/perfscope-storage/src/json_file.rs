//! Whole-file JSON snapshot backend.
//!
//! Every write takes an exclusive `fd-lock` on `<path>.lock`, re-reads the
//! file, applies the one changed entry, and renames a sibling temp file over
//! the target. Writers in other processes therefore never lose each other's
//! entries. A process's cached view is still only read at open, so entries
//! written elsewhere afterwards are not visible to it until it reopens.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use perfscope_core::errors::StorageError;
use serde_json::Value;

use crate::backend::{Entries, PersistenceBackend};

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    fn io_err(path: &Path, e: impl ToString) -> StorageError {
        StorageError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

impl PersistenceBackend for JsonFileBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    fn load(&self) -> Result<Entries, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(Self::io_err(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&content).map_err(|e| StorageError::Serialization {
            message: format!("{}: {e}", self.path.display()),
        })
    }

    fn write(&self, namespace: &str, key: &str, value: Option<&Value>, _snapshot: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Self::io_err(&lock_path, e))?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write().map_err(|e| Self::io_err(&lock_path, e))?;

        let mut on_disk = self.load()?;
        match value {
            Some(value) => {
                on_disk
                    .entry(namespace.to_string())
                    .or_default()
                    .insert(key.to_string(), value.clone());
            }
            None => {
                if let Some(ns) = on_disk.get_mut(namespace) {
                    ns.remove(key);
                    if ns.is_empty() {
                        on_disk.remove(namespace);
                    }
                }
            }
        }

        let json = serde_json::to_vec_pretty(&on_disk)
            .map_err(|e| StorageError::Serialization { message: e.to_string() })?;
        let tmp_path = sibling(&self.path, "tmp");
        let mut tmp = fs::File::create(&tmp_path).map_err(|e| Self::io_err(&tmp_path, e))?;
        tmp.write_all(&json).map_err(|e| Self::io_err(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| Self::io_err(&tmp_path, e))?;
        drop(tmp);
        fs::rename(&tmp_path, &self.path).map_err(|e| Self::io_err(&self.path, e))?;
        Ok(())
    }
}
