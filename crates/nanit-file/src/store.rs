//! Token storage in a single JSON file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument};

use nanit_core::error::StorageError;
use nanit_core::{Error, Result, TokenStorage};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

type Entries = BTreeMap<String, String>;

/// [`TokenStorage`] backed by a JSON object on disk.
///
/// Writes go to a sibling temp file which is renamed over the original, so a
/// crash never leaves a half-written file. A `.lock` file next to it
/// serialises writers across processes. On Unix the file is created with
/// mode 0600.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file, and the lock file if present.
    pub fn destroy(&self) -> Result<()> {
        for path in [self.path.clone(), self.lock_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(self.io_error(&path, e)),
            }
        }
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }

    fn io_error(&self, path: &Path, err: std::io::Error) -> Error {
        StorageError::Io {
            location: path.display().to_string(),
            message: err.to_string(),
        }
        .into()
    }

    fn read_entries(&self) -> Result<Entries> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        if json.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&json).map_err(|e| {
            StorageError::Corrupt {
                location: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt {
            location: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let temp = self.temp_path();
        let mut file = private_file(&temp).map_err(|e| self.io_error(&temp, e))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| self.io_error(&temp, e))?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(|e| self.io_error(&self.path, e))
    }

    /// Run a read-modify-write under the lock file.
    fn update(&self, f: impl FnOnce(&mut Entries) -> bool) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| self.io_error(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| self.io_error(&lock_path, e))?;

        let result = self.read_entries().and_then(|mut entries| {
            if f(&mut entries) {
                self.write_entries(&entries)
            } else {
                Ok(())
            }
        });

        lock_file
            .unlock()
            .map_err(|e| self.io_error(&lock_path, e))?;
        result
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Writing token");
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        debug!("Removing token");
        self.update(|entries| entries.remove(key).is_some())
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

fn private_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let file = options.open(path)?;

    // `mode` only applies on creation; tighten a leftover temp file too.
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(0o600))?;

    Ok(file)
}
