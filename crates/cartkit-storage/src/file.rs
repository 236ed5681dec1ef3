//! # File Storage
//!
//! One file per storage key inside a directory. Survives process restarts,
//! which the session driver does not.
//!
//! ## Layout
//! ```text
//! <dir>/
//! ├── app_main.cart          ← key "app_main"
//! ├── wishlist%3A42.cart     ← key "wishlist:42" (unsafe bytes %-escaped)
//! └── ...
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write never leaves a truncated blob behind.
//!
//! ## Default Location
//! - **macOS**: `~/Library/Application Support/com.cartkit.carts/carts`
//! - **Windows**: `%APPDATA%\cartkit\carts\data\carts`
//! - **Linux**: `~/.local/share/carts/carts`

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, info};

use crate::driver::CartStorage;
use crate::error::{StorageError, StorageResult};

const BLOB_EXTENSION: &str = "cart";

/// Directory-backed cart storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    /// File storage in the platform data directory.
    pub fn in_default_dir() -> StorageResult<Self> {
        let proj_dirs =
            ProjectDirs::from("com", "cartkit", "carts").ok_or(StorageError::NoDataDir)?;
        Ok(FileStorage::new(proj_dirs.data_dir().join("carts")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob for `key`.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        Ok(self
            .dir
            .join(format!("{}.{}", encode_file_stem(key)?, BLOB_EXTENSION)))
    }
}

impl CartStorage for FileStorage {
    fn init(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        info!(dir = ?self.dir, "File storage ready");
        Ok(())
    }

    fn restore(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn save(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, data).map_err(|e| StorageError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(&path, e))?;

        debug!(key, bytes = data.len(), "Blob written");
        Ok(())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

/// Maps a key to a file stem. ASCII alphanumerics, `-` and `_` pass
/// through; every other byte becomes `%XX`, so distinct keys never collide.
fn encode_file_stem(key: &str) -> StorageResult<String> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "must not be empty"));
    }

    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    Ok(stem)
}
