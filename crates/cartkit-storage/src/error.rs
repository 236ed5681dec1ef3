//! # Storage Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / mutex poisoning / session not started                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageError (this module) ← Adds key / path context                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ManagerError::Storage (cartkit-manager)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Storage driver errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A session-backed driver was used before `init()`.
    #[error("Session not started")]
    SessionNotStarted,

    /// File system operation failed.
    ///
    /// ## When This Occurs
    /// - Storage directory can't be created (permissions, disk full)
    /// - Blob file unreadable
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A lock around driver state was poisoned by a panicking thread.
    #[error("Storage state poisoned")]
    Poisoned,

    /// Key can't be used by this driver.
    #[error("Invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Driver setup failed during registration.
    #[error("Driver '{driver}' failed to initialize: {reason}")]
    InitFailed { driver: String, reason: String },

    /// Another driver is already registered under this name.
    #[error("Driver '{0}' is already registered")]
    DuplicateDriver(String),

    /// No platform data directory could be determined.
    #[error("Could not determine a data directory")]
    NoDataDir,
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StorageError::Poisoned
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
