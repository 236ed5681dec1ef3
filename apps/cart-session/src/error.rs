//! # CLI Error Types
//!
//! Everything `cart-session` can fail with. Library errors are wrapped
//! as-is; the binary prints the message and exits non-zero.

use std::path::PathBuf;

use cartkit_core::CoreError;
use cartkit_manager::ManagerError;
use cartkit_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Bad or missing arguments. The message is shown with the usage text.
    #[error("{0}")]
    Usage(String),

    #[error("Failed to read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(message.into())
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, CliError::Usage(_))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
