//! # Session Storage
//!
//! In-memory key/value storage scoped to one session. Data lives as long as
//! the `SessionStorage` value (or until [`SessionStorage::end`]).
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   new() ──► NOT STARTED ──init()──► STARTED ──end()──► NOT STARTED      │
//! │                  │                     │                                │
//! │                  │ restore/save/clear  │ restore/save/clear             │
//! │                  ▼                     ▼                                │
//! │           SessionNotStarted       HashMap<key, blob>                    │
//! │                                                                         │
//! │   init() on a started session is a no-op (data is kept).               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use crate::driver::CartStorage;
use crate::error::{StorageError, StorageResult};

/// Session-backed cart storage.
#[derive(Debug)]
pub struct SessionStorage {
    session_id: Uuid,
    data: Mutex<Option<HashMap<String, Vec<u8>>>>,
}

impl SessionStorage {
    /// Creates a storage for a new, not-yet-started session.
    pub fn new() -> Self {
        SessionStorage {
            session_id: Uuid::new_v4(),
            data: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_started(&self) -> bool {
        self.data.lock().map(|d| d.is_some()).unwrap_or(false)
    }

    /// Number of keys currently stored (0 when not started).
    pub fn len(&self) -> usize {
        self.data
            .lock()
            .map(|d| d.as_ref().map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ends the session, dropping everything stored in it.
    pub fn end(&self) -> StorageResult<()> {
        let mut data = self.data.lock()?;
        *data = None;
        debug!(session_id = %self.session_id, "Session ended");
        Ok(())
    }

    fn with_started<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> R,
    ) -> StorageResult<R> {
        let mut data = self.data.lock()?;
        match data.as_mut() {
            Some(map) => Ok(f(map)),
            None => Err(StorageError::SessionNotStarted),
        }
    }
}

impl Default for SessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStorage for SessionStorage {
    fn init(&self) -> StorageResult<()> {
        let mut data = self.data.lock()?;
        if data.is_none() {
            *data = Some(HashMap::new());
            debug!(session_id = %self.session_id, "Session started");
        }
        Ok(())
    }

    fn restore(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.with_started(|map| map.get(key).cloned())
    }

    fn save(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        self.with_started(|map| {
            map.insert(key.to_string(), data.to_vec());
        })
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        self.with_started(|map| {
            map.remove(key);
        })
    }
}
