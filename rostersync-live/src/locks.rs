//! Per-student exclusive locks.

use crate::error::{LiveError, LiveResult};
use rostersync_types::SessionId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Natural identity of a student: external id within an academic session.
///
/// Works for students that do not exist in the store yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub session_id: SessionId,
    pub external_id: String,
}

impl LockKey {
    pub fn new(session_id: SessionId, external_id: impl Into<String>) -> Self {
        Self {
            session_id,
            external_id: external_id.into(),
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.external_id, self.session_id)
    }
}

type LockTable = Arc<Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>>;

fn table(map: &LockTable) -> MutexGuard<'_, HashMap<LockKey, Arc<AsyncMutex<()>>>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Table of per-student locks.
///
/// Entries are created on demand and pruned once nobody holds or waits
/// for them.
#[derive(Debug, Clone, Default)]
pub struct StudentLocks {
    entries: LockTable,
}

impl StudentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is free and takes it.
    pub async fn acquire(&self, key: LockKey) -> StudentLock {
        let entry = table(&self.entries).entry(key.clone()).or_default().clone();
        let guard = entry.lock_owned().await;
        debug!("Locked student {}", key);
        StudentLock {
            key,
            guard: Some(guard),
            entries: Arc::clone(&self.entries),
        }
    }

    /// Like [`StudentLocks::acquire`], giving up after `timeout`.
    pub async fn acquire_timeout(&self, key: LockKey, timeout: Duration) -> LiveResult<StudentLock> {
        tokio::time::timeout(timeout, self.acquire(key.clone()))
            .await
            .map_err(|_| LiveError::LockTimeout(key))
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        table(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A held student lock. Released by [`StudentLock::release`] or on drop.
#[derive(Debug)]
pub struct StudentLock {
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
    entries: LockTable,
}

impl StudentLock {
    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Releases the lock. Calling it again is a no-op.
    pub fn release(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        drop(guard);

        let mut entries = table(&self.entries);
        // Only the table itself still references an idle entry.
        if entries
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            entries.remove(&self.key);
        }
        debug!("Released student {}", self.key);
    }
}

impl Drop for StudentLock {
    fn drop(&mut self) {
        self.release();
    }
}
