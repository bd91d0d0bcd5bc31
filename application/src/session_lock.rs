//! Per-session mutual exclusion.
//!
//! A lease serializes read-state → run-turn → write-state for one session.
//! Different sessions never contend.

use crate::ports::session_store::ProfileId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Held for the duration of one turn; released on drop.
pub struct SessionLease {
    id: ProfileId,
    _guard: OwnedMutexGuard<()>,
}

impl SessionLease {
    pub fn id(&self) -> ProfileId {
        self.id
    }
}

#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<ProfileId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: ProfileId) -> SessionLease {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody holds or waits on
            locks.retain(|key, lock| *key == id || Arc::strong_count(lock) > 1);
            locks.entry(id).or_default().clone()
        };
        SessionLease {
            id,
            _guard: lock.lock_owned().await,
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
