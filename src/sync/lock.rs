//! Per-instance mutual exclusion for sync runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::catalog::InstanceId;

/// Registry of one async lock per instance.
///
/// Two runs against the same instance interleave catalog writes and can
/// trip the uniqueness constraints. Hold the guard for the whole run.
#[derive(Debug, Clone, Default)]
pub struct InstanceLocks {
    locks: Arc<Mutex<HashMap<InstanceId, Arc<AsyncMutex<()>>>>>,
}

impl InstanceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, instance: InstanceId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(instance).or_default().clone()
    }

    /// Wait until no other run holds `instance`.
    pub async fn acquire(&self, instance: InstanceId) -> OwnedMutexGuard<()> {
        self.lock_for(instance).lock_owned().await
    }

    /// Take the lock only if it is free.
    pub fn try_acquire(&self, instance: InstanceId) -> Option<OwnedMutexGuard<()>> {
        self.lock_for(instance).try_lock_owned().ok()
    }
}
