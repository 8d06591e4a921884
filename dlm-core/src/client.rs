//! High-level client that binds a store and a clock once and hands out
//! locks on individual resources.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::infrastructure::LockStore;
use crate::infrastructure_in_memory::InMemoryLockStore;
use crate::lock::{DistributedLock, LockBuilder};

#[derive(Clone)]
pub struct LockClient {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
}

impl LockClient {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// A client over a fresh process-local store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLockStore::new()))
    }

    /// A client over a SQLite database file, shared by every process that
    /// opens the same path.
    #[cfg(feature = "sqlite")]
    pub fn with_sqlite(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::StoreError> {
        let store = crate::infrastructure_sqlite::SqliteLockStore::open(path)?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<dyn LockStore> {
        &self.store
    }

    /// An unacquired lock on `resource_id` using the current defaults.
    pub fn lock(&self, resource_id: impl Into<String>) -> DistributedLock {
        self.builder(resource_id).build()
    }

    pub fn builder(&self, resource_id: impl Into<String>) -> LockBuilder {
        DistributedLock::builder(self.store.clone(), resource_id).clock(self.clock.clone())
    }
}

impl std::fmt::Debug for LockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockClient").finish_non_exhaustive()
    }
}
