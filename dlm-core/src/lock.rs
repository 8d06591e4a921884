//! The acquisition/release protocol.
//!
//! A [`DistributedLock`] is a client-side handle bound to one resource in one
//! table. Mutual exclusion comes entirely from the store's conditional
//! writes: acquiring is a put that only lands when no live record exists,
//! and releasing is a delete that only lands for the holder's release code.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config;
use crate::error::{LockError, Result};
use crate::infrastructure::LockStore;
use crate::types::{LockRecord, ReleaseCode, WriteOutcome};

pub struct DistributedLock {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    resource_id: String,
    table_name: String,
    /// Lease length in seconds
    duration: u64,
    /// Present only while held
    release_code: Option<ReleaseCode>,
}

impl DistributedLock {
    /// Creates an unacquired handle using the current process-wide defaults.
    pub fn new(store: Arc<dyn LockStore>, resource_id: impl Into<String>) -> Self {
        Self::builder(store, resource_id).build()
    }

    pub fn builder(store: Arc<dyn LockStore>, resource_id: impl Into<String>) -> LockBuilder {
        LockBuilder {
            store,
            resource_id: resource_id.into(),
            table_name: None,
            duration: None,
            clock: None,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn release_code(&self) -> Option<&ReleaseCode> {
        self.release_code.as_ref()
    }

    pub fn is_held(&self) -> bool {
        self.release_code.is_some()
    }

    /// Makes a single conditional put. Returns `false` if another live lease
    /// holds the resource.
    pub fn try_acquire(&mut self) -> Result<bool> {
        if self.release_code.is_some() {
            warn!(
                resource_id = %self.resource_id,
                "acquiring a lock this handle already holds"
            );
        }

        let now = self.clock.now();
        let code = ReleaseCode::generate();
        let record = LockRecord::new(self.resource_id.clone(), code.clone(), now, self.duration);

        match self
            .store
            .put_if_absent_or_expired(&self.table_name, &record, now)?
        {
            WriteOutcome::Applied => {
                self.release_code = Some(code);
                Ok(true)
            }
            WriteOutcome::ConditionFailed => Ok(false),
        }
    }

    /// Blocks until the lock is held.
    ///
    /// Retries immediately for as long as another live lease exists, so the
    /// wait is bounded by the current holder's remaining lease. Store faults
    /// are returned without retry.
    pub fn acquire(&mut self) -> Result<()> {
        let mut attempts: u64 = 1;
        while !self.try_acquire()? {
            trace!(resource_id = %self.resource_id, attempts, "lock contended");
            attempts += 1;
        }

        debug!(
            resource_id = %self.resource_id,
            table = %self.table_name,
            attempts,
            "lock acquired"
        );
        Ok(())
    }

    /// Deletes the record if this handle still owns it.
    ///
    /// A record already taken over by another acquirer after this lease
    /// expired counts as released. On a store fault the release code is
    /// kept, so release may be retried.
    pub fn release(&mut self) -> Result<()> {
        let Some(code) = self.release_code.as_ref() else {
            return Err(LockError::NotAcquired {
                resource_id: self.resource_id.clone(),
            });
        };

        let outcome = self
            .store
            .delete_if_owner(&self.table_name, &self.resource_id, code)?;
        self.release_code = None;

        match outcome {
            WriteOutcome::Applied => {
                debug!(resource_id = %self.resource_id, "lock released");
            }
            WriteOutcome::ConditionFailed => {
                debug!(
                    resource_id = %self.resource_id,
                    "lease was superseded before release"
                );
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DistributedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLock")
            .field("resource_id", &self.resource_id)
            .field("table_name", &self.table_name)
            .field("duration", &self.duration)
            .field("held", &self.is_held())
            .finish()
    }
}

/// Builds a [`DistributedLock`]. Settings left unset are read from
/// [`config::defaults`] when [`LockBuilder::build`] runs.
pub struct LockBuilder {
    store: Arc<dyn LockStore>,
    resource_id: String,
    table_name: Option<String>,
    duration: Option<u64>,
    clock: Option<Arc<dyn Clock>>,
}

impl LockBuilder {
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Lease length in seconds.
    pub fn duration(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> DistributedLock {
        let defaults = config::defaults();
        DistributedLock {
            store: self.store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            resource_id: self.resource_id,
            table_name: self.table_name.unwrap_or(defaults.table_name),
            duration: self.duration.unwrap_or(defaults.duration),
            release_code: None,
        }
    }
}
