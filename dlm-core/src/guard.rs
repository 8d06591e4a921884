//! Scoped acquisition: the lock is released on every exit path.

use std::ops::Deref;

use tracing::warn;

use crate::error::Result;
use crate::lock::DistributedLock;

/// Holds a lock until released or dropped.
///
/// Prefer [`LockGuard::release`] where a release error matters; drop can
/// only log it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    lock: &'a mut DistributedLock,
    released: bool,
}

impl<'a> LockGuard<'a> {
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release()
    }
}

impl Deref for LockGuard<'_> {
    type Target = DistributedLock;

    fn deref(&self) -> &DistributedLock {
        &*self.lock
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.lock.release() {
            warn!(
                resource_id = %self.lock.resource_id(),
                error = %err,
                "failed to release lock on drop"
            );
        }
    }
}

impl DistributedLock {
    /// Acquires the lock and returns a guard that releases it.
    pub fn acquire_guard(&mut self) -> Result<LockGuard<'_>> {
        self.acquire()?;
        Ok(LockGuard {
            lock: self,
            released: false,
        })
    }

    /// Runs `f` while holding the lock.
    ///
    /// The lock is released before this returns, including when `f` panics.
    /// `f`'s value is returned only once release has succeeded; a release
    /// error takes its place.
    pub fn with_lock<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let guard = self.acquire_guard()?;
        let value = f();
        guard.release()?;
        Ok(value)
    }
}
