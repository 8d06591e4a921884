use std::sync::Arc;

use crate::error::StoreError;
use crate::types::{LockRecord, ReleaseCode, WriteOutcome};

/// The conditional-write capability a lock store must provide.
///
/// Both operations must be atomic on the store side. A condition that does
/// not hold is reported as [`WriteOutcome::ConditionFailed`], never as an
/// error, so callers can tell contention apart from faults.
pub trait LockStore: Send + Sync {
    /// Write `record` into `table` if no record exists for its resource, or
    /// the existing record's `expires` is at or before `now`. An applied
    /// write replaces any prior record.
    fn put_if_absent_or_expired(
        &self,
        table: &str,
        record: &LockRecord,
        now: u64,
    ) -> Result<WriteOutcome, StoreError>;

    /// Delete the record for `resource_id` if its stored release code equals
    /// `release_code`. A missing record fails the condition.
    fn delete_if_owner(
        &self,
        table: &str,
        resource_id: &str,
        release_code: &ReleaseCode,
    ) -> Result<WriteOutcome, StoreError>;
}

impl<S: LockStore + ?Sized> LockStore for Arc<S> {
    fn put_if_absent_or_expired(
        &self,
        table: &str,
        record: &LockRecord,
        now: u64,
    ) -> Result<WriteOutcome, StoreError> {
        (**self).put_if_absent_or_expired(table, record, now)
    }

    fn delete_if_owner(
        &self,
        table: &str,
        resource_id: &str,
        release_code: &ReleaseCode,
    ) -> Result<WriteOutcome, StoreError> {
        (**self).delete_if_owner(table, resource_id, release_code)
    }
}
