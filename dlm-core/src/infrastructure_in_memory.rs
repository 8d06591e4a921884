use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::infrastructure::LockStore;
use crate::types::{LockRecord, ReleaseCode, WriteOutcome};

type RecordKey = (String, String);

/// A process-local store. Every conditional write runs under one mutex,
/// which makes it atomic with respect to all other writes.
#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    // (table, resource_id) -> record
    records: Mutex<HashMap<RecordKey, LockRecord>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for a resource, expired or not.
    pub fn record(&self, table: &str, resource_id: &str) -> Option<LockRecord> {
        self.records()
            .get(&(table.to_string(), resource_id.to_string()))
            .cloned()
    }

    /// Number of stored records across all tables.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> MutexGuard<'_, HashMap<RecordKey, LockRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockStore for InMemoryLockStore {
    fn put_if_absent_or_expired(
        &self,
        table: &str,
        record: &LockRecord,
        now: u64,
    ) -> Result<WriteOutcome, StoreError> {
        let mut records = self.records();
        let key = (table.to_string(), record.resource_id.clone());

        match records.get(&key) {
            Some(existing) if !existing.is_expired_at(now) => Ok(WriteOutcome::ConditionFailed),
            _ => {
                records.insert(key, record.clone());
                Ok(WriteOutcome::Applied)
            }
        }
    }

    fn delete_if_owner(
        &self,
        table: &str,
        resource_id: &str,
        release_code: &ReleaseCode,
    ) -> Result<WriteOutcome, StoreError> {
        let mut records = self.records();
        let key = (table.to_string(), resource_id.to_string());

        match records.get(&key) {
            Some(existing) if existing.release_code == *release_code => {
                records.remove(&key);
                Ok(WriteOutcome::Applied)
            }
            _ => Ok(WriteOutcome::ConditionFailed),
        }
    }
}
