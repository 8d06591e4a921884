//! A scripted store that records every call, for asserting exact protocol
//! traffic.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::infrastructure::LockStore;
use crate::types::{LockRecord, ReleaseCode, WriteOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put {
        table: String,
        record: LockRecord,
        now: u64,
    },
    Delete {
        table: String,
        resource_id: String,
        release_code: ReleaseCode,
    },
}

/// Scripted reply. Once a script runs dry every call is applied.
pub enum Reply {
    Outcome(WriteOutcome),
    Fault(&'static str),
}

#[derive(Default)]
pub struct ScriptedStore {
    puts: Mutex<VecDeque<Reply>>,
    deletes: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_puts(&self, replies: impl IntoIterator<Item = Reply>) {
        self.puts.lock().unwrap().extend(replies);
    }

    pub fn script_deletes(&self, replies: impl IntoIterator<Item = Reply>) {
        self.deletes.lock().unwrap().extend(replies);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Put { .. }))
            .collect()
    }

    pub fn deletes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Delete { .. }))
            .collect()
    }

    fn reply(queue: &Mutex<VecDeque<Reply>>) -> Result<WriteOutcome, StoreError> {
        match queue.lock().unwrap().pop_front() {
            None => Ok(WriteOutcome::Applied),
            Some(Reply::Outcome(outcome)) => Ok(outcome),
            Some(Reply::Fault(message)) => Err(StoreError::backend(message)),
        }
    }
}

impl LockStore for ScriptedStore {
    fn put_if_absent_or_expired(
        &self,
        table: &str,
        record: &LockRecord,
        now: u64,
    ) -> Result<WriteOutcome, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Put {
            table: table.to_string(),
            record: record.clone(),
            now,
        });
        Self::reply(&self.puts)
    }

    fn delete_if_owner(
        &self,
        table: &str,
        resource_id: &str,
        release_code: &ReleaseCode,
    ) -> Result<WriteOutcome, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Delete {
            table: table.to_string(),
            resource_id: resource_id.to_string(),
            release_code: release_code.clone(),
        });
        Self::reply(&self.deletes)
    }
}
