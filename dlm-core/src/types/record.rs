use serde::{Deserialize, Serialize};

use super::ReleaseCode;

/// Latest representable expiry. Stores with signed 64-bit integers (SQLite)
/// can hold every value up to here.
pub const MAX_EXPIRES: u64 = i64::MAX as u64;

/// The stored lock record, one per resource and table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Primary key: identity of the protected resource
    pub resource_id: String,
    /// Token the holder must present to delete the record
    pub release_code: ReleaseCode,
    /// Epoch seconds after which any acquirer may overwrite the record
    pub expires: u64,
}

impl LockRecord {
    /// `expires` is `now + duration`, clamped to [`MAX_EXPIRES`].
    pub fn new(
        resource_id: impl Into<String>,
        release_code: ReleaseCode,
        now: u64,
        duration: u64,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            release_code,
            expires: now.saturating_add(duration).min(MAX_EXPIRES),
        }
    }

    /// Whether the record may be overwritten at `now`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires <= now
    }
}

/// Result of a conditional write against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The condition held and the write was applied
    Applied,
    /// The condition did not hold; nothing was written
    ConditionFailed,
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }
}
