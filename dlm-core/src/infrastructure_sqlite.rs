//! SQLite-backed LockStore implementation.
//! Lets processes on one host coordinate through a shared database file.
//!
//! Enable with the `sqlite` feature flag:
//! ```toml
//! dlm-core = { path = "../dlm-core", features = ["sqlite"] }
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::error::StoreError;
use crate::infrastructure::LockStore;
use crate::types::{LockRecord, ReleaseCode, WriteOutcome};

/// How long a statement waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A persistent lock store backed by SQLite.
///
/// All logical tables share one physical table keyed by
/// `(table_name, resource_id)`. Each conditional write is a single
/// statement, so SQLite's write lock makes it atomic across connections.
pub struct SqliteLockStore {
    conn: Mutex<Connection>,
}

impl SqliteLockStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;

        // WAL keeps readers off the writer's lock
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init(conn)
    }

    /// Open an existing database for inspection only. Fails if the file
    /// does not exist; nothing is created and the journal mode is untouched.
    /// Writes through the returned store fail as store faults.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS lock_records (
                table_name   TEXT NOT NULL,
                resource_id  TEXT NOT NULL,
                release_code TEXT NOT NULL,
                expires      INTEGER NOT NULL,
                PRIMARY KEY (table_name, resource_id)
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Current record for a resource, expired or not.
    pub fn record(
        &self,
        table: &str,
        resource_id: &str,
    ) -> Result<Option<LockRecord>, StoreError> {
        let record = self
            .conn()
            .query_row(
                "SELECT resource_id, release_code, expires FROM lock_records
                 WHERE table_name = ?1 AND resource_id = ?2",
                params![table, resource_id],
                |row| {
                    Ok(LockRecord {
                        resource_id: row.get(0)?,
                        release_code: ReleaseCode::from(row.get::<_, String>(1)?),
                        expires: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockStore for SqliteLockStore {
    fn put_if_absent_or_expired(
        &self,
        table: &str,
        record: &LockRecord,
        now: u64,
    ) -> Result<WriteOutcome, StoreError> {
        // An upsert whose WHERE clause is false leaves the row untouched and
        // reports zero changes.
        let changed = self.conn().execute(
            "INSERT INTO lock_records (table_name, resource_id, release_code, expires)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (table_name, resource_id) DO UPDATE
                SET release_code = excluded.release_code,
                    expires = excluded.expires
                WHERE lock_records.expires <= ?5",
            params![
                table,
                record.resource_id,
                record.release_code.as_str(),
                record.expires,
                now,
            ],
        )?;

        Ok(if changed > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::ConditionFailed
        })
    }

    fn delete_if_owner(
        &self,
        table: &str,
        resource_id: &str,
        release_code: &ReleaseCode,
    ) -> Result<WriteOutcome, StoreError> {
        let changed = self.conn().execute(
            "DELETE FROM lock_records
             WHERE table_name = ?1 AND resource_id = ?2 AND release_code = ?3",
            params![table, resource_id, release_code.as_str()],
        )?;

        Ok(if changed > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::ConditionFailed
        })
    }
}
