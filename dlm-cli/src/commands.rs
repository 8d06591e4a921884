use std::process::{Command, ExitCode};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use dlm_core::clock::{Clock, SystemClock};
use dlm_core::config;
use dlm_core::infrastructure_sqlite::SqliteLockStore;
use dlm_core::{DistributedLock, LockClient};

use crate::{RunArgs, StatusArgs, StoreArgs};

type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

// ─── Output Types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub resource_id: String,
    pub table: String,
    pub held: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

// ─── Commands ───────────────────────────────────────────────────────────────

/// Acquires the lock, runs the child command, releases, and mirrors the
/// child's exit status.
pub fn run(args: &RunArgs) -> CommandResult<ExitCode> {
    Ok(match run_locked(args)? {
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}

/// Returns the child's exit code, or `None` if it was killed by a signal.
fn run_locked(args: &RunArgs) -> CommandResult<Option<i32>> {
    let store = SqliteLockStore::open(&args.store.db)?;
    let client = LockClient::new(Arc::new(store));

    let mut builder = client.builder(args.resource.as_str());
    if let Some(table) = &args.store.table {
        builder = builder.table_name(table.as_str());
    }
    if let Some(duration) = args.duration {
        builder = builder.duration(duration);
    }
    let mut lock = builder.build();

    acquire(&mut lock, args.poll_ms)?;
    tracing::info!(
        resource_id = %lock.resource_id(),
        table = %lock.table_name(),
        duration = lock.duration(),
        "🔒 lock held"
    );

    let started = Instant::now();
    let status = Command::new(&args.command[0])
        .args(&args.command[1..])
        .status();

    // Release before looking at how the child went
    let released = lock.release();

    if started.elapsed() >= Duration::from_secs(lock.duration()) {
        tracing::warn!(
            resource_id = %lock.resource_id(),
            "command outlived its lease; another holder may have overlapped"
        );
    }

    let status = status?;
    released?;
    tracing::info!(resource_id = %lock.resource_id(), "🔓 lock released");

    Ok(status.code())
}

/// Prints the stored record for a resource as JSON.
pub fn status(args: &StatusArgs) -> CommandResult<()> {
    let response = lookup(&args.store, &args.resource, SystemClock.now())?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn lookup(store_args: &StoreArgs, resource: &str, now: u64) -> CommandResult<StatusResponse> {
    let store = SqliteLockStore::open_read_only(&store_args.db)
        .map_err(|err| format!("cannot open lock database {}: {}", store_args.db.display(), err))?;
    let table = store_args
        .table
        .clone()
        .unwrap_or_else(|| config::defaults().table_name);

    let response = match store.record(&table, resource)? {
        Some(record) => StatusResponse {
            held: !record.is_expired_at(now),
            expires: Some(record.expires),
            expires_in: Some(record.expires.saturating_sub(now)),
            release_code: Some(record.release_code.to_string()),
            table,
            resource_id: record.resource_id,
        },
        None => StatusResponse {
            resource_id: resource.to_string(),
            table,
            held: false,
            release_code: None,
            expires: None,
            expires_in: None,
        },
    };
    Ok(response)
}

/// With `poll_ms == 0` this is the library's immediate retry; otherwise the
/// CLI sleeps between single attempts to keep a shared database file quiet.
fn acquire(lock: &mut DistributedLock, poll_ms: u64) -> CommandResult<()> {
    if poll_ms == 0 {
        lock.acquire()?;
        return Ok(());
    }

    let pause = Duration::from_millis(poll_ms);
    let mut logged = false;
    while !lock.try_acquire()? {
        if !logged {
            tracing::info!(resource_id = %lock.resource_id(), "⏳ waiting for lock");
            logged = true;
        }
        thread::sleep(pause);
    }
    Ok(())
}
