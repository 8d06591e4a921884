//! # dlm-core
//!
//! Lease-based distributed mutual exclusion over any key-value store that
//! offers atomic conditional writes. Holders prove ownership with a random
//! release code; crashed holders are recovered by lease expiry alone.

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod infrastructure;
#[path = "infrastructure_in_memory.rs"]
pub mod infrastructure_in_memory;
#[cfg(feature = "sqlite")]
#[path = "infrastructure_sqlite.rs"]
pub mod infrastructure_sqlite;
pub mod lock;
pub mod types;

pub use client::LockClient;
pub use error::{ConfigError, LockError, Result, StoreError};
pub use guard::LockGuard;
pub use lock::{DistributedLock, LockBuilder};

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod guard_test;
