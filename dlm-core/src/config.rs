//! Process-wide lock defaults.
//!
//! Locks constructed without an explicit table name or duration read these
//! values when they are built, so an override applies to every lock built
//! after it and to none built before.

use std::sync::{LazyLock, PoisonError, RwLock};

use crate::error::ConfigError;

pub const DEFAULT_TABLE_NAME: &str = "dlm_locks";

/// Lease length in seconds.
pub const DEFAULT_DURATION: u64 = 10;

pub const TABLE_NAME_ENV: &str = "DLM_TABLE_NAME";
pub const DURATION_ENV: &str = "DLM_DURATION_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockDefaults {
    pub table_name: String,
    /// Lease length in seconds
    pub duration: u64,
}

impl Default for LockDefaults {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            duration: DEFAULT_DURATION,
        }
    }
}

static DEFAULTS: LazyLock<RwLock<LockDefaults>> =
    LazyLock::new(|| RwLock::new(LockDefaults::default()));

/// Snapshot of the current defaults.
pub fn defaults() -> LockDefaults {
    DEFAULTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn set_defaults(defaults: LockDefaults) {
    *DEFAULTS.write().unwrap_or_else(PoisonError::into_inner) = defaults;
}

pub fn set_default_table_name(table_name: impl Into<String>) {
    DEFAULTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .table_name = table_name.into();
}

pub fn set_default_duration(duration: u64) {
    DEFAULTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .duration = duration;
}

/// Restores the built-in defaults.
pub fn reset_defaults() {
    set_defaults(LockDefaults::default());
}

/// Applies `DLM_TABLE_NAME` and `DLM_DURATION_SECS` over the current defaults.
///
/// Nothing is changed if either variable is malformed.
pub fn init_from_env() -> Result<LockDefaults, ConfigError> {
    let table_name = std::env::var(TABLE_NAME_ENV).ok();
    let duration = std::env::var(DURATION_ENV).ok();
    apply_overrides(table_name.as_deref(), duration.as_deref())
}

pub(crate) fn apply_overrides(
    table_name: Option<&str>,
    duration: Option<&str>,
) -> Result<LockDefaults, ConfigError> {
    let duration = duration
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidDuration {
                    value: raw.to_string(),
                })
        })
        .transpose()?;

    let mut guard = DEFAULTS.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(table_name) = table_name.filter(|t| !t.is_empty()) {
        guard.table_name = table_name.to_string();
    }
    if let Some(duration) = duration {
        guard.duration = duration;
    }
    Ok(guard.clone())
}
