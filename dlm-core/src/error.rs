use thiserror::Error;

/// Errors surfaced by lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// Release was called on a handle that holds no release code
    #[error("lock on resource '{resource_id}' is not held by this handle")]
    NotAcquired { resource_id: String },

    /// The backing store failed; propagated without retry
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Faults reported by a [`LockStore`](crate::infrastructure::LockStore).
///
/// A failed write condition is not a fault and is reported through
/// [`WriteOutcome`](crate::types::WriteOutcome) instead.
#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// Errors raised while loading process-wide defaults.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid lease duration '{value}': expected whole seconds")]
    InvalidDuration { value: String },
}

pub type Result<T, E = LockError> = std::result::Result<T, E>;
