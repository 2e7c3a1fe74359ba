use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("timed out waiting for lock on {0}")]
    LockTimeout(String),

    #[error("row {0} is not locked by this transaction")]
    LockNotHeld(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Whether retrying the whole transaction may succeed.
    ///
    /// Corruption and serialization faults are permanent; everything else
    /// (lock contention, constraint races, backend hiccups) is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::Corruption(_) | StoreError::Serialization(_))
    }
}
