//! Accrual engine errors.

use guru_store::StoreError;
use guru_types::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccrualError {
    #[error("no miner configured for user {0}")]
    NotConfigured(UserId),

    /// Backend details stay in the `source` chain, out of the message.
    #[error("storage failure, the operation was rolled back")]
    Storage(#[source] StoreError),

    #[error("arithmetic overflow in accrual computation")]
    Overflow,

    #[error("invalid engine configuration: {0}")]
    Config(String),
}

impl From<StoreError> for AccrualError {
    fn from(e: StoreError) -> Self {
        AccrualError::Storage(e)
    }
}

impl AccrualError {
    /// Whether the caller may retry the same operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            AccrualError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}
