//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for value parsing and validation.
#[derive(Debug, Error)]
pub enum GuruError {
    #[error("invalid decimal value: {0}")]
    InvalidDecimal(String),

    #[error("invalid hash rate: {0}")]
    InvalidHashRate(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),
}
