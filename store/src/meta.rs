//! Metadata storage trait.

use crate::StoreError;

/// Trait for storing database metadata (schema version and the like).
///
/// A generic key-value store for internal bookkeeping that doesn't belong
/// with the miner or wallet rows.
pub trait MetaStore {
    /// Store a metadata value.
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve a metadata value, if present.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Get the current database schema version. A fresh database reports 0.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    /// Set the database schema version.
    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
