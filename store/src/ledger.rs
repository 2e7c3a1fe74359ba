//! Transactional miner/wallet storage.
//!
//! A backend hands out write transactions. Inside one, a row must be locked
//! before it is read for modification or written; the lock is held until
//! the transaction commits or is dropped. Dropping a transaction without
//! committing rolls back every write made through it.

use crate::{MinerRecord, StoreError, WalletRecord};
use guru_types::UserId;

/// A storage backend for miner and wallet rows.
pub trait LedgerStore: Send + Sync {
    /// Write transaction handle; rolled back on drop.
    type Txn<'a>: LedgerTxn
    where
        Self: 'a;

    /// Begin a write transaction.
    fn begin(&self) -> Result<Self::Txn<'_>, StoreError>;

    /// Unlocked point lookup of a miner row (committed state only).
    fn get_miner(&self, user: &UserId) -> Result<Option<MinerRecord>, StoreError>;

    /// Unlocked point lookup of a wallet row (committed state only).
    fn get_wallet(&self, user: &UserId) -> Result<Option<WalletRecord>, StoreError>;
}

/// Operations available inside a write transaction.
pub trait LedgerTxn {
    /// Take the exclusive lock on the user's miner row and read it.
    ///
    /// The lock is obtainable whether or not the row exists yet, so a
    /// create-if-absent runs entirely under it.
    fn lock_miner(&mut self, user: &UserId) -> Result<Option<MinerRecord>, StoreError>;

    /// Take the exclusive lock on the user's wallet row and read it.
    fn lock_wallet(&mut self, user: &UserId) -> Result<Option<WalletRecord>, StoreError>;

    /// Insert a new miner row. Fails with `Duplicate` if one exists.
    fn insert_miner(&mut self, record: &MinerRecord) -> Result<(), StoreError>;

    /// Overwrite an existing miner row. Fails with `NotFound` if absent.
    fn update_miner(&mut self, record: &MinerRecord) -> Result<(), StoreError>;

    /// Insert a new wallet row. Fails with `Duplicate` if one exists.
    fn insert_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError>;

    /// Overwrite an existing wallet row. Fails with `NotFound` if absent.
    fn update_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError>;

    /// Atomically apply every write and release all locks.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;

    /// Discard every write and release all locks.
    fn rollback(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}
