//! Abstract storage traits for the guru miner ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The accrual engine depends only on the traits.

pub mod error;
pub mod ledger;
pub mod lock;
pub mod meta;
pub mod miner;
pub mod wallet;

pub use error::StoreError;
pub use ledger::{LedgerStore, LedgerTxn};
pub use lock::{LockGuard, LockTable};
pub use meta::MetaStore;
pub use miner::{MinerRecord, MinerState};
pub use wallet::WalletRecord;
