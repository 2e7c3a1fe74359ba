//! LMDB storage backend for the guru miner ledger.
//!
//! Implements the `guru-store` traits using the `heed` LMDB bindings.
//! Miners, wallets and metadata each live in their own named database
//! within a single environment.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod ledger;
pub mod meta;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use ledger::{LmdbLedgerStore, LmdbLedgerTxn};
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
