//! In-process stand-ins for the clock and the ledger store.
//!
//! The engine only sees the `Clock` and `LedgerStore` traits, so tests swap
//! in these: time moves only when a test says so, rows live in memory, and
//! commit failures can be injected on demand.

pub mod clock;
pub mod store;

pub use clock::NullClock;
pub use store::{NullLedgerStore, NullLedgerTxn, RowKey};
