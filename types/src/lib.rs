//! Fundamental types for the guru miner ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! user identifiers, fixed-point amounts and hash rates, timestamps and clocks.

pub mod amount;
pub mod decimal;
pub mod error;
pub mod hash_rate;
pub mod time;
pub mod user;

pub use amount::Amount;
pub use error::GuruError;
pub use hash_rate::HashRate;
pub use time::{Clock, SystemClock, Timestamp};
pub use user::UserId;
