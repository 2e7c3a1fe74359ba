//! Accrual engine: time-based mining rewards settled into wallets.
//!
//! A running miner accrues `Δt × hash_rate × reward_rate`, measured from its
//! checkpoint. Nothing is credited until a settlement (`stop` or `claim`)
//! moves the accrued value into the wallet and advances the checkpoint in
//! the same storage transaction.
//!
//! This crate handles:
//! - The pure reward formula, including clock-skew clamping
//! - Start / stop / claim state transitions under row locks
//! - Read-only status previews that match what a claim would settle

pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod reward;
pub mod stats;

pub use config::EngineConfig;
pub use engine::AccrualEngine;
pub use error::AccrualError;
pub use outcome::{MinerStatus, Settlement, StartOutcome, StopOutcome};
pub use reward::Accrual;
pub use stats::StatsSnapshot;
