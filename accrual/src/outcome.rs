//! Results returned by engine operations.

use guru_store::{MinerRecord, MinerState, WalletRecord};
use guru_types::{Amount, Timestamp};
use serde::Serialize;

/// Acknowledgement of a `start`. Every variant is a success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    /// First start: the miner row was created.
    Created,
    /// A stopped miner was set running again.
    Resumed,
    /// The miner was already running; nothing changed.
    AlreadyActive,
}

/// Value moved into a wallet by one `stop` or `claim`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub accrued: Amount,
    /// Wallet balance after the credit.
    pub balance: Amount,
    pub elapsed_millis: u64,
    pub settled_at: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped(Settlement),
    /// No miner, or the miner was not running. Nothing was written.
    AlreadyStopped,
}

impl StopOutcome {
    /// Amount settled by this stop; zero for a no-op.
    pub fn accrued(&self) -> Amount {
        match self {
            StopOutcome::Stopped(s) => s.accrued,
            StopOutcome::AlreadyStopped => Amount::ZERO,
        }
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        match self {
            StopOutcome::Stopped(s) => Some(s),
            StopOutcome::AlreadyStopped => None,
        }
    }
}

/// Read-only view of a user's miner and wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MinerStatus {
    pub miner: Option<MinerRecord>,
    pub wallet: Option<WalletRecord>,
    /// What a `claim` issued at `as_of` would settle. Not persisted.
    pub accrued: Amount,
    pub as_of: Timestamp,
}

impl MinerStatus {
    /// Settled balance; a user without a wallet row has zero.
    pub fn balance(&self) -> Amount {
        self.wallet.as_ref().map(|w| w.balance).unwrap_or(Amount::ZERO)
    }

    pub fn state(&self) -> Option<MinerState> {
        self.miner.as_ref().map(MinerRecord::state)
    }
}
