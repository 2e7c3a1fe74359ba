//! Wallet record holding the settled balance.

use guru_types::{Amount, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// One row per user. `balance` only ever grows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub user_id: UserId,
    pub balance: Amount,
    pub updated_at: Timestamp,
}

impl WalletRecord {
    pub fn new(user_id: UserId, balance: Amount, updated_at: Timestamp) -> Self {
        Self {
            user_id,
            balance,
            updated_at,
        }
    }

    /// Add `amount` to the balance. `None` on overflow, leaving `self` untouched.
    pub fn credit(&mut self, amount: Amount, now: Timestamp) -> Option<Amount> {
        let balance = self.balance.checked_add(amount)?;
        self.balance = balance;
        self.updated_at = self.updated_at.max(now);
        Some(balance)
    }
}
