//! Miner record: per-user activity state and accrual checkpoints.

use guru_types::{HashRate, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Whether a miner is currently accruing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinerState {
    Active,
    Inactive,
}

/// One row per user.
///
/// `last_started` is present exactly while the miner is active.
/// `last_claimed` is the checkpoint settlements measure from and never
/// moves backwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerRecord {
    pub user_id: UserId,
    pub is_active: bool,
    pub hash_rate: HashRate,
    pub last_started: Option<Timestamp>,
    pub last_claimed: Option<Timestamp>,
}

impl MinerRecord {
    /// A freshly started miner: both checkpoints at `now`.
    pub fn new_active(user_id: UserId, hash_rate: HashRate, now: Timestamp) -> Self {
        Self {
            user_id,
            is_active: true,
            hash_rate,
            last_started: Some(now),
            last_claimed: Some(now),
        }
    }

    pub fn state(&self) -> MinerState {
        if self.is_active {
            MinerState::Active
        } else {
            MinerState::Inactive
        }
    }

    /// The timestamp the next settlement measures from.
    ///
    /// The later of `last_claimed` and `last_started`: time already settled
    /// is never counted twice, and the gap between a stop and the next
    /// start is never counted at all.
    pub fn checkpoint(&self) -> Option<Timestamp> {
        match (self.last_claimed, self.last_started) {
            (Some(claimed), Some(started)) => Some(claimed.max(started)),
            (claimed, started) => claimed.or(started),
        }
    }

    /// Mark the clock running. `last_claimed` is left alone so already
    /// settled time is never counted again.
    pub fn activate(&mut self, now: Timestamp) {
        self.is_active = true;
        self.last_started = Some(now);
    }

    /// Move the settlement checkpoint to `now`, never backwards.
    pub fn advance_checkpoint(&mut self, now: Timestamp) {
        self.last_claimed = Some(match self.last_claimed {
            Some(prev) => prev.max(now),
            None => now,
        });
    }

    /// Stop the clock after a settlement at `now`.
    pub fn deactivate(&mut self, now: Timestamp) {
        self.is_active = false;
        self.last_started = None;
        self.advance_checkpoint(now);
    }

    /// `last_started` present iff active.
    pub fn is_consistent(&self) -> bool {
        self.is_active == self.last_started.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner() -> MinerRecord {
        MinerRecord::new_active(UserId::new(1), HashRate::ONE, Timestamp::from_secs(100))
    }

    #[test]
    fn new_miner_is_active_with_both_checkpoints() {
        let m = miner();
        assert_eq!(m.state(), MinerState::Active);
        assert_eq!(m.checkpoint(), Some(Timestamp::from_secs(100)));
        assert!(m.is_consistent());
    }

    #[test]
    fn checkpoint_falls_back_to_last_started() {
        let mut m = miner();
        m.last_claimed = None;
        m.last_started = Some(Timestamp::from_secs(40));
        assert_eq!(m.checkpoint(), Some(Timestamp::from_secs(40)));
    }

    #[test]
    fn deactivate_clears_start_and_advances_checkpoint() {
        let mut m = miner();
        m.deactivate(Timestamp::from_secs(250));
        assert_eq!(m.state(), MinerState::Inactive);
        assert_eq!(m.last_started, None);
        assert_eq!(m.last_claimed, Some(Timestamp::from_secs(250)));
        assert!(m.is_consistent());
    }

    #[test]
    fn activate_keeps_last_claimed() {
        let mut m = miner();
        m.deactivate(Timestamp::from_secs(250));
        m.activate(Timestamp::from_secs(900));
        assert_eq!(m.last_started, Some(Timestamp::from_secs(900)));
        assert_eq!(m.last_claimed, Some(Timestamp::from_secs(250)));
    }

    #[test]
    fn restart_checkpoint_skips_the_idle_gap() {
        let mut m = miner();
        m.deactivate(Timestamp::from_secs(250));
        m.activate(Timestamp::from_secs(900));
        assert_eq!(m.checkpoint(), Some(Timestamp::from_secs(900)));
    }

    #[test]
    fn claim_during_run_moves_checkpoint_past_start() {
        let mut m = miner();
        m.advance_checkpoint(Timestamp::from_secs(300));
        assert_eq!(m.checkpoint(), Some(Timestamp::from_secs(300)));
    }

    #[test]
    fn checkpoint_never_moves_backwards() {
        let mut m = miner();
        m.advance_checkpoint(Timestamp::from_secs(50));
        assert_eq!(m.last_claimed, Some(Timestamp::from_secs(100)));
    }
}
