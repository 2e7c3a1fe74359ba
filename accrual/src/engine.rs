//! The accrual engine: start / stop / claim / status over a transactional store.
//!
//! Every write operation runs in one store transaction:
//!
//! 1. lock the user's miner row (waiting at most the store's lock timeout)
//! 2. read the clock, so `now` is never earlier than a competing settlement
//!    that committed while we waited
//! 3. compute, write, commit
//!
//! Any error before the commit drops the transaction, which rolls back every
//! write made through it. Wallet locks are always taken after the miner lock,
//! so two transactions can never wait on each other in opposite order.

use guru_store::{LedgerStore, LedgerTxn, MinerRecord, WalletRecord};
use guru_types::{Amount, Clock, Timestamp, UserId};

use crate::config::EngineConfig;
use crate::error::AccrualError;
use crate::outcome::{MinerStatus, Settlement, StartOutcome, StopOutcome};
use crate::reward;
use crate::stats::{Counter, EngineStats, StatsSnapshot};

/// Settles time-based mining rewards into wallets.
///
/// Generic over the storage backend and the clock so tests can drive it
/// with an in-memory store and a manually advanced clock.
pub struct AccrualEngine<S, C> {
    store: S,
    clock: C,
    config: EngineConfig,
    stats: EngineStats,
}

impl<S: LedgerStore, C: Clock> AccrualEngine<S, C> {
    /// Build an engine. Fails if `config` does not validate.
    pub fn new(store: S, clock: C, config: EngineConfig) -> Result<Self, AccrualError> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
            stats: EngineStats::default(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Mark the user's miner as running.
    ///
    /// Creates the miner on first use. A stopped miner resumes with
    /// `last_started = now` and its `last_claimed` untouched. Starting a
    /// running miner changes nothing, since moving `last_started` forward
    /// would drop the time accrued since its checkpoint.
    pub fn start(&self, user: UserId) -> Result<StartOutcome, AccrualError> {
        let result = self.start_inner(user);
        self.record(user, "start", &result);
        if result.is_ok() {
            self.stats.bump(Counter::Start);
        }
        result
    }

    fn start_inner(&self, user: UserId) -> Result<StartOutcome, AccrualError> {
        let mut txn = self.store.begin()?;
        let existing = txn.lock_miner(&user)?;
        let now = self.clock.now();

        let outcome = match existing {
            None => {
                let miner = MinerRecord::new_active(user, self.config.default_hash_rate, now);
                txn.insert_miner(&miner)?;
                txn.commit()?;
                StartOutcome::Created
            }
            Some(miner) if miner.is_active => {
                txn.rollback();
                StartOutcome::AlreadyActive
            }
            Some(mut miner) => {
                miner.activate(now);
                txn.update_miner(&miner)?;
                txn.commit()?;
                StartOutcome::Resumed
            }
        };
        tracing::debug!(%user, ?outcome, at = %now, "miner start");
        Ok(outcome)
    }

    /// Settle the running miner and stop it.
    ///
    /// A missing or already stopped miner is a successful no-op that writes
    /// nothing, so stopping twice is safe.
    pub fn stop(&self, user: UserId) -> Result<StopOutcome, AccrualError> {
        let result = self.stop_inner(user);
        self.record(user, "stop", &result);
        match &result {
            Ok(StopOutcome::Stopped(_)) => self.stats.bump(Counter::Stop),
            Ok(StopOutcome::AlreadyStopped) => self.stats.bump(Counter::NoopStop),
            Err(_) => {}
        }
        result
    }

    fn stop_inner(&self, user: UserId) -> Result<StopOutcome, AccrualError> {
        let mut txn = self.store.begin()?;
        let mut miner = match txn.lock_miner(&user)? {
            Some(miner) if miner.is_active => miner,
            _ => {
                txn.rollback();
                tracing::debug!(%user, "stop on a stopped miner");
                return Ok(StopOutcome::AlreadyStopped);
            }
        };
        let now = self.clock.now();

        let settlement = self.settle(&mut txn, &miner, now)?;
        miner.deactivate(now);
        txn.update_miner(&miner)?;
        txn.commit()?;

        tracing::info!(
            %user,
            accrued = %settlement.accrued,
            balance = %settlement.balance,
            elapsed_ms = settlement.elapsed_millis,
            "miner stopped"
        );
        Ok(StopOutcome::Stopped(settlement))
    }

    /// Settle everything accrued since the checkpoint without changing
    /// whether the miner runs.
    ///
    /// Fails with [`AccrualError::NotConfigured`] if the user never started
    /// a miner; no wallet is created in that case. A stopped miner settles
    /// zero, since its stop already settled up to the stop time.
    pub fn claim(&self, user: UserId) -> Result<Settlement, AccrualError> {
        let result = self.claim_inner(user);
        self.record(user, "claim", &result);
        if result.is_ok() {
            self.stats.bump(Counter::Claim);
        }
        result
    }

    fn claim_inner(&self, user: UserId) -> Result<Settlement, AccrualError> {
        let mut txn = self.store.begin()?;
        let Some(mut miner) = txn.lock_miner(&user)? else {
            txn.rollback();
            return Err(AccrualError::NotConfigured(user));
        };
        let now = self.clock.now();

        let settlement = self.settle(&mut txn, &miner, now)?;
        miner.advance_checkpoint(now);
        txn.update_miner(&miner)?;
        txn.commit()?;

        tracing::info!(
            %user,
            accrued = %settlement.accrued,
            balance = %settlement.balance,
            elapsed_ms = settlement.elapsed_millis,
            "reward claimed"
        );
        Ok(settlement)
    }

    /// Preview what a claim issued now would settle. Takes no locks and
    /// writes nothing.
    pub fn status(&self, user: UserId) -> Result<MinerStatus, AccrualError> {
        let result = self.status_inner(user);
        if let Err(e) = &result {
            tracing::error!(%user, error = %e, "status failed");
            self.stats.bump(Counter::Failure);
        }
        result
    }

    fn status_inner(&self, user: UserId) -> Result<MinerStatus, AccrualError> {
        let miner = self.store.get_miner(&user)?;
        let wallet = self.store.get_wallet(&user)?;
        let now = self.clock.now();
        let accrued = match &miner {
            Some(miner) => {
                reward::accrue_miner(miner, now, self.config.reward_rate)
                    .ok_or(AccrualError::Overflow)?
                    .amount
            }
            None => Amount::ZERO,
        };
        Ok(MinerStatus {
            miner,
            wallet,
            accrued,
            as_of: now,
        })
    }

    /// Credit the miner's accrual at `now` into its wallet, creating the
    /// wallet if needed. The caller persists the miner's new checkpoint.
    fn settle<T: LedgerTxn>(
        &self,
        txn: &mut T,
        miner: &MinerRecord,
        now: Timestamp,
    ) -> Result<Settlement, AccrualError> {
        let user = miner.user_id;
        let accrual = reward::accrue_miner(miner, now, self.config.reward_rate)
            .ok_or(AccrualError::Overflow)?;
        if accrual.is_skewed() {
            self.stats.bump(Counter::Skewed);
            tracing::warn!(
                %user,
                skew_ms = accrual.skew_millis,
                "clock is behind the miner checkpoint, accrual clamped to zero"
            );
        }

        let balance = match txn.lock_wallet(&user)? {
            Some(mut wallet) => {
                let balance = wallet
                    .credit(accrual.amount, now)
                    .ok_or(AccrualError::Overflow)?;
                txn.update_wallet(&wallet)?;
                balance
            }
            None => {
                txn.insert_wallet(&WalletRecord::new(user, accrual.amount, now))?;
                accrual.amount
            }
        };

        Ok(Settlement {
            accrued: accrual.amount,
            balance,
            elapsed_millis: accrual.elapsed_millis,
            settled_at: now,
        })
    }

    fn record<T>(&self, user: UserId, op: &'static str, result: &Result<T, AccrualError>) {
        if let Err(e) = result {
            self.stats.bump(Counter::Failure);
            match e {
                AccrualError::NotConfigured(_) => {
                    tracing::debug!(%user, op, "operation on unconfigured miner")
                }
                AccrualError::Storage(source) => {
                    tracing::error!(%user, op, error = %source, "operation rolled back")
                }
                other => tracing::error!(%user, op, error = %other, "operation failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guru_nullables::{NullClock, NullLedgerStore, RowKey};
    use guru_types::HashRate;

    fn engine() -> AccrualEngine<NullLedgerStore, NullClock> {
        AccrualEngine::new(NullLedgerStore::new(), NullClock::new(0), EngineConfig::default())
            .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig {
            reward_rate: Amount::new(1),
            default_hash_rate: HashRate::ONE,
        };
        assert!(AccrualEngine::new(NullLedgerStore::new(), NullClock::new(0), config).is_err());
    }

    #[test]
    fn first_start_creates_the_miner() {
        let engine = engine();
        let user = UserId::new(1);
        assert_eq!(engine.start(user).unwrap(), StartOutcome::Created);
        let miner = engine.store().get_miner(&user).unwrap().unwrap();
        assert!(miner.is_active);
        assert_eq!(miner.last_started, Some(Timestamp::EPOCH));
        assert_eq!(miner.last_claimed, Some(Timestamp::EPOCH));
        assert!(engine.store().get_wallet(&user).unwrap().is_none());
    }

    #[test]
    fn start_on_running_miner_writes_nothing() {
        let engine = engine();
        let user = UserId::new(1);
        engine.start(user).unwrap();
        let commits = engine.store().commit_count();
        engine.clock().advance(30);
        assert_eq!(engine.start(user).unwrap(), StartOutcome::AlreadyActive);
        assert_eq!(engine.store().commit_count(), commits);
        assert!(!engine.store().is_locked(RowKey::Miner(user)));
    }

    #[test]
    fn stop_then_start_resumes() {
        let engine = engine();
        let user = UserId::new(1);
        engine.start(user).unwrap();
        engine.clock().advance(10);
        engine.stop(user).unwrap();
        engine.clock().advance(10);
        assert_eq!(engine.start(user).unwrap(), StartOutcome::Resumed);
    }

    #[test]
    fn failures_are_counted() {
        let engine = engine();
        assert!(engine.claim(UserId::new(5)).is_err());
        let stats = engine.stats();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.claims, 0);
    }

    #[test]
    fn status_of_unknown_user_is_empty() {
        let engine = engine();
        let status = engine.status(UserId::new(8)).unwrap();
        assert!(status.miner.is_none());
        assert_eq!(status.balance(), Amount::ZERO);
        assert_eq!(status.accrued, Amount::ZERO);
    }
}
