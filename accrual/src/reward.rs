//! The reward formula.
//!
//! `accrued = Δt × hash_rate × reward_rate`
//!
//! All values are deterministic integers: `Δt` in milliseconds, hash rate in
//! micro-units, reward rate in raw amount units per second per whole hash
//! unit. One product and one exact division (by `10^9`, when the rate is a
//! multiple of `10^9` raw), so splitting an interval into two settlements
//! credits exactly what one settlement over the whole interval would.

use guru_store::MinerRecord;
use guru_types::{Amount, HashRate, Timestamp};

/// Milliseconds per second times micro-units per hash unit.
pub const RATE_DIVISOR: u128 = 1_000 * HashRate::MICROS_PER_UNIT as u128;

/// Result of one accrual computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accrual {
    /// Elapsed time counted, after clamping.
    pub elapsed_millis: u64,
    /// Value accrued over `elapsed_millis`.
    pub amount: Amount,
    /// How far the checkpoint lay in the future, if the clock went backwards.
    pub skew_millis: u64,
}

impl Accrual {
    pub const NONE: Self = Self {
        elapsed_millis: 0,
        amount: Amount::ZERO,
        skew_millis: 0,
    };

    pub fn is_skewed(&self) -> bool {
        self.skew_millis > 0
    }
}

/// Reward for `elapsed_millis` at the given rates. `None` on overflow.
pub fn reward_for(elapsed_millis: u64, hash_rate: HashRate, reward_rate: Amount) -> Option<Amount> {
    // u64 × u64 always fits in u128.
    let weighted = elapsed_millis as u128 * hash_rate.micros() as u128;
    let raw = weighted.checked_mul(reward_rate.raw())? / RATE_DIVISOR;
    Some(Amount::new(raw))
}

/// Accrual from `checkpoint` to `now`.
///
/// A missing checkpoint accrues nothing. A checkpoint later than `now`
/// (clock skew) is clamped to zero elapsed and reported in `skew_millis`.
pub fn accrue(
    checkpoint: Option<Timestamp>,
    now: Timestamp,
    hash_rate: HashRate,
    reward_rate: Amount,
) -> Option<Accrual> {
    let Some(checkpoint) = checkpoint else {
        return Some(Accrual::NONE);
    };
    match now.millis_since(checkpoint) {
        Some(elapsed_millis) => Some(Accrual {
            elapsed_millis,
            amount: reward_for(elapsed_millis, hash_rate, reward_rate)?,
            skew_millis: 0,
        }),
        None => Some(Accrual {
            skew_millis: checkpoint.millis_since(now).unwrap_or(0),
            ..Accrual::NONE
        }),
    }
}

/// What settling `miner` at `now` would credit.
///
/// Only a running miner accrues; a stopped one has nothing outstanding
/// because its stop already settled up to the stop time.
pub fn accrue_miner(miner: &MinerRecord, now: Timestamp, reward_rate: Amount) -> Option<Accrual> {
    if !miner.is_active {
        return Some(Accrual::NONE);
    }
    accrue(miner.checkpoint(), now, miner.hash_rate, reward_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use guru_types::UserId;

    fn rate() -> Amount {
        "0.000001".parse().unwrap()
    }

    fn two() -> HashRate {
        HashRate::from_units(2).unwrap()
    }

    #[test]
    fn hundred_seconds_at_hash_rate_two() {
        let a = accrue(
            Some(Timestamp::from_secs(0)),
            Timestamp::from_secs(100),
            two(),
            rate(),
        )
        .unwrap();
        assert_eq!(a.elapsed_millis, 100_000);
        assert_eq!(a.amount, "0.0002".parse().unwrap());
        assert!(!a.is_skewed());
    }

    #[test]
    fn sub_second_intervals_accrue() {
        let a = reward_for(1, HashRate::ONE, rate()).unwrap();
        assert_eq!(a, "0.000000001".parse().unwrap());
    }

    #[test]
    fn missing_checkpoint_accrues_nothing() {
        assert_eq!(
            accrue(None, Timestamp::from_secs(50), two(), rate()).unwrap(),
            Accrual::NONE
        );
    }

    #[test]
    fn future_checkpoint_is_clamped() {
        let a = accrue(
            Some(Timestamp::from_secs(30)),
            Timestamp::from_secs(10),
            two(),
            rate(),
        )
        .unwrap();
        assert_eq!(a.amount, Amount::ZERO);
        assert_eq!(a.elapsed_millis, 0);
        assert_eq!(a.skew_millis, 20_000);
    }

    #[test]
    fn split_interval_matches_whole_interval() {
        let whole = reward_for(150_000, two(), rate()).unwrap();
        let first = reward_for(100_000, two(), rate()).unwrap();
        let second = reward_for(50_000, two(), rate()).unwrap();
        assert_eq!(first + second, whole);
    }

    #[test]
    fn overflow_is_reported() {
        let huge = HashRate::from_micros(u64::MAX).unwrap();
        assert!(reward_for(u64::MAX, huge, Amount::new(u128::MAX)).is_none());
    }

    #[test]
    fn inactive_miner_accrues_nothing() {
        let mut miner = MinerRecord::new_active(UserId::new(1), two(), Timestamp::from_secs(0));
        miner.deactivate(Timestamp::from_secs(10));
        let a = accrue_miner(&miner, Timestamp::from_secs(500), rate()).unwrap();
        assert_eq!(a, Accrual::NONE);
    }
}
