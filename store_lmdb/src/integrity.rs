//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before any settlement is
//! written on top of a damaged row.

use std::path::Path;

use guru_store::{MinerRecord, WalletRecord};
use guru_types::UserId;

use crate::environment::{LmdbEnvironment, MINERS_DB, WALLETS_DB};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub miners_checked: u64,
    pub wallets_checked: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decode every miner and wallet row and check the per-row invariants.
///
/// Read failures and invariant violations are recorded in the report rather
/// than causing a hard error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env().read_txn()?;

    for item in env.miners_db.iter(&rtxn)? {
        let (key, val) = match item {
            Ok(kv) => kv,
            Err(e) => {
                report.errors.push(format!("failed to read {MINERS_DB}: {e}"));
                continue;
            }
        };
        report.miners_checked += 1;
        let Some(user) = decode_key(MINERS_DB, key, &mut report) else {
            continue;
        };
        match bincode::deserialize::<MinerRecord>(val) {
            Ok(miner) => {
                if miner.user_id != user {
                    report
                        .errors
                        .push(format!("miner row {user} carries user id {}", miner.user_id));
                }
                if !miner.is_consistent() {
                    report.errors.push(format!(
                        "miner {user}: is_active={} but last_started={:?}",
                        miner.is_active, miner.last_started
                    ));
                }
            }
            Err(e) => report.errors.push(format!("miner {user}: undecodable row: {e}")),
        }
    }

    for item in env.wallets_db.iter(&rtxn)? {
        let (key, val) = match item {
            Ok(kv) => kv,
            Err(e) => {
                report.errors.push(format!("failed to read {WALLETS_DB}: {e}"));
                continue;
            }
        };
        report.wallets_checked += 1;
        let Some(user) = decode_key(WALLETS_DB, key, &mut report) else {
            continue;
        };
        match bincode::deserialize::<WalletRecord>(val) {
            Ok(wallet) if wallet.user_id != user => report
                .errors
                .push(format!("wallet row {user} carries user id {}", wallet.user_id)),
            Ok(_) => {}
            Err(e) => report.errors.push(format!("wallet {user}: undecodable row: {e}")),
        }
    }

    if !report.is_healthy() {
        tracing::warn!(errors = report.errors.len(), "integrity check found problems");
    }
    Ok(report)
}

fn decode_key(db: &str, key: &[u8], report: &mut IntegrityReport) -> Option<UserId> {
    match UserId::from_key(key) {
        Ok(user) => Some(user),
        Err(e) => {
            report.errors.push(format!("{db}: bad key: {e}"));
            None
        }
    }
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(()); // Fresh start
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{DEFAULT_MAP_SIZE, MAX_DBS};
    use guru_types::{HashRate, Timestamp};

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("not_yet_created")).is_ok());
    }

    #[test]
    fn check_data_dir_without_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn empty_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), MAX_DBS, DEFAULT_MAP_SIZE).unwrap();
        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.miners_checked, 0);
    }

    #[test]
    fn inconsistent_miner_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), MAX_DBS, DEFAULT_MAP_SIZE).unwrap();

        let user = UserId::new(9);
        let mut miner = MinerRecord::new_active(user, HashRate::ONE, Timestamp::from_secs(1));
        miner.last_started = None;
        let bytes = bincode::serialize(&miner).unwrap();
        let mut wtxn = env.env().write_txn().unwrap();
        env.miners_db.put(&mut wtxn, &user.to_key(), &bytes).unwrap();
        env.wallets_db.put(&mut wtxn, b"bad", b"junk").unwrap();
        wtxn.commit().unwrap();

        let report = check_integrity(&env).unwrap();
        assert_eq!(report.miners_checked, 1);
        assert_eq!(report.wallets_checked, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(!report.is_healthy());
    }
}
