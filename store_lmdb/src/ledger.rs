//! LMDB implementation of the ledger store.
//!
//! LMDB admits a single writer per environment, so an open write
//! transaction already excludes every other writer from every row. Before
//! LMDB's own writer mutex is touched, a transaction passes an in-process
//! writer gate with a bounded wait, so contention surfaces as
//! `StoreError::LockTimeout` instead of blocking forever.
//!
//! If a transaction is dropped without [`LmdbLedgerTxn::commit`], all writes
//! are rolled back (the underlying LMDB transaction is aborted).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use heed::RwTxn;

use guru_store::{LedgerStore, LedgerTxn, LockGuard, LockTable, MinerRecord, StoreError, WalletRecord};
use guru_types::UserId;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Table {
    Miners,
    Wallets,
}

pub struct LmdbLedgerStore {
    env: Arc<LmdbEnvironment>,
    writer: LockTable<()>,
}

impl LmdbLedgerStore {
    pub fn new(env: Arc<LmdbEnvironment>, lock_timeout: Duration) -> Self {
        Self {
            env,
            writer: LockTable::new(lock_timeout),
        }
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }
}

impl LedgerStore for LmdbLedgerStore {
    type Txn<'a> = LmdbLedgerTxn<'a>;

    fn begin(&self) -> Result<LmdbLedgerTxn<'_>, StoreError> {
        let writer = self.writer.acquire(())?;
        let txn = self.env.env().write_txn().map_err(LmdbError::from)?;
        Ok(LmdbLedgerTxn {
            txn,
            env: &self.env,
            locked: HashSet::new(),
            _writer: writer,
        })
    }

    fn get_miner(&self, user: &UserId) -> Result<Option<MinerRecord>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .env
            .miners_db
            .get(&rtxn, &user.to_key())
            .map_err(LmdbError::from)?;
        bytes.map(decode).transpose()
    }

    fn get_wallet(&self, user: &UserId) -> Result<Option<WalletRecord>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .env
            .wallets_db
            .get(&rtxn, &user.to_key())
            .map_err(LmdbError::from)?;
        bytes.map(decode).transpose()
    }
}

/// A write transaction over the miners and wallets databases.
pub struct LmdbLedgerTxn<'a> {
    // Declared before `_writer` so the LMDB transaction ends first.
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
    locked: HashSet<(Table, UserId)>,
    _writer: LockGuard<'a, ()>,
}

impl LmdbLedgerTxn<'_> {
    fn require_lock(&self, table: Table, user: &UserId) -> Result<(), StoreError> {
        if self.locked.contains(&(table, *user)) {
            Ok(())
        } else {
            Err(StoreError::LockNotHeld(format!("{table:?}/{user}")))
        }
    }

    fn read<T: serde::de::DeserializeOwned>(
        &self,
        table: Table,
        user: &UserId,
    ) -> Result<Option<T>, StoreError> {
        let db = match table {
            Table::Miners => &self.env.miners_db,
            Table::Wallets => &self.env.wallets_db,
        };
        let bytes = db.get(&self.txn, &user.to_key()).map_err(LmdbError::from)?;
        bytes.map(decode).transpose()
    }

    fn exists(&self, table: Table, user: &UserId) -> Result<bool, StoreError> {
        let db = match table {
            Table::Miners => &self.env.miners_db,
            Table::Wallets => &self.env.wallets_db,
        };
        Ok(db
            .get(&self.txn, &user.to_key())
            .map_err(LmdbError::from)?
            .is_some())
    }

    fn write<T: serde::Serialize>(
        &mut self,
        table: Table,
        user: &UserId,
        record: &T,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let db = match table {
            Table::Miners => &self.env.miners_db,
            Table::Wallets => &self.env.wallets_db,
        };
        db.put(&mut self.txn, &user.to_key(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn insert<T: serde::Serialize>(
        &mut self,
        table: Table,
        user: &UserId,
        record: &T,
    ) -> Result<(), StoreError> {
        self.require_lock(table, user)?;
        if self.exists(table, user)? {
            return Err(StoreError::Duplicate(format!("{table:?}/{user}")));
        }
        self.write(table, user, record)
    }

    fn update<T: serde::Serialize>(
        &mut self,
        table: Table,
        user: &UserId,
        record: &T,
    ) -> Result<(), StoreError> {
        self.require_lock(table, user)?;
        if !self.exists(table, user)? {
            return Err(StoreError::NotFound(format!("{table:?}/{user}")));
        }
        self.write(table, user, record)
    }
}

impl LedgerTxn for LmdbLedgerTxn<'_> {
    fn lock_miner(&mut self, user: &UserId) -> Result<Option<MinerRecord>, StoreError> {
        self.locked.insert((Table::Miners, *user));
        self.read(Table::Miners, user)
    }

    fn lock_wallet(&mut self, user: &UserId) -> Result<Option<WalletRecord>, StoreError> {
        self.locked.insert((Table::Wallets, *user));
        self.read(Table::Wallets, user)
    }

    fn insert_miner(&mut self, record: &MinerRecord) -> Result<(), StoreError> {
        self.insert(Table::Miners, &record.user_id, record)
    }

    fn update_miner(&mut self, record: &MinerRecord) -> Result<(), StoreError> {
        self.update(Table::Miners, &record.user_id, record)
    }

    fn insert_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError> {
        self.insert(Table::Wallets, &record.user_id, record)
    }

    fn update_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError> {
        self.update(Table::Wallets, &record.user_id, record)
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{DEFAULT_MAP_SIZE, MAX_DBS};
    use guru_types::{Amount, HashRate, Timestamp};

    fn temp_store() -> (tempfile::TempDir, LmdbLedgerStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), MAX_DBS, DEFAULT_MAP_SIZE).expect("open env");
        let store = LmdbLedgerStore::new(Arc::new(env), Duration::from_millis(200));
        (dir, store)
    }

    fn miner(user: u64) -> MinerRecord {
        MinerRecord::new_active(UserId::new(user), HashRate::ONE, Timestamp::from_secs(10))
    }

    #[test]
    fn committed_rows_are_visible() {
        let (_dir, store) = temp_store();
        let user = UserId::new(1);

        let mut txn = store.begin().expect("begin");
        assert!(txn.lock_miner(&user).expect("lock").is_none());
        txn.insert_miner(&miner(1)).expect("insert miner");
        txn.lock_wallet(&user).expect("lock wallet");
        txn.insert_wallet(&WalletRecord::new(user, Amount::new(5), Timestamp::from_secs(10)))
            .expect("insert wallet");
        txn.commit().expect("commit");

        assert_eq!(store.get_miner(&user).unwrap(), Some(miner(1)));
        assert_eq!(store.get_wallet(&user).unwrap().unwrap().balance, Amount::new(5));
        assert_eq!(store.environment().miner_count().unwrap(), 1);
    }

    #[test]
    fn dropped_txn_does_not_persist() {
        let (_dir, store) = temp_store();
        let user = UserId::new(2);
        {
            let mut txn = store.begin().expect("begin");
            txn.lock_miner(&user).unwrap();
            txn.insert_miner(&miner(2)).unwrap();
            // dropped here, implicit rollback
        }
        assert!(store.get_miner(&user).unwrap().is_none());
    }

    #[test]
    fn explicit_rollback_discards_writes() {
        let (_dir, store) = temp_store();
        let user = UserId::new(2);
        let mut txn = store.begin().unwrap();
        txn.lock_miner(&user).unwrap();
        txn.insert_miner(&miner(2)).unwrap();
        txn.rollback();
        assert!(store.get_miner(&user).unwrap().is_none());
    }

    #[test]
    fn write_without_lock_is_rejected() {
        let (_dir, store) = temp_store();
        let mut txn = store.begin().unwrap();
        let err = txn.insert_miner(&miner(3)).unwrap_err();
        assert!(matches!(err, StoreError::LockNotHeld(_)));
    }

    #[test]
    fn duplicate_insert_and_missing_update_fail() {
        let (_dir, store) = temp_store();
        let user = UserId::new(4);
        let mut txn = store.begin().unwrap();
        txn.lock_miner(&user).unwrap();
        assert!(matches!(
            txn.update_miner(&miner(4)).unwrap_err(),
            StoreError::NotFound(_)
        ));
        txn.insert_miner(&miner(4)).unwrap();
        assert!(matches!(
            txn.insert_miner(&miner(4)).unwrap_err(),
            StoreError::Duplicate(_)
        ));
    }

    #[test]
    fn second_writer_times_out_while_first_is_open() {
        let (_dir, store) = temp_store();
        let _first = store.begin().unwrap();
        let err = store.begin().err().expect("writer gate is held");
        assert!(matches!(err, StoreError::LockTimeout(_)));
    }
}
