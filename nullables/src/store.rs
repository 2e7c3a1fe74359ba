//! Nullable store: thread-safe in-memory ledger storage for testing.
//!
//! Unlike LMDB, locking here is genuinely per row: transactions for
//! different users never wait on each other. Writes are buffered in the
//! transaction and applied under one mutex at commit, so a dropped or
//! failed transaction leaves the committed tables untouched.

use guru_store::{
    LedgerStore, LedgerTxn, LockGuard, LockTable, MinerRecord, StoreError, WalletRecord,
};
use guru_types::UserId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowKey {
    Miner(UserId),
    Wallet(UserId),
}

#[derive(Default)]
struct Tables {
    miners: HashMap<UserId, MinerRecord>,
    wallets: HashMap<UserId, WalletRecord>,
}

/// An in-memory miner + wallet store for testing.
pub struct NullLedgerStore {
    tables: Mutex<Tables>,
    locks: LockTable<RowKey>,
    fail_next_commit: AtomicBool,
    commits: AtomicU64,
}

impl NullLedgerStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(guru_store::lock::DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            locks: LockTable::new(timeout),
            fail_next_commit: AtomicBool::new(false),
            commits: AtomicU64::new(0),
        }
    }

    /// Make the next `commit` fail after all writes were staged.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Whether some open transaction holds the lock on `key`.
    pub fn is_locked(&self, key: RowKey) -> bool {
        self.locks.is_locked(&key)
    }

    /// Seed a miner row directly, bypassing transactions.
    pub fn put_miner(&self, record: MinerRecord) -> Result<(), StoreError> {
        self.tables()?.miners.insert(record.user_id, record);
        Ok(())
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("table mutex poisoned".to_string()))
    }
}

impl Default for NullLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for NullLedgerStore {
    type Txn<'a> = NullLedgerTxn<'a>;

    fn begin(&self) -> Result<NullLedgerTxn<'_>, StoreError> {
        Ok(NullLedgerTxn {
            store: self,
            miners: HashMap::new(),
            wallets: HashMap::new(),
            guards: Vec::new(),
        })
    }

    fn get_miner(&self, user: &UserId) -> Result<Option<MinerRecord>, StoreError> {
        Ok(self.tables()?.miners.get(user).cloned())
    }

    fn get_wallet(&self, user: &UserId) -> Result<Option<WalletRecord>, StoreError> {
        Ok(self.tables()?.wallets.get(user).cloned())
    }
}

/// A buffered transaction over [`NullLedgerStore`].
pub struct NullLedgerTxn<'a> {
    store: &'a NullLedgerStore,
    miners: HashMap<UserId, MinerRecord>,
    wallets: HashMap<UserId, WalletRecord>,
    guards: Vec<LockGuard<'a, RowKey>>,
}

impl NullLedgerTxn<'_> {
    fn holds(&self, key: RowKey) -> bool {
        self.guards.iter().any(|g| *g.key() == key)
    }

    fn lock(&mut self, key: RowKey) -> Result<(), StoreError> {
        if !self.holds(key) {
            let guard = self.store.locks.acquire(key)?;
            self.guards.push(guard);
        }
        Ok(())
    }

    fn require_lock(&self, key: RowKey) -> Result<(), StoreError> {
        if self.holds(key) {
            Ok(())
        } else {
            Err(StoreError::LockNotHeld(format!("{key:?}")))
        }
    }

    fn miner_exists(&self, user: &UserId) -> Result<bool, StoreError> {
        Ok(self.miners.contains_key(user) || self.store.tables()?.miners.contains_key(user))
    }

    fn wallet_exists(&self, user: &UserId) -> Result<bool, StoreError> {
        Ok(self.wallets.contains_key(user) || self.store.tables()?.wallets.contains_key(user))
    }
}

impl LedgerTxn for NullLedgerTxn<'_> {
    fn lock_miner(&mut self, user: &UserId) -> Result<Option<MinerRecord>, StoreError> {
        self.lock(RowKey::Miner(*user))?;
        if let Some(staged) = self.miners.get(user) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.store.tables()?.miners.get(user).cloned())
    }

    fn lock_wallet(&mut self, user: &UserId) -> Result<Option<WalletRecord>, StoreError> {
        self.lock(RowKey::Wallet(*user))?;
        if let Some(staged) = self.wallets.get(user) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.store.tables()?.wallets.get(user).cloned())
    }

    fn insert_miner(&mut self, record: &MinerRecord) -> Result<(), StoreError> {
        self.require_lock(RowKey::Miner(record.user_id))?;
        if self.miner_exists(&record.user_id)? {
            return Err(StoreError::Duplicate(format!("miner {}", record.user_id)));
        }
        self.miners.insert(record.user_id, record.clone());
        Ok(())
    }

    fn update_miner(&mut self, record: &MinerRecord) -> Result<(), StoreError> {
        self.require_lock(RowKey::Miner(record.user_id))?;
        if !self.miner_exists(&record.user_id)? {
            return Err(StoreError::NotFound(format!("miner {}", record.user_id)));
        }
        self.miners.insert(record.user_id, record.clone());
        Ok(())
    }

    fn insert_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError> {
        self.require_lock(RowKey::Wallet(record.user_id))?;
        if self.wallet_exists(&record.user_id)? {
            return Err(StoreError::Duplicate(format!("wallet {}", record.user_id)));
        }
        self.wallets.insert(record.user_id, record.clone());
        Ok(())
    }

    fn update_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError> {
        self.require_lock(RowKey::Wallet(record.user_id))?;
        if !self.wallet_exists(&record.user_id)? {
            return Err(StoreError::NotFound(format!("wallet {}", record.user_id)));
        }
        self.wallets.insert(record.user_id, record.clone());
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.store.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }
        let mut tables = self.store.tables()?;
        tables.miners.extend(self.miners);
        tables.wallets.extend(self.wallets);
        drop(tables);
        self.store.commits.fetch_add(1, Ordering::SeqCst);
        // Row locks release when `self.guards` drops here.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guru_types::{Amount, HashRate, Timestamp};
    use std::sync::Arc;
    use std::thread;

    fn miner(user: u64) -> MinerRecord {
        MinerRecord::new_active(UserId::new(user), HashRate::ONE, Timestamp::from_secs(1))
    }

    #[test]
    fn commit_applies_staged_rows() {
        let store = NullLedgerStore::new();
        let user = UserId::new(1);
        let mut txn = store.begin().unwrap();
        txn.lock_miner(&user).unwrap();
        txn.insert_miner(&miner(1)).unwrap();
        assert!(store.get_miner(&user).unwrap().is_none(), "uncommitted write is invisible");
        txn.commit().unwrap();
        assert_eq!(store.get_miner(&user).unwrap(), Some(miner(1)));
        assert_eq!(store.commit_count(), 1);
        assert!(!store.is_locked(RowKey::Miner(user)));
    }

    #[test]
    fn staged_rows_are_read_back_inside_the_txn() {
        let store = NullLedgerStore::new();
        let user = UserId::new(1);
        let mut txn = store.begin().unwrap();
        txn.lock_wallet(&user).unwrap();
        txn.insert_wallet(&WalletRecord::new(user, Amount::new(9), Timestamp::EPOCH))
            .unwrap();
        let staged = txn.lock_wallet(&user).unwrap().unwrap();
        assert_eq!(staged.balance, Amount::new(9));
    }

    #[test]
    fn injected_failure_discards_everything() {
        let store = NullLedgerStore::new();
        let user = UserId::new(2);
        store.fail_next_commit();
        let mut txn = store.begin().unwrap();
        txn.lock_miner(&user).unwrap();
        txn.insert_miner(&miner(2)).unwrap();
        assert!(txn.commit().is_err());
        assert!(store.get_miner(&user).unwrap().is_none());
        assert!(!store.is_locked(RowKey::Miner(user)));
    }

    #[test]
    fn write_requires_lock() {
        let store = NullLedgerStore::new();
        let mut txn = store.begin().unwrap();
        assert!(matches!(
            txn.insert_miner(&miner(3)).unwrap_err(),
            StoreError::LockNotHeld(_)
        ));
    }

    #[test]
    fn same_row_blocks_until_timeout() {
        let store = NullLedgerStore::with_lock_timeout(Duration::from_millis(20));
        let user = UserId::new(4);
        let mut first = store.begin().unwrap();
        first.lock_miner(&user).unwrap();

        let mut second = store.begin().unwrap();
        let err = second.lock_miner(&user).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(_)));
    }

    #[test]
    fn different_users_do_not_block() {
        let store = Arc::new(NullLedgerStore::with_lock_timeout(Duration::from_millis(20)));
        let mut first = store.begin().unwrap();
        first.lock_miner(&UserId::new(1)).unwrap();

        let other = Arc::clone(&store);
        let handle = thread::spawn(move || {
            let mut txn = other.begin().unwrap();
            txn.lock_miner(&UserId::new(2)).map(|_| ())
        });
        assert!(handle.join().unwrap().is_ok());
    }
}
