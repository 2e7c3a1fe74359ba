//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Named databases: miners, wallets, meta.
pub const MAX_DBS: u32 = 3;

/// 64 MiB is plenty for one small row pair per user.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

pub const MINERS_DB: &str = "miners";
pub const WALLETS_DB: &str = "wallets";
pub const META_DB: &str = "meta";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) miners_db: Database<Bytes, Bytes>,
    pub(crate) wallets_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// The directory is created if missing, and every named database is
    /// created on first open.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and the data
        // files are not modified by anything other than LMDB itself.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(MAX_DBS))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let miners_db = env.create_database(&mut wtxn, Some(MINERS_DB))?;
        let wallets_db = env.create_database(&mut wtxn, Some(WALLETS_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env,
            miners_db,
            wallets_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Number of miner rows.
    pub fn miner_count(&self) -> Result<u64, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.miners_db.len(&rtxn)?)
    }

    /// Number of wallet rows.
    pub fn wallet_count(&self) -> Result<u64, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.wallets_db.len(&rtxn)?)
    }
}
