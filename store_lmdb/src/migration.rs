//! Schema versioning for the ledger files.
//!
//! The meta database records the schema the files were last written with.
//! Opening walks every step from that version up to
//! [`CURRENT_SCHEMA_VERSION`] before any engine operation runs.

use guru_store::MetaStore;

use crate::LmdbError;

/// The schema version this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// One upgrade: the version it produces and what changed.
struct Step {
    to: u32,
    summary: &'static str,
}

/// Ordered so that `STEPS[v]` upgrades from version `v`.
const STEPS: &[Step] = &[Step {
    to: 1,
    summary: "miners and wallets keyed by big-endian user id, bincode rows",
}];

pub struct Migrator;

impl Migrator {
    /// Bring the stored schema up to date and return the resulting version.
    ///
    /// Version 0 is a fresh database. A version newer than this build is
    /// refused rather than risk misreading rows.
    pub fn run(meta_store: &impl MetaStore) -> Result<u32, LmdbError> {
        let found = meta_store.get_schema_version()?;
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if found == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = found, "ledger schema is current");
            return Ok(found);
        }

        let mut version = found;
        while version < CURRENT_SCHEMA_VERSION {
            let step = step_from(version)?;
            tracing::info!(
                from = version,
                to = step.to,
                summary = step.summary,
                "upgrading ledger schema"
            );
            version = step.to;
        }
        meta_store.set_schema_version(version)?;
        Ok(version)
    }
}

fn step_from(version: u32) -> Result<&'static Step, LmdbError> {
    STEPS
        .get(version as usize)
        .filter(|step| step.to == version + 1)
        .ok_or(LmdbError::MissingMigration(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{DEFAULT_MAP_SIZE, MAX_DBS};
    use crate::{LmdbEnvironment, LmdbMetaStore};

    #[test]
    fn steps_cover_every_version() {
        for v in 0..CURRENT_SCHEMA_VERSION {
            assert!(step_from(v).is_ok(), "missing step from {v}");
        }
        assert!(matches!(
            step_from(CURRENT_SCHEMA_VERSION),
            Err(LmdbError::MissingMigration(_))
        ));
    }

    #[test]
    fn fresh_database_is_brought_to_current() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), MAX_DBS, DEFAULT_MAP_SIZE).unwrap();
        let meta = LmdbMetaStore::new(&env);
        assert_eq!(Migrator::run(&meta).unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(meta.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(Migrator::run(&meta).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), MAX_DBS, DEFAULT_MAP_SIZE).unwrap();
        let meta = LmdbMetaStore::new(&env);
        meta.set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
        assert!(matches!(
            Migrator::run(&meta),
            Err(LmdbError::SchemaTooNew { found: 2, supported: 1 })
        ));
    }
}
