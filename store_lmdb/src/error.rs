use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("no migration step from schema version {0}")]
    MissingMigration(u32),

    #[error("meta store: {0}")]
    Meta(#[from] guru_store::StoreError),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for guru_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => guru_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => guru_store::StoreError::Serialization(msg),
            LmdbError::Meta(inner) => inner,
            e @ LmdbError::SchemaTooNew { .. } => guru_store::StoreError::Corruption(e.to_string()),
            other => guru_store::StoreError::Backend(other.to_string()),
        }
    }
}
