use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
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

impl From<LmdbError> for runoff_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => runoff_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => runoff_store::StoreError::Serialization(msg),
            LmdbError::Corruption(msg) => runoff_store::StoreError::Corruption(msg),
            other => runoff_store::StoreError::Backend(other.to_string()),
        }
    }
}

impl From<runoff_store::StoreError> for LmdbError {
    fn from(e: runoff_store::StoreError) -> Self {
        match e {
            runoff_store::StoreError::NotFound(key) => LmdbError::NotFound(key),
            runoff_store::StoreError::Serialization(msg) => LmdbError::Serialization(msg),
            runoff_store::StoreError::Corruption(msg) => LmdbError::Corruption(msg),
            runoff_store::StoreError::Backend(msg) => LmdbError::Heed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runoff_store::StoreError;

    #[test]
    fn store_errors_keep_their_kind() {
        assert!(matches!(
            LmdbError::from(StoreError::NotFound("k".into())),
            LmdbError::NotFound(k) if k == "k"
        ));
        assert!(matches!(
            LmdbError::from(StoreError::Serialization("bad".into())),
            LmdbError::Serialization(_)
        ));
        assert!(matches!(
            LmdbError::from(StoreError::Corruption("loop".into())),
            LmdbError::Corruption(_)
        ));
        assert!(matches!(
            LmdbError::from(StoreError::Backend("io".into())),
            LmdbError::Heed(_)
        ));
    }

    #[test]
    fn kinds_survive_the_trip_back_to_store_errors() {
        for original in [
            StoreError::NotFound("k".into()),
            StoreError::Serialization("bad".into()),
            StoreError::Corruption("loop".into()),
        ] {
            let expected = std::mem::discriminant(&original);
            let back = StoreError::from(LmdbError::from(original));
            assert_eq!(std::mem::discriminant(&back), expected);
        }
    }
}
