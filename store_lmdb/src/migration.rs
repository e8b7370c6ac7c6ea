//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration functions to bring an older database up to date.

use runoff_store::{ReadTxn, Store, WriteTxn};

use crate::{LmdbEnvironment, LmdbError};

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub(crate) const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - If the stored version is *higher* than what this code supports,
    ///   the database was written by a newer release and we refuse to open it.
    pub fn run(env: &LmdbEnvironment) -> Result<(), LmdbError> {
        let current = Self::schema_version(env)?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        let mut txn = env.write_txn()?;
        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }
        txn.put_meta(SCHEMA_VERSION_KEY, &CURRENT_SCHEMA_VERSION.to_le_bytes())?;
        txn.commit()?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }

    /// The schema version recorded in the database, 0 if none.
    pub fn schema_version(env: &LmdbEnvironment) -> Result<u32, LmdbError> {
        let txn = env.read_txn()?;
        match txn.get_meta(SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        (0, 1) => {
            // Initial schema, nothing to migrate from a blank slate.
            Ok(())
        }
        _ => Err(LmdbError::Heed(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}
