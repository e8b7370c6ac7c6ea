//! LMDB storage backend for the runoff election ledger.
//!
//! Implements the transactional storage traits from `runoff-store` using the
//! `heed` LMDB bindings. Each record family maps to one named LMDB database
//! within a single environment.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod migration;
pub mod transaction;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use transaction::{LmdbReadTxn, LmdbWriteTxn};
