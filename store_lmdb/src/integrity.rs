//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the service begins
//! accepting operations.

use std::path::Path;

use heed::Env;

use crate::environment::{
    CANDIDATES_DB, CANDIDATE_INDEX_DB, ELECTIONS_DB, META_DB, VOTERS_DB, VOTES_DB,
};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that we expect to exist in a valid environment.
const EXPECTED_DATABASES: &[&str] = &[
    ELECTIONS_DB,
    CANDIDATES_DB,
    CANDIDATE_INDEX_DB,
    VOTERS_DB,
    VOTES_DB,
    META_DB,
];

/// Check LMDB database integrity.
///
/// Opens each expected database and attempts to count entries. Read failures
/// and missing databases are recorded in the report rather than causing a
/// hard error.
pub fn check_integrity(env: &Env) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    for error in &report.errors {
        tracing::warn!("integrity check: {error}");
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists and is non-empty but `data.mdb` is missing, which
/// suggests misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let is_empty = path
        .read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "data directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
