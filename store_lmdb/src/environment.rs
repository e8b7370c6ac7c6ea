//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions, RoTxn};

use runoff_store::{Store, StoreError};
use runoff_types::{Candidate, CandidateId, Election, ElectionId, Identity};

use crate::keys;
use crate::migration::Migrator;
use crate::transaction::{LmdbReadTxn, LmdbWriteTxn};
use crate::LmdbError;

/// Number of named databases opened in the environment.
const MAX_DBS: u32 = 8;

pub(crate) const ELECTIONS_DB: &str = "elections";
pub(crate) const CANDIDATES_DB: &str = "candidates";
pub(crate) const CANDIDATE_INDEX_DB: &str = "candidate_index";
pub(crate) const VOTERS_DB: &str = "voters";
pub(crate) const VOTES_DB: &str = "votes";
pub(crate) const META_DB: &str = "meta";

/// Wraps the LMDB environment and all database handles.
///
/// LMDB allows a single write transaction per environment at a time and gives
/// every read transaction a consistent snapshot, which is exactly the
/// isolation the election service relies on.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) elections_db: Database<Bytes, Bytes>,
    pub(crate) candidates_db: Database<Bytes, Bytes>,
    pub(crate) candidate_index_db: Database<Bytes, Bytes>,
    pub(crate) voters_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path, creating any
    /// missing databases and bringing the schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(MAX_DBS);

        // SAFETY: the environment is opened once per path by this process and
        // the data file is not modified by anything else while it is open.
        // NO_TLS ties reader slots to transactions instead of threads, so one
        // thread may hold several read snapshots at once.
        let env = unsafe {
            options.flags(EnvFlags::NO_TLS);
            options.open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let elections_db = env.create_database(&mut wtxn, Some(ELECTIONS_DB))?;
        let candidates_db = env.create_database(&mut wtxn, Some(CANDIDATES_DB))?;
        let candidate_index_db = env.create_database(&mut wtxn, Some(CANDIDATE_INDEX_DB))?;
        let voters_db = env.create_database(&mut wtxn, Some(VOTERS_DB))?;
        let votes_db = env.create_database(&mut wtxn, Some(VOTES_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let environment = Self {
            env,
            elections_db,
            candidates_db,
            candidate_index_db,
            voters_db,
            votes_db,
            meta_db,
        };

        Migrator::run(&environment)?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(environment)
    }

    /// The underlying heed environment.
    pub fn env(&self) -> &Env {
        &self.env
    }

    // ── Snapshot reads shared by read and write transactions ────────────

    pub(crate) fn read_election(
        &self,
        txn: &RoTxn,
        id: ElectionId,
    ) -> Result<Option<Election>, LmdbError> {
        match self.elections_db.get(txn, keys::election_key(id).as_slice())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn read_all_elections(&self, txn: &RoTxn) -> Result<Vec<Election>, LmdbError> {
        let mut elections = Vec::new();
        for result in self.elections_db.iter(txn)? {
            let (_, bytes) = result?;
            elections.push(bincode::deserialize(bytes)?);
        }
        Ok(elections)
    }

    pub(crate) fn read_candidate(
        &self,
        txn: &RoTxn,
        id: CandidateId,
    ) -> Result<Option<Candidate>, LmdbError> {
        let election = match self
            .candidate_index_db
            .get(txn, keys::candidate_index_key(id).as_slice())?
        {
            Some(bytes) => keys::decode_u64(bytes).map(ElectionId::new).ok_or_else(|| {
                LmdbError::Serialization(format!("invalid candidate index entry for {id}"))
            })?,
            None => return Ok(None),
        };
        let key = keys::candidate_key(election, id);
        match self.candidates_db.get(txn, key.as_slice())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Err(LmdbError::NotFound(format!(
                "candidate {id} is indexed under election {election} but has no record"
            ))),
        }
    }

    pub(crate) fn read_registered(&self, txn: &RoTxn, identity: &Identity) -> Result<bool, LmdbError> {
        Ok(self.voters_db.get(txn, keys::voter_key(identity))?.is_some())
    }

    pub(crate) fn read_has_voted(
        &self,
        txn: &RoTxn,
        identity: &Identity,
        election: ElectionId,
    ) -> Result<bool, LmdbError> {
        let key = keys::vote_key(election, identity);
        Ok(self.votes_db.get(txn, key.as_slice())?.is_some())
    }

    pub(crate) fn read_vote_count(&self, txn: &RoTxn, election: ElectionId) -> Result<u64, LmdbError> {
        let prefix = keys::election_key(election);
        let mut count = 0u64;
        for result in self.votes_db.prefix_iter(txn, prefix.as_slice())? {
            result?;
            count += 1;
        }
        Ok(count)
    }

    pub(crate) fn read_meta(&self, txn: &RoTxn, key: &str) -> Result<Option<Vec<u8>>, LmdbError> {
        Ok(self.meta_db.get(txn, key.as_bytes())?.map(|v| v.to_vec()))
    }
}

impl Store for LmdbEnvironment {
    type Read<'a> = LmdbReadTxn<'a>;
    type Write<'a> = LmdbWriteTxn<'a>;

    fn read_txn(&self) -> Result<LmdbReadTxn<'_>, StoreError> {
        Ok(LmdbReadTxn::new(self)?)
    }

    fn write_txn(&self) -> Result<LmdbWriteTxn<'_>, StoreError> {
        Ok(LmdbWriteTxn::new(self)?)
    }
}
