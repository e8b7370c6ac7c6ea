//! LMDB read and write transactions.
//!
//! A [`LmdbWriteTxn`] groups every record touched by one ledger operation
//! into a single LMDB write transaction. If it is dropped without calling
//! [`WriteTxn::commit`], all operations are rolled back (the underlying LMDB
//! transaction is aborted).

use heed::{RoTxn, RwTxn};

use runoff_store::{ReadTxn, StoreError, WriteTxn};
use runoff_types::{Candidate, CandidateId, Election, ElectionId, Identity};

use crate::environment::LmdbEnvironment;
use crate::keys;
use crate::LmdbError;

/// Marker value for voter registrations.
const REGISTERED: &[u8] = &[1];

/// A read-only snapshot of the environment.
pub struct LmdbReadTxn<'a> {
    txn: RoTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> LmdbReadTxn<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let txn = env.env().read_txn()?;
        Ok(Self { txn, env })
    }
}

impl ReadTxn for LmdbReadTxn<'_> {
    fn get_election(&self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.env.read_election(&self.txn, id)?)
    }

    fn iter_elections(&self) -> Result<Vec<Election>, StoreError> {
        Ok(self.env.read_all_elections(&self.txn)?)
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.env.read_candidate(&self.txn, id)?)
    }

    fn is_registered(&self, identity: &Identity) -> Result<bool, StoreError> {
        Ok(self.env.read_registered(&self.txn, identity)?)
    }

    fn has_voted(&self, identity: &Identity, election: ElectionId) -> Result<bool, StoreError> {
        Ok(self.env.read_has_voted(&self.txn, identity, election)?)
    }

    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError> {
        Ok(self.env.read_vote_count(&self.txn, election)?)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.env.read_meta(&self.txn, key)?)
    }
}

/// The environment's single write transaction.
pub struct LmdbWriteTxn<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> LmdbWriteTxn<'a> {
    /// Begin a new write transaction, waiting for any other writer to finish.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let txn = env.env().write_txn()?;
        Ok(Self { txn, env })
    }
}

impl ReadTxn for LmdbWriteTxn<'_> {
    fn get_election(&self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.env.read_election(&self.txn, id)?)
    }

    fn iter_elections(&self) -> Result<Vec<Election>, StoreError> {
        Ok(self.env.read_all_elections(&self.txn)?)
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.env.read_candidate(&self.txn, id)?)
    }

    fn is_registered(&self, identity: &Identity) -> Result<bool, StoreError> {
        Ok(self.env.read_registered(&self.txn, identity)?)
    }

    fn has_voted(&self, identity: &Identity, election: ElectionId) -> Result<bool, StoreError> {
        Ok(self.env.read_has_voted(&self.txn, identity, election)?)
    }

    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError> {
        Ok(self.env.read_vote_count(&self.txn, election)?)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.env.read_meta(&self.txn, key)?)
    }
}

impl WriteTxn for LmdbWriteTxn<'_> {
    fn put_election(&mut self, election: &Election) -> Result<(), StoreError> {
        let bytes = bincode::serialize(election).map_err(LmdbError::from)?;
        self.env
            .elections_db
            .put(&mut self.txn, keys::election_key(election.id).as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Writes the record under its composite key and maintains the
    /// candidate id → election id index.
    fn put_candidate(&mut self, candidate: &Candidate) -> Result<(), StoreError> {
        let bytes = bincode::serialize(candidate).map_err(LmdbError::from)?;
        let key = keys::candidate_key(candidate.election_id, candidate.id);
        self.env
            .candidates_db
            .put(&mut self.txn, key.as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .candidate_index_db
            .put(
                &mut self.txn,
                keys::candidate_index_key(candidate.id).as_slice(),
                keys::election_key(candidate.election_id).as_slice(),
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_registration(&mut self, identity: &Identity) -> Result<(), StoreError> {
        self.env
            .voters_db
            .put(&mut self.txn, keys::voter_key(identity), REGISTERED)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_vote(&mut self, identity: &Identity, election: ElectionId) -> Result<(), StoreError> {
        let key = keys::vote_key(election, identity);
        self.env
            .votes_db
            .put(&mut self.txn, key.as_slice(), &[])
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Commit all operations in a single write transaction.
    ///
    /// This is the only fsync for the whole operation.
    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runoff_store::Store;
    use runoff_types::Timestamp;

    /// Helper: open a temporary LMDB environment.
    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("failed to open env");
        (dir, env)
    }

    fn election(id: u64) -> Election {
        Election {
            id: ElectionId::new(id),
            title: format!("Election {id}"),
            description: "test".into(),
            start_time: Timestamp::new(1_000),
            end_time: Timestamp::new(4_600),
            finalized: false,
            is_runoff: false,
            parent_election_id: None,
            runoff_election_id: None,
            requires_runoff: false,
            candidate_ids: Vec::new(),
        }
    }

    fn candidate(id: u64, election: u64, name: &str) -> Candidate {
        Candidate {
            id: CandidateId::new(id),
            election_id: ElectionId::new(election),
            name: name.into(),
            vote_count: 0,
            advanced_to_runoff: false,
        }
    }

    #[test]
    fn committed_writes_are_readable() {
        let (_dir, env) = temp_env();

        let mut txn = env.write_txn().expect("write_txn");
        txn.put_election(&election(1)).expect("put_election");
        txn.put_candidate(&candidate(1, 1, "Alice")).expect("put_candidate");
        txn.commit().expect("commit");

        let rtxn = env.read_txn().expect("read_txn");
        assert_eq!(rtxn.get_election(ElectionId::new(1)).unwrap(), Some(election(1)));
        let alice = rtxn.get_candidate(CandidateId::new(1)).unwrap().unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.election_id, ElectionId::new(1));
    }

    #[test]
    fn dropped_txn_does_not_persist() {
        let (_dir, env) = temp_env();

        {
            let mut txn = env.write_txn().expect("write_txn");
            txn.put_election(&election(7)).expect("put_election");
            // dropped here, implicit abort
        }

        let rtxn = env.read_txn().expect("read_txn");
        assert_eq!(rtxn.get_election(ElectionId::new(7)).unwrap(), None);
    }

    #[test]
    fn write_txn_reads_its_own_writes() {
        let (_dir, env) = temp_env();
        let voter = Identity::new("voter-1").unwrap();

        let mut txn = env.write_txn().expect("write_txn");
        assert!(!txn.is_registered(&voter).unwrap());
        txn.put_registration(&voter).unwrap();
        assert!(txn.is_registered(&voter).unwrap());
        txn.commit().unwrap();

        assert!(env.read_txn().unwrap().is_registered(&voter).unwrap());
    }

    #[test]
    fn vote_count_is_scoped_to_election() {
        let (_dir, env) = temp_env();
        let a = Identity::new("a").unwrap();
        let b = Identity::new("b").unwrap();

        let mut txn = env.write_txn().unwrap();
        txn.put_vote(&a, ElectionId::new(1)).unwrap();
        txn.put_vote(&b, ElectionId::new(1)).unwrap();
        txn.put_vote(&a, ElectionId::new(2)).unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(rtxn.vote_count(ElectionId::new(1)).unwrap(), 2);
        assert_eq!(rtxn.vote_count(ElectionId::new(2)).unwrap(), 1);
        assert_eq!(rtxn.vote_count(ElectionId::new(3)).unwrap(), 0);
        assert!(rtxn.has_voted(&a, ElectionId::new(2)).unwrap());
        assert!(!rtxn.has_voted(&b, ElectionId::new(2)).unwrap());
    }

    #[test]
    fn elections_iterate_in_id_order() {
        let (_dir, env) = temp_env();

        let mut txn = env.write_txn().unwrap();
        for id in [300u64, 2, 17] {
            txn.put_election(&election(id)).unwrap();
        }
        txn.commit().unwrap();

        let ids: Vec<u64> = env
            .read_txn()
            .unwrap()
            .iter_elections()
            .unwrap()
            .iter()
            .map(|e| e.id.get())
            .collect();
        assert_eq!(ids, vec![2, 17, 300]);
    }

    #[test]
    fn read_snapshot_ignores_later_commits() {
        let (_dir, env) = temp_env();

        let snapshot = env.read_txn().unwrap();

        let mut txn = env.write_txn().unwrap();
        txn.put_election(&election(1)).unwrap();
        txn.commit().unwrap();

        assert_eq!(snapshot.get_election(ElectionId::new(1)).unwrap(), None);
        assert!(env
            .read_txn()
            .unwrap()
            .get_election(ElectionId::new(1))
            .unwrap()
            .is_some());
    }

    #[test]
    fn unknown_candidate_is_none() {
        let (_dir, env) = temp_env();
        let rtxn = env.read_txn().unwrap();
        assert_eq!(rtxn.get_candidate(CandidateId::new(99)).unwrap(), None);
    }
}
