//! Nullable store: thread-safe in-memory transactional storage for testing.
//!
//! Mirrors the LMDB isolation model: one writer at a time, readers hold an
//! immutable snapshot of the last commit, and a write transaction works on a
//! private copy that replaces the committed state only on commit.

use runoff_store::{ReadTxn, Store, StoreError, WriteTxn};
use runoff_types::{Candidate, CandidateId, Election, ElectionId, Identity};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

#[derive(Clone, Default)]
struct Snapshot {
    elections: BTreeMap<ElectionId, Election>,
    candidates: BTreeMap<CandidateId, Candidate>,
    voters: BTreeSet<Identity>,
    votes: BTreeSet<(ElectionId, Identity)>,
    meta: HashMap<String, Vec<u8>>,
}

impl Snapshot {
    fn get_election(&self, id: ElectionId) -> Option<Election> {
        self.elections.get(&id).cloned()
    }

    fn iter_elections(&self) -> Vec<Election> {
        self.elections.values().cloned().collect()
    }

    fn get_candidate(&self, id: CandidateId) -> Option<Candidate> {
        self.candidates.get(&id).cloned()
    }

    fn is_registered(&self, identity: &Identity) -> bool {
        self.voters.contains(identity)
    }

    fn has_voted(&self, identity: &Identity, election: ElectionId) -> bool {
        self.votes.contains(&(election, identity.clone()))
    }

    fn vote_count(&self, election: ElectionId) -> u64 {
        self.votes.iter().filter(|(e, _)| *e == election).count() as u64
    }

    fn get_meta(&self, key: &str) -> Option<Vec<u8>> {
        self.meta.get(key).cloned()
    }
}

/// An in-memory store with snapshot isolation.
pub struct NullStore {
    committed: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
    fail_commits: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(Arc::new(Snapshot::default())),
            writer: Mutex::new(()),
            fail_commits: AtomicBool::new(false),
        }
    }

    /// Make every subsequent commit fail with a backend error (or stop doing so).
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>, StoreError> {
        self.committed
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| StoreError::Backend("committed state lock poisoned".into()))
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A read snapshot of a [`NullStore`].
pub struct NullReadTxn {
    snapshot: Arc<Snapshot>,
}

impl ReadTxn for NullReadTxn {
    fn get_election(&self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.snapshot.get_election(id))
    }

    fn iter_elections(&self) -> Result<Vec<Election>, StoreError> {
        Ok(self.snapshot.iter_elections())
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.snapshot.get_candidate(id))
    }

    fn is_registered(&self, identity: &Identity) -> Result<bool, StoreError> {
        Ok(self.snapshot.is_registered(identity))
    }

    fn has_voted(&self, identity: &Identity, election: ElectionId) -> Result<bool, StoreError> {
        Ok(self.snapshot.has_voted(identity, election))
    }

    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError> {
        Ok(self.snapshot.vote_count(election))
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.snapshot.get_meta(key))
    }
}

/// The single write transaction of a [`NullStore`].
pub struct NullWriteTxn<'a> {
    store: &'a NullStore,
    working: Snapshot,
    _writer: MutexGuard<'a, ()>,
}

impl ReadTxn for NullWriteTxn<'_> {
    fn get_election(&self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.working.get_election(id))
    }

    fn iter_elections(&self) -> Result<Vec<Election>, StoreError> {
        Ok(self.working.iter_elections())
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.working.get_candidate(id))
    }

    fn is_registered(&self, identity: &Identity) -> Result<bool, StoreError> {
        Ok(self.working.is_registered(identity))
    }

    fn has_voted(&self, identity: &Identity, election: ElectionId) -> Result<bool, StoreError> {
        Ok(self.working.has_voted(identity, election))
    }

    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError> {
        Ok(self.working.vote_count(election))
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.working.get_meta(key))
    }
}

impl WriteTxn for NullWriteTxn<'_> {
    fn put_election(&mut self, election: &Election) -> Result<(), StoreError> {
        self.working.elections.insert(election.id, election.clone());
        Ok(())
    }

    fn put_candidate(&mut self, candidate: &Candidate) -> Result<(), StoreError> {
        self.working.candidates.insert(candidate.id, candidate.clone());
        Ok(())
    }

    fn put_registration(&mut self, identity: &Identity) -> Result<(), StoreError> {
        self.working.voters.insert(identity.clone());
        Ok(())
    }

    fn put_vote(&mut self, identity: &Identity, election: ElectionId) -> Result<(), StoreError> {
        self.working.votes.insert((election, identity.clone()));
        Ok(())
    }

    fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.working.meta.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.store.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut committed = self
            .store
            .committed
            .write()
            .map_err(|_| StoreError::Backend("committed state lock poisoned".into()))?;
        *committed = Arc::new(self.working);
        Ok(())
    }
}

impl Store for NullStore {
    type Read<'a> = NullReadTxn;
    type Write<'a> = NullWriteTxn<'a>;

    fn read_txn(&self) -> Result<NullReadTxn, StoreError> {
        Ok(NullReadTxn {
            snapshot: self.snapshot()?,
        })
    }

    fn write_txn(&self) -> Result<NullWriteTxn<'_>, StoreError> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Backend("writer lock poisoned".into()))?;
        let working = (*self.snapshot()?).clone();
        Ok(NullWriteTxn {
            store: self,
            working,
            _writer: writer,
        })
    }
}
