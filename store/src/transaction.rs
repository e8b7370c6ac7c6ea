//! Transaction traits.
//!
//! Record families and their logical keys:
//!
//! | family     | key                         | value        |
//! |------------|-----------------------------|--------------|
//! | elections  | election id                 | `Election`   |
//! | candidates | (election id, candidate id) | `Candidate`  |
//! | voters     | identity                    | registration |
//! | votes      | (election id, identity)     | vote fact    |
//! | meta       | string key                  | raw bytes    |

use crate::StoreError;
use runoff_types::{Candidate, CandidateId, Election, ElectionId, Identity};

/// Read access to one committed snapshot.
pub trait ReadTxn {
    /// Get an election by id.
    fn get_election(&self, id: ElectionId) -> Result<Option<Election>, StoreError>;

    /// All elections, in id order.
    fn iter_elections(&self) -> Result<Vec<Election>, StoreError>;

    /// Get a candidate by its global id.
    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;

    /// Whether the identity holds a voter registration.
    fn is_registered(&self, identity: &Identity) -> Result<bool, StoreError>;

    /// Whether a vote fact exists for `(identity, election)`.
    fn has_voted(&self, identity: &Identity, election: ElectionId) -> Result<bool, StoreError>;

    /// Number of vote facts recorded for an election.
    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError>;

    /// Retrieve a metadata value.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Exclusive write access. Reads through a write transaction see its own writes.
pub trait WriteTxn: ReadTxn {
    /// Insert or replace an election record.
    fn put_election(&mut self, election: &Election) -> Result<(), StoreError>;

    /// Insert or replace a candidate record (keyed by its election and id).
    fn put_candidate(&mut self, candidate: &Candidate) -> Result<(), StoreError>;

    /// Record a voter registration.
    fn put_registration(&mut self, identity: &Identity) -> Result<(), StoreError>;

    /// Record the vote fact for `(identity, election)`.
    fn put_vote(&mut self, identity: &Identity, election: ElectionId) -> Result<(), StoreError>;

    /// Store a metadata value.
    fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Make every write in this transaction visible atomically.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// A transactional store.
pub trait Store: Send + Sync {
    type Read<'a>: ReadTxn
    where
        Self: 'a;

    type Write<'a>: WriteTxn
    where
        Self: 'a;

    /// Open a read snapshot of the latest committed state.
    fn read_txn(&self) -> Result<Self::Read<'_>, StoreError>;

    /// Open the write transaction, blocking while another one is open.
    fn write_txn(&self) -> Result<Self::Write<'_>, StoreError>;
}
