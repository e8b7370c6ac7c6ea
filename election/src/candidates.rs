//! Candidate records, each owned by exactly one election.

use runoff_store::{ReadTxn, StoreError, WriteTxn};
use runoff_types::{Candidate, CandidateId, ElectionId};

use crate::elections::ElectionStore;
use crate::error::ElectionError;
use crate::ids::IdAllocator;

pub struct CandidateStore;

impl CandidateStore {
    /// Append a candidate to an election that is still open for changes.
    pub fn add<T: WriteTxn>(
        txn: &mut T,
        ids: &IdAllocator,
        election: ElectionId,
        name: &str,
    ) -> Result<Candidate, ElectionError> {
        Self::insert(txn, ids, election, name, false)
    }

    pub(crate) fn insert<T: WriteTxn>(
        txn: &mut T,
        ids: &IdAllocator,
        election_id: ElectionId,
        name: &str,
        advanced_to_runoff: bool,
    ) -> Result<Candidate, ElectionError> {
        let mut election = ElectionStore::get(txn, election_id)?;
        if election.finalized {
            return Err(ElectionError::ElectionFinalized(election_id));
        }
        let candidate = Candidate {
            id: ids.next_candidate_id(txn)?,
            election_id,
            name: name.to_string(),
            vote_count: 0,
            advanced_to_runoff,
        };
        election.candidate_ids.push(candidate.id);
        txn.put_candidate(&candidate)?;
        txn.put_election(&election)?;
        Ok(candidate)
    }

    pub fn get<T: ReadTxn>(txn: &T, id: CandidateId) -> Result<Candidate, ElectionError> {
        txn.get_candidate(id)?.ok_or(ElectionError::CandidateNotFound(id))
    }

    /// Candidates of an election in the order they were added.
    pub fn list_for<T: ReadTxn>(txn: &T, election_id: ElectionId) -> Result<Vec<Candidate>, ElectionError> {
        let election = ElectionStore::get(txn, election_id)?;
        election
            .candidate_ids
            .iter()
            .map(|&id| -> Result<Candidate, ElectionError> {
                let candidate = txn.get_candidate(id)?.ok_or_else(|| {
                    StoreError::Corruption(format!("election {election_id} lists missing candidate {id}"))
                })?;
                Ok(candidate)
            })
            .collect()
    }

    /// Flag a candidate as carried into a runoff. Idempotent.
    pub fn mark_advanced<T: WriteTxn>(txn: &mut T, id: CandidateId) -> Result<Candidate, ElectionError> {
        let mut candidate = Self::get(txn, id)?;
        if !candidate.advanced_to_runoff {
            candidate.advanced_to_runoff = true;
            txn.put_candidate(&candidate)?;
        }
        Ok(candidate)
    }
}
