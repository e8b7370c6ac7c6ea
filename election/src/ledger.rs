//! The vote ledger.
//!
//! A vote fact for `(identity, election)` is written at most once and is the
//! only guard against double voting. Writing the fact and bumping the chosen
//! candidate's tally happen in the caller's write transaction, so both land
//! together or not at all.

use runoff_store::{ReadTxn, WriteTxn};
use runoff_types::{Candidate, CandidateId, ElectionId, Identity, Timestamp};

use crate::elections::ElectionStore;
use crate::error::ElectionError;
use crate::identity::IdentityRegistry;

pub struct VoteLedger;

impl VoteLedger {
    /// Record `voter`'s vote for `candidate_id` and return the updated candidate.
    ///
    /// Checks run in a fixed order and the first failing one is reported:
    /// registration, election existence, start time, end time, finalization,
    /// candidate membership, prior vote.
    pub fn vote<T: WriteTxn>(
        txn: &mut T,
        registry: &IdentityRegistry,
        voter: &Identity,
        election_id: ElectionId,
        candidate_id: CandidateId,
        now: Timestamp,
    ) -> Result<Candidate, ElectionError> {
        if !registry.is_registered(txn, voter)? {
            return Err(ElectionError::NotRegistered(voter.clone()));
        }
        let election = ElectionStore::get(txn, election_id)?;
        if !election.has_started(now) {
            return Err(ElectionError::NotStarted {
                election: election_id,
                starts_at: election.start_time,
            });
        }
        if election.has_ended(now) {
            return Err(ElectionError::Ended {
                election: election_id,
                ended_at: election.end_time,
            });
        }
        if election.finalized {
            return Err(ElectionError::ElectionFinalized(election_id));
        }
        let mut candidate = match txn.get_candidate(candidate_id)? {
            Some(c) if c.election_id == election_id => c,
            _ => return Err(ElectionError::CandidateNotFound(candidate_id)),
        };
        if txn.has_voted(voter, election_id)? {
            return Err(ElectionError::AlreadyVoted {
                voter: voter.clone(),
                election: election_id,
            });
        }

        txn.put_vote(voter, election_id)?;
        candidate.vote_count += 1;
        txn.put_candidate(&candidate)?;
        Ok(candidate)
    }

    pub fn has_voted<T: ReadTxn>(
        txn: &T,
        voter: &Identity,
        election_id: ElectionId,
    ) -> Result<bool, ElectionError> {
        Ok(txn.has_voted(voter, election_id)?)
    }

    /// Number of identities that voted in the election.
    pub fn vote_count<T: ReadTxn>(txn: &T, election_id: ElectionId) -> Result<u64, ElectionError> {
        Ok(txn.vote_count(election_id)?)
    }
}
