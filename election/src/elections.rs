//! Election records and their lifecycle.

use runoff_store::{ReadTxn, WriteTxn};
use runoff_types::{Election, ElectionId, Timestamp};

use crate::error::ElectionError;
use crate::ids::IdAllocator;

/// Fields of an election about to be inserted.
pub(crate) struct ElectionDraft {
    pub title: String,
    pub description: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub parent: Option<ElectionId>,
}

pub struct ElectionStore;

impl ElectionStore {
    /// Create a first-generation election opening at `now`.
    pub fn create<T: WriteTxn>(
        txn: &mut T,
        ids: &IdAllocator,
        title: &str,
        description: &str,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<Election, ElectionError> {
        if duration_secs == 0 {
            return Err(ElectionError::InvalidDuration);
        }
        Self::insert(
            txn,
            ids,
            ElectionDraft {
                title: title.to_string(),
                description: description.to_string(),
                start_time: now,
                end_time: now.plus_secs(duration_secs),
                parent: None,
            },
        )
    }

    pub(crate) fn insert<T: WriteTxn>(
        txn: &mut T,
        ids: &IdAllocator,
        draft: ElectionDraft,
    ) -> Result<Election, ElectionError> {
        let election = Election {
            id: ids.next_election_id(txn)?,
            title: draft.title,
            description: draft.description,
            start_time: draft.start_time,
            end_time: draft.end_time,
            finalized: false,
            is_runoff: draft.parent.is_some(),
            parent_election_id: draft.parent,
            runoff_election_id: None,
            requires_runoff: false,
            candidate_ids: Vec::new(),
        };
        txn.put_election(&election)?;
        Ok(election)
    }

    pub fn get<T: ReadTxn>(txn: &T, id: ElectionId) -> Result<Election, ElectionError> {
        txn.get_election(id)?.ok_or(ElectionError::NotFound(id))
    }

    /// Fails unless `election` may be finalized at `now`.
    pub fn ensure_finalizable(election: &Election, now: Timestamp) -> Result<(), ElectionError> {
        if election.finalized {
            return Err(ElectionError::AlreadyFinalized(election.id));
        }
        if now <= election.end_time {
            return Err(ElectionError::StillActive {
                election: election.id,
                ends_at: election.end_time,
            });
        }
        Ok(())
    }

    /// Close the election for good. Candidates are untouched.
    pub fn mark_finalized<T: WriteTxn>(
        txn: &mut T,
        id: ElectionId,
        requires_runoff: bool,
        now: Timestamp,
    ) -> Result<Election, ElectionError> {
        let mut election = Self::get(txn, id)?;
        Self::ensure_finalizable(&election, now)?;
        election.finalized = true;
        election.requires_runoff = requires_runoff;
        txn.put_election(&election)?;
        Ok(election)
    }

    pub fn link_runoff<T: WriteTxn>(
        txn: &mut T,
        parent: ElectionId,
        child: ElectionId,
    ) -> Result<(), ElectionError> {
        let mut election = Self::get(txn, parent)?;
        if let Some(existing) = election.runoff_election_id {
            return Err(ElectionError::AlreadyLinked { parent, existing });
        }
        election.runoff_election_id = Some(child);
        txn.put_election(&election)?;
        Ok(())
    }

    pub fn list<T: ReadTxn>(txn: &T) -> Result<Vec<Election>, ElectionError> {
        Ok(txn.iter_elections()?)
    }
}
