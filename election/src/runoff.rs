//! Tie detection and runoff spawning.
//!
//! When a first-generation election is finalized with two or more
//! candidates sharing the highest tally, a child election is created that
//! carries every tied candidate forward under a fresh id with a zero tally.
//! Runoffs themselves are never resolved again: a tie inside a runoff is only
//! reported through the winner query.

use runoff_store::WriteTxn;
use runoff_types::{Candidate, Election, RunoffParams, Timestamp};

use crate::candidates::CandidateStore;
use crate::elections::{ElectionDraft, ElectionStore};
use crate::error::ElectionError;
use crate::ids::IdAllocator;

/// The candidates sharing the highest tally, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TieSet {
    pub max_votes: u64,
    pub tied: Vec<Candidate>,
}

impl TieSet {
    /// `candidates` must be in insertion order; the result keeps it.
    pub fn compute(candidates: &[Candidate]) -> Self {
        let max_votes = candidates.iter().map(|c| c.vote_count).max().unwrap_or(0);
        let tied = candidates
            .iter()
            .filter(|c| c.vote_count == max_votes)
            .cloned()
            .collect();
        Self { max_votes, tied }
    }

    pub fn is_tie(&self) -> bool {
        self.tied.len() > 1
    }
}

/// A runoff created during finalization.
#[derive(Clone, Debug)]
pub struct SpawnedRunoff {
    pub election: Election,
    pub candidates: Vec<Candidate>,
}

pub struct RunoffResolver<'a> {
    params: &'a RunoffParams,
    ids: &'a IdAllocator,
}

impl<'a> RunoffResolver<'a> {
    pub fn new(params: &'a RunoffParams, ids: &'a IdAllocator) -> Self {
        Self { params, ids }
    }

    /// Spawn a runoff for `parent` if its top tally is shared.
    ///
    /// Returns `None` when there is a single leader or fewer than two
    /// candidates. The caller finalizes `parent` in the same transaction.
    pub fn resolve<T: WriteTxn>(
        &self,
        txn: &mut T,
        parent: &Election,
        now: Timestamp,
    ) -> Result<Option<SpawnedRunoff>, ElectionError> {
        if parent.is_runoff {
            return Ok(None);
        }
        let candidates = CandidateStore::list_for(txn, parent.id)?;
        if candidates.len() < 2 {
            return Ok(None);
        }
        let ties = TieSet::compute(&candidates);
        if !ties.is_tie() {
            return Ok(None);
        }

        let start_time = now.plus_secs(self.params.cooldown_secs);
        let child = ElectionStore::insert(
            txn,
            self.ids,
            ElectionDraft {
                title: self.params.runoff_title(&parent.title),
                description: RunoffParams::runoff_description(parent.id.get(), &parent.title),
                start_time,
                end_time: start_time.plus_secs(parent.duration_secs()),
                parent: Some(parent.id),
            },
        )?;

        let mut carried = Vec::with_capacity(ties.tied.len());
        for original in &ties.tied {
            carried.push(CandidateStore::insert(txn, self.ids, child.id, &original.name, true)?);
            CandidateStore::mark_advanced(txn, original.id)?;
        }
        ElectionStore::link_runoff(txn, parent.id, child.id)?;

        tracing::debug!(
            parent = %parent.id,
            child = %child.id,
            tied = carried.len(),
            max_votes = ties.max_votes,
            "spawned runoff"
        );

        Ok(Some(SpawnedRunoff {
            election: ElectionStore::get(txn, child.id)?,
            candidates: carried,
        }))
    }
}
