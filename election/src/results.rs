//! Read-only views over an election's tallies.

use runoff_types::{Candidate, CandidateId, ElectionId};
use serde::Serialize;

use crate::runoff::TieSet;

/// Candidate data as index-aligned columns, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ElectionResults {
    pub election_id: ElectionId,
    pub candidate_ids: Vec<CandidateId>,
    pub names: Vec<String>,
    pub vote_counts: Vec<u64>,
    pub advanced_to_runoff: Vec<bool>,
}

impl ElectionResults {
    pub fn from_candidates(election_id: ElectionId, candidates: &[Candidate]) -> Self {
        Self {
            election_id,
            candidate_ids: candidates.iter().map(|c| c.id).collect(),
            names: candidates.iter().map(|c| c.name.clone()).collect(),
            vote_counts: candidates.iter().map(|c| c.vote_count).collect(),
            advanced_to_runoff: candidates.iter().map(|c| c.advanced_to_runoff).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidate_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidate_ids.is_empty()
    }
}

/// Outcome of a finalized election.
///
/// The winner is the earliest-added candidate holding the top tally. An
/// election nobody voted in has no winner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WinnerReport {
    pub has_winner: bool,
    pub winner_id: Option<CandidateId>,
    pub winner_name: Option<String>,
    pub winner_votes: u64,
    /// At least two candidates share a non-zero top tally.
    pub is_tied: bool,
}

impl WinnerReport {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let ties = TieSet::compute(candidates);
        let leader = ties.tied.first().filter(|_| ties.max_votes > 0);
        Self {
            has_winner: leader.is_some(),
            winner_id: leader.map(|c| c.id),
            winner_name: leader.map(|c| c.name.clone()),
            winner_votes: ties.max_votes,
            is_tied: ties.max_votes > 0 && ties.is_tie(),
        }
    }
}
