//! Persisted election and candidate records.

use crate::id::{CandidateId, ElectionId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Where an election is in its lifecycle at a given instant.
///
/// Only `Finalized` is a stored fact; the other three are derived from the
/// time window. An election past its end time stays unfinalized (it simply
/// rejects votes) until someone finalizes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionStatus {
    /// Created but `now < start_time` (runoffs sit here during their cooldown).
    Scheduled,
    /// Accepting votes: `start_time <= now <= end_time`.
    Open,
    /// Past `end_time`, waiting for finalization.
    Closed,
    /// Finalized. Terminal.
    Finalized,
}

impl ElectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Finalized => "finalized",
        }
    }
}

/// A time-boxed contest with an ordered candidate list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub title: String,
    pub description: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub finalized: bool,
    /// Set on elections spawned by the runoff resolver.
    pub is_runoff: bool,
    /// The finalized election this runoff was spawned from.
    pub parent_election_id: Option<ElectionId>,
    /// The runoff spawned from this election. Written at most once.
    pub runoff_election_id: Option<ElectionId>,
    /// Only meaningful once `finalized` is true.
    pub requires_runoff: bool,
    /// Candidates in insertion order.
    pub candidate_ids: Vec<CandidateId>,
}

impl Election {
    /// Length of the voting window in seconds.
    pub fn duration_secs(&self) -> u64 {
        self.end_time.as_secs().saturating_sub(self.start_time.as_secs())
    }

    pub fn has_started(&self, now: Timestamp) -> bool {
        now >= self.start_time
    }

    pub fn has_ended(&self, now: Timestamp) -> bool {
        now > self.end_time
    }

    /// Whether a vote cast at `now` would pass the window and finalization gates.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.finalized && self.has_started(now) && !self.has_ended(now)
    }

    pub fn status(&self, now: Timestamp) -> ElectionStatus {
        if self.finalized {
            ElectionStatus::Finalized
        } else if !self.has_started(now) {
            ElectionStatus::Scheduled
        } else if self.has_ended(now) {
            ElectionStatus::Closed
        } else {
            ElectionStatus::Open
        }
    }
}

/// A contender in exactly one election.
///
/// A runoff never moves a candidate: it creates a fresh record, with a new id
/// and a zeroed tally, under the child election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub election_id: ElectionId,
    pub name: String,
    pub vote_count: u64,
    pub advanced_to_runoff: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn election(start: u64, end: u64) -> Election {
        Election {
            id: ElectionId::new(1),
            title: "Board".into(),
            description: String::new(),
            start_time: Timestamp::new(start),
            end_time: Timestamp::new(end),
            finalized: false,
            is_runoff: false,
            parent_election_id: None,
            runoff_election_id: None,
            requires_runoff: false,
            candidate_ids: Vec::new(),
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let e = election(100, 200);
        assert!(!e.is_active(Timestamp::new(99)));
        assert!(e.is_active(Timestamp::new(100)));
        assert!(e.is_active(Timestamp::new(200)));
        assert!(!e.is_active(Timestamp::new(201)));
    }

    #[test]
    fn status_follows_window_until_finalized() {
        let mut e = election(100, 200);
        assert_eq!(e.status(Timestamp::new(50)), ElectionStatus::Scheduled);
        assert_eq!(e.status(Timestamp::new(150)), ElectionStatus::Open);
        assert_eq!(e.status(Timestamp::new(250)), ElectionStatus::Closed);
        e.finalized = true;
        assert_eq!(e.status(Timestamp::new(150)), ElectionStatus::Finalized);
        assert!(!e.is_active(Timestamp::new(150)));
    }

    #[test]
    fn duration_is_window_length() {
        assert_eq!(election(100, 3_700).duration_secs(), 3_600);
    }
}
