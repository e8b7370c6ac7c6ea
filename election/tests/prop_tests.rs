use proptest::prelude::*;

use runoff_election::{ElectionError, ElectionService, IdAllocator};
use runoff_nullables::NullStore;
use runoff_types::{CandidateId, ElectionId, Identity, RunoffParams, Timestamp};

const START: u64 = 1_000;
const DURATION: u64 = 600;

fn admin() -> Identity {
    Identity::new("admin").unwrap()
}

fn voter(i: usize) -> Identity {
    Identity::new(format!("voter-{i}")).unwrap()
}

/// An open election with `candidates` candidates and `voters` registered voters.
fn setup(candidates: usize, voters: usize) -> (ElectionService<NullStore>, ElectionId, Vec<CandidateId>) {
    let svc = ElectionService::open(NullStore::new(), admin(), RunoffParams::default(), IdAllocator::default())
        .unwrap();
    let e = svc
        .create_election(&admin(), "prop", "", DURATION, Timestamp::new(START))
        .unwrap();
    let ids = (0..candidates)
        .map(|i| svc.add_candidate(&admin(), e.id, &format!("c{i}")).unwrap().id)
        .collect();
    for i in 0..voters {
        svc.register_to_vote(&voter(i)).unwrap();
    }
    (svc, e.id, ids)
}

proptest! {
    /// Tallies always sum to the number of identities that voted, however
    /// many duplicate attempts are mixed in.
    #[test]
    fn tallies_match_vote_facts(
        candidates in 1usize..6,
        ballots in prop::collection::vec((0usize..12, 0usize..6, 0u64..DURATION), 0..60),
    ) {
        let (svc, election, ids) = setup(candidates, 12);
        let mut accepted = std::collections::HashSet::new();

        for (v, c, offset) in ballots {
            let result = svc.vote(&voter(v), election, ids[c % candidates], Timestamp::new(START + offset));
            match result {
                Ok(_) => prop_assert!(accepted.insert(v)),
                Err(ElectionError::AlreadyVoted { .. }) => prop_assert!(accepted.contains(&v)),
                Err(other) => return Err(TestCaseError::fail(format!("unexpected error: {other}"))),
            }
        }

        let total: u64 = svc.get_election_results(election).unwrap().vote_counts.iter().sum();
        prop_assert_eq!(total, accepted.len() as u64);
        prop_assert_eq!(svc.vote_count(election).unwrap(), accepted.len() as u64);
        for v in 0..12 {
            prop_assert_eq!(svc.has_user_voted(&voter(v), election).unwrap(), accepted.contains(&v));
        }
    }

    /// A repeated vote never moves any tally.
    #[test]
    fn double_vote_changes_nothing(first in 0usize..4, second in 0usize..4) {
        let (svc, election, ids) = setup(4, 1);
        svc.vote(&voter(0), election, ids[first], Timestamp::new(START)).unwrap();
        let before = svc.get_election_results(election).unwrap();

        let err = svc.vote(&voter(0), election, ids[second], Timestamp::new(START + 1)).unwrap_err();
        prop_assert!(matches!(err, ElectionError::AlreadyVoted { .. }), "unexpected error: {}", err);
        prop_assert_eq!(svc.get_election_results(election).unwrap(), before);
    }

    /// Result columns line up with the candidate list, before and after finalization.
    #[test]
    fn results_columns_align_with_candidates(
        candidates in 0usize..8,
        choices in prop::collection::vec(0usize..8, 0..8),
    ) {
        let (svc, election, ids) = setup(candidates.max(1), choices.len());
        for (v, c) in choices.iter().enumerate() {
            svc.vote(&voter(v), election, ids[c % ids.len()], Timestamp::new(START)).unwrap();
        }
        svc.finalize_election(&admin(), election, Timestamp::new(START + DURATION + 1)).unwrap();

        let listed = svc.list_candidates(election).unwrap();
        let results = svc.get_election_results(election).unwrap();
        prop_assert_eq!(results.len(), listed.len());
        prop_assert_eq!(results.names.len(), listed.len());
        prop_assert_eq!(results.vote_counts.len(), listed.len());
        prop_assert_eq!(results.advanced_to_runoff.len(), listed.len());
        for (i, c) in listed.iter().enumerate() {
            prop_assert_eq!(results.candidate_ids[i], c.id);
            prop_assert_eq!(&results.names[i], &c.name);
            prop_assert_eq!(results.vote_counts[i], c.vote_count);
            prop_assert_eq!(results.advanced_to_runoff[i], c.advanced_to_runoff);
        }
    }

    /// Finalizing at or before the end time fails and leaves everything as it was.
    #[test]
    fn early_finalize_is_pure(offset in 0u64..=DURATION, votes in 0usize..4) {
        let (svc, election, ids) = setup(2, votes);
        for v in 0..votes {
            svc.vote(&voter(v), election, ids[v % 2], Timestamp::new(START)).unwrap();
        }
        let elections_before = svc.list_elections().unwrap();
        let results_before = svc.get_election_results(election).unwrap();

        let err = svc
            .finalize_election(&admin(), election, Timestamp::new(START + offset))
            .unwrap_err();
        prop_assert!(matches!(err, ElectionError::StillActive { .. }), "unexpected error: {}", err);
        prop_assert_eq!(svc.list_elections().unwrap(), elections_before);
        prop_assert_eq!(svc.get_election_results(election).unwrap(), results_before);
    }

    /// A spawned runoff carries exactly the candidates that shared the top tally.
    #[test]
    fn runoff_carries_exactly_the_tie_set(choices in prop::collection::vec(0usize..4, 0..16)) {
        let (svc, election, ids) = setup(4, choices.len());
        for (v, c) in choices.iter().enumerate() {
            svc.vote(&voter(v), election, ids[*c], Timestamp::new(START)).unwrap();
        }
        let outcome = svc
            .finalize_election(&admin(), election, Timestamp::new(START + DURATION + 1))
            .unwrap();

        let tallies = svc.get_election_results(election).unwrap();
        let max = tallies.vote_counts.iter().copied().max().unwrap_or(0);
        let tied: Vec<String> = tallies
            .names
            .iter()
            .zip(&tallies.vote_counts)
            .filter(|(_, votes)| **votes == max)
            .map(|(name, _)| name.clone())
            .collect();

        match outcome.runoff {
            Some(runoff) => {
                prop_assert!(tied.len() > 1);
                let carried: Vec<String> = runoff.candidates.iter().map(|c| c.name.clone()).collect();
                prop_assert_eq!(carried, tied);
            }
            None => prop_assert_eq!(tied.len(), 1),
        }
    }
}
