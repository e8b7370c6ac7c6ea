//! The election service: every public operation of the ledger.
//!
//! Each mutating call runs inside one write transaction of the underlying
//! [`Store`]. Preconditions are checked against that transaction's view, the
//! full effect (including a spawned runoff) is written through it, and it is
//! committed only if everything succeeded. Notifications collected along the
//! way are emitted after the commit; a failed call emits nothing.

use std::collections::HashSet;

use runoff_store::{ReadTxn, Store, StoreError, WriteTxn};
use runoff_types::{
    Candidate, CandidateId, Election, ElectionId, Identity, RunoffParams, Timestamp,
};

use crate::candidates::CandidateStore;
use crate::elections::ElectionStore;
use crate::error::ElectionError;
use crate::event::{ElectionEvent, EventBus};
use crate::identity::IdentityRegistry;
use crate::ids::IdAllocator;
use crate::ledger::VoteLedger;
use crate::results::{ElectionResults, WinnerReport};
use crate::runoff::{RunoffResolver, SpawnedRunoff};

/// What a successful finalization produced.
#[derive(Clone, Debug)]
pub struct FinalizeOutcome {
    pub election: Election,
    pub runoff: Option<SpawnedRunoff>,
}

impl FinalizeOutcome {
    pub fn requires_runoff(&self) -> bool {
        self.election.requires_runoff
    }
}

pub struct ElectionService<S: Store> {
    store: S,
    registry: IdentityRegistry,
    params: RunoffParams,
    ids: IdAllocator,
    events: EventBus,
}

impl<S: Store> ElectionService<S> {
    /// Open the ledger on `store`, binding it to `admin` on first use.
    pub fn open(
        store: S,
        admin: Identity,
        params: RunoffParams,
        ids: IdAllocator,
    ) -> Result<Self, ElectionError> {
        let registry = {
            let mut txn = store.write_txn()?;
            let registry = IdentityRegistry::establish(&mut txn, admin)?;
            txn.commit()?;
            registry
        };
        tracing::info!(admin = %registry.admin(), cooldown_secs = params.cooldown_secs, "election service ready");
        Ok(Self {
            store,
            registry,
            params,
            ids,
            events: EventBus::new(),
        })
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> &RunoffParams {
        &self.params
    }

    pub fn admin(&self) -> &Identity {
        self.registry.admin()
    }

    // ── Mutations ──────────────────────────────────────────────────────

    pub fn create_election(
        &self,
        caller: &Identity,
        title: &str,
        description: &str,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<Election, ElectionError> {
        self.write("create_election", |txn, events| {
            self.registry.require_admin(caller)?;
            let election = ElectionStore::create(txn, &self.ids, title, description, duration_secs, now)?;
            events.push(ElectionEvent::ElectionCreated {
                election: election.id,
                title: election.title.clone(),
                is_runoff: false,
            });
            Ok(election)
        })
        .inspect(|e| tracing::info!(election = %e.id, title = %e.title, ends = %e.end_time, "election created"))
    }

    pub fn add_candidate(
        &self,
        caller: &Identity,
        election: ElectionId,
        name: &str,
    ) -> Result<Candidate, ElectionError> {
        self.write("add_candidate", |txn, events| {
            self.registry.require_admin(caller)?;
            let candidate = CandidateStore::add(txn, &self.ids, election, name)?;
            events.push(ElectionEvent::CandidateAdded {
                election,
                candidate: candidate.id,
                name: candidate.name.clone(),
            });
            Ok(candidate)
        })
        .inspect(|c| tracing::info!(election = %election, candidate = %c.id, name = %c.name, "candidate added"))
    }

    pub fn register_to_vote(&self, caller: &Identity) -> Result<(), ElectionError> {
        self.write("register_to_vote", |txn, events| {
            self.registry.register(txn, caller)?;
            events.push(ElectionEvent::VoterRegistered {
                identity: caller.clone(),
            });
            Ok(())
        })
        .inspect(|_| tracing::info!(voter = %caller, "voter registered"))
    }

    pub fn vote(
        &self,
        caller: &Identity,
        election: ElectionId,
        candidate: CandidateId,
        now: Timestamp,
    ) -> Result<Candidate, ElectionError> {
        self.write("vote", |txn, events| {
            let updated = VoteLedger::vote(txn, &self.registry, caller, election, candidate, now)?;
            events.push(ElectionEvent::VoteCast {
                election,
                candidate,
                voter: caller.clone(),
            });
            Ok(updated)
        })
        .inspect(|c| tracing::info!(election = %election, candidate = %c.id, tally = c.vote_count, "vote cast"))
    }

    /// Close an election after its end time and resolve a top-tally tie.
    pub fn finalize_election(
        &self,
        caller: &Identity,
        election_id: ElectionId,
        now: Timestamp,
    ) -> Result<FinalizeOutcome, ElectionError> {
        self.write("finalize_election", |txn, events| {
            self.registry.require_admin(caller)?;
            let election = ElectionStore::get(txn, election_id)?;
            ElectionStore::ensure_finalizable(&election, now)?;

            let runoff = RunoffResolver::new(&self.params, &self.ids).resolve(txn, &election, now)?;
            let finalized = ElectionStore::mark_finalized(txn, election_id, runoff.is_some(), now)?;

            if let Some(spawned) = &runoff {
                events.push(ElectionEvent::ElectionCreated {
                    election: spawned.election.id,
                    title: spawned.election.title.clone(),
                    is_runoff: true,
                });
                events.extend(spawned.candidates.iter().map(|c| ElectionEvent::CandidateAdded {
                    election: spawned.election.id,
                    candidate: c.id,
                    name: c.name.clone(),
                }));
            }
            events.push(ElectionEvent::ElectionFinalized {
                election: election_id,
                requires_runoff: finalized.requires_runoff,
            });
            if let Some(spawned) = &runoff {
                events.push(ElectionEvent::RunoffRequired {
                    parent: election_id,
                    child: spawned.election.id,
                });
            }

            Ok(FinalizeOutcome {
                election: finalized,
                runoff,
            })
        })
        .inspect(|outcome| {
            tracing::info!(
                election = %election_id,
                requires_runoff = outcome.requires_runoff(),
                runoff = ?outcome.runoff.as_ref().map(|r| r.election.id),
                "election finalized"
            )
        })
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_election(&self, id: ElectionId) -> Result<Election, ElectionError> {
        ElectionStore::get(&self.store.read_txn()?, id)
    }

    pub fn list_elections(&self) -> Result<Vec<Election>, ElectionError> {
        ElectionStore::list(&self.store.read_txn()?)
    }

    pub fn get_candidate(&self, id: CandidateId) -> Result<Candidate, ElectionError> {
        CandidateStore::get(&self.store.read_txn()?, id)
    }

    pub fn list_candidates(&self, election: ElectionId) -> Result<Vec<Candidate>, ElectionError> {
        CandidateStore::list_for(&self.store.read_txn()?, election)
    }

    pub fn get_election_results(&self, election: ElectionId) -> Result<ElectionResults, ElectionError> {
        let candidates = self.list_candidates(election)?;
        Ok(ElectionResults::from_candidates(election, &candidates))
    }

    pub fn get_winner(&self, election_id: ElectionId) -> Result<WinnerReport, ElectionError> {
        let txn = self.store.read_txn()?;
        let election = ElectionStore::get(&txn, election_id)?;
        if !election.finalized {
            return Err(ElectionError::NotFinalized(election_id));
        }
        let candidates = CandidateStore::list_for(&txn, election_id)?;
        Ok(WinnerReport::from_candidates(&candidates))
    }

    /// Whether a vote cast at `now` would be inside the window. Unknown elections are inactive.
    pub fn is_election_active(&self, id: ElectionId, now: Timestamp) -> Result<bool, ElectionError> {
        let txn = self.store.read_txn()?;
        Ok(txn.get_election(id)?.is_some_and(|e| e.is_active(now)))
    }

    pub fn has_user_voted(&self, voter: &Identity, election: ElectionId) -> Result<bool, ElectionError> {
        VoteLedger::has_voted(&self.store.read_txn()?, voter, election)
    }

    pub fn is_registered(&self, identity: &Identity) -> Result<bool, ElectionError> {
        self.registry.is_registered(&self.store.read_txn()?, identity)
    }

    /// Number of identities that voted in the election.
    pub fn vote_count(&self, election: ElectionId) -> Result<u64, ElectionError> {
        let txn = self.store.read_txn()?;
        ElectionStore::get(&txn, election)?;
        VoteLedger::vote_count(&txn, election)
    }

    pub fn time_remaining(&self, election: ElectionId, now: Timestamp) -> Result<u64, ElectionError> {
        Ok(self.get_election(election)?.end_time.secs_until(now))
    }

    pub fn time_until_start(&self, election: ElectionId, now: Timestamp) -> Result<u64, ElectionError> {
        Ok(self.get_election(election)?.start_time.secs_until(now))
    }

    /// Every election linked to `id`, from the first-generation root down.
    pub fn runoff_chain(&self, id: ElectionId) -> Result<Vec<ElectionId>, ElectionError> {
        let txn = self.store.read_txn()?;
        let mut seen = HashSet::new();

        let mut root = ElectionStore::get(&txn, id)?;
        seen.insert(root.id);
        while let Some(parent) = root.parent_election_id {
            if !seen.insert(parent) {
                return Err(chain_cycle(parent));
            }
            root = ElectionStore::get(&txn, parent)?;
        }

        let mut chain = vec![root.id];
        let mut current = root;
        while let Some(child) = current.runoff_election_id {
            if chain.contains(&child) {
                return Err(chain_cycle(child));
            }
            chain.push(child);
            current = ElectionStore::get(&txn, child)?;
        }
        Ok(chain)
    }

    // ── Plumbing ───────────────────────────────────────────────────────

    fn write<'s, R>(
        &'s self,
        operation: &'static str,
        apply: impl FnOnce(&mut S::Write<'s>, &mut Vec<ElectionEvent>) -> Result<R, ElectionError>,
    ) -> Result<R, ElectionError> {
        let mut txn = self.store.write_txn()?;
        let mut events = Vec::new();
        let output = match apply(&mut txn, &mut events) {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(operation, error = %err, "operation rejected");
                return Err(err);
            }
        };
        if let Err(err) = txn.commit() {
            tracing::warn!(operation, error = %err, "commit failed");
            return Err(err.into());
        }
        self.events.emit_all(&events);
        Ok(output)
    }
}

fn chain_cycle(at: ElectionId) -> ElectionError {
    StoreError::Corruption(format!("runoff links loop back to election {at}")).into()
}
