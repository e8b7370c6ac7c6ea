//! Election ledger core.
//!
//! Elections, their candidates, voter registrations and vote facts live in a
//! transactional [`runoff_store::Store`]. [`ElectionService`] is the entry
//! point; the component stores below it each own one record family and are
//! always driven through a transaction handed down by the service.
//!
//! Finalizing a first-generation election whose top tally is shared spawns a
//! runoff election carrying the tied candidates forward.

pub mod candidates;
pub mod elections;
pub mod error;
pub mod event;
pub mod identity;
pub mod ids;
pub mod ledger;
pub mod results;
pub mod runoff;
pub mod service;

pub use candidates::CandidateStore;
pub use elections::ElectionStore;
pub use error::{ElectionError, ErrorCategory};
pub use event::{ElectionEvent, EventBus};
pub use identity::IdentityRegistry;
pub use ids::IdAllocator;
pub use ledger::VoteLedger;
pub use results::{ElectionResults, WinnerReport};
pub use runoff::{RunoffResolver, SpawnedRunoff, TieSet};
pub use service::{ElectionService, FinalizeOutcome};
