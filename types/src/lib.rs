//! Fundamental types for the runoff election ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! caller identities, election and candidate ids, timestamps and clocks, the
//! persisted election/candidate records, and the runoff parameters.

pub mod election;
pub mod id;
pub mod identity;
pub mod params;
pub mod time;

pub use election::{Candidate, Election, ElectionStatus};
pub use id::{CandidateId, ElectionId};
pub use identity::{Identity, IdentityError};
pub use params::RunoffParams;
pub use time::{Clock, SystemClock, Timestamp};
