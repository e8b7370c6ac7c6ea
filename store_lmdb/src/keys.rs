//! Binary key layouts.
//!
//! Integer components are big-endian so LMDB's lexicographic key order is
//! numeric order, and composite keys lead with the election id so that a
//! prefix scan yields everything belonging to one election.

use runoff_types::{CandidateId, ElectionId, Identity};

pub fn election_key(id: ElectionId) -> [u8; 8] {
    id.to_be_bytes()
}

/// `election_id_be (8) || candidate_id_be (8)`
pub fn candidate_key(election: ElectionId, candidate: CandidateId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&election.to_be_bytes());
    key[8..].copy_from_slice(&candidate.to_be_bytes());
    key
}

pub fn candidate_index_key(candidate: CandidateId) -> [u8; 8] {
    candidate.to_be_bytes()
}

pub fn voter_key(identity: &Identity) -> &[u8] {
    identity.as_bytes()
}

/// `election_id_be (8) || identity bytes`
pub fn vote_key(election: ElectionId, identity: &Identity) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + identity.as_bytes().len());
    key.extend_from_slice(&election.to_be_bytes());
    key.extend_from_slice(identity.as_bytes());
    key
}

/// Decode an 8-byte big-endian id value.
pub fn decode_u64(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}
