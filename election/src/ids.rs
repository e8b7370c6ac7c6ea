//! Monotonic id sequences.
//!
//! Both counters live in the store's meta records and advance inside the
//! caller's write transaction, so ids are consumed only when the operation
//! that took them commits.

use runoff_store::{StoreError, WriteTxn};
use runoff_types::{CandidateId, ElectionId};

pub(crate) const NEXT_ELECTION_ID_KEY: &str = "next_election_id";
pub(crate) const NEXT_CANDIDATE_ID_KEY: &str = "next_candidate_id";

/// Hands out election and candidate ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdAllocator {
    first: u64,
}

impl IdAllocator {
    /// Sequences start at 1 so that 0 never names a record.
    pub const DEFAULT_FIRST_ID: u64 = 1;

    pub fn new(first: u64) -> Self {
        Self { first }
    }

    pub fn next_election_id<T: WriteTxn>(&self, txn: &mut T) -> Result<ElectionId, StoreError> {
        self.advance(txn, NEXT_ELECTION_ID_KEY).map(ElectionId::new)
    }

    pub fn next_candidate_id<T: WriteTxn>(&self, txn: &mut T) -> Result<CandidateId, StoreError> {
        self.advance(txn, NEXT_CANDIDATE_ID_KEY).map(CandidateId::new)
    }

    fn advance<T: WriteTxn>(&self, txn: &mut T, key: &str) -> Result<u64, StoreError> {
        let next = match txn.get_meta(key)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("{key} holds {} bytes, expected 8", bytes.len()))
                })?;
                u64::from_be_bytes(raw)
            }
            None => self.first,
        };
        let after = next
            .checked_add(1)
            .ok_or_else(|| StoreError::Corruption(format!("{key} sequence exhausted")))?;
        txn.put_meta(key, &after.to_be_bytes())?;
        Ok(next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FIRST_ID)
    }
}
