//! Abstract storage traits for the runoff election ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The election core depends only on the traits.
//!
//! All access goes through transactions. A [`ReadTxn`] sees one committed
//! snapshot for its whole lifetime. A [`WriteTxn`] is exclusive: at most one
//! is open per store at a time, and its changes become visible all at once on
//! [`WriteTxn::commit`] or not at all if it is dropped.

pub mod error;
pub mod transaction;

pub use error::StoreError;
pub use transaction::{ReadTxn, Store, WriteTxn};
