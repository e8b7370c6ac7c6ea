//! JSON-over-HTTP server for the election ledger.
//!
//! Provides endpoints for:
//! - Creating elections and adding candidates (administrator)
//! - Voter registration and vote casting
//! - Finalization, results, winners and runoff chains
//!
//! Callers identify themselves with the `x-identity` header. Authentication
//! of that header is the job of whatever sits in front of this server.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer, RpcState};
