//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the election core (clock, storage, event
//! subscribers) are abstracted behind traits or callbacks. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod events;
pub mod store;

pub use clock::NullClock;
pub use events::NullEventSink;
pub use store::NullStore;
