//! Snapshot persistence for the Freehold claim engine.
//!
//! Claim state is authoritative in memory; this crate makes it durable.
//! The [`PersistenceCoordinator`] drives dirty-gated saves and the
//! load-time restore path over a pluggable [`EstateStorage`] backend, and
//! [`JsonStore`] is the stock backend: versioned JSON snapshot files
//! replaced atomically via write-then-rename.

pub mod coordinator;
pub mod error;
pub mod json_store;
pub mod storage;

pub use coordinator::{LoadSummary, PersistenceCoordinator};
pub use error::StorageError;
pub use json_store::JsonStore;
pub use storage::{EstateStorage, MemoryStorage};
