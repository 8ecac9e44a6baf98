//! Claim engine core for the Freehold workspace.
//!
//! This crate owns the authoritative in-memory claim state: the committed
//! spatial reservations, the estates themselves, and the pure policy logic
//! evaluated on every movement tick and block interaction.
//!
//! # Modules
//!
//! - [`spatial`] -- [`SpatialIndex`]: chunk-bucketed per-world reservations
//!   with inclusive overlap semantics.
//! - [`registry`] -- [`EstateRegistry`]: exclusive owner and sole mutator
//!   of all estates, keeping the index in lockstep.
//! - [`policy`] -- the access-policy evaluator and its exception table.
//! - [`movement`] -- [`MovementTracker`]: enter/leave boundary crossings.
//! - [`expansion`] -- [`ExpansionQueue`]: pending resize requests.
//! - [`reaper`] -- banned-account cleanup.
//! - [`error`] -- typed, recoverable error taxonomy.

pub mod error;
pub mod expansion;
pub mod movement;
pub mod policy;
pub mod reaper;
pub mod registry;
pub mod spatial;

// Re-export primary types at crate root.
pub use error::{ClaimError, ExpansionError, OverlapError, RegistryError};
pub use expansion::ExpansionQueue;
pub use movement::{BoundaryCrossing, MovementTracker};
pub use policy::{is_allowed, is_allowed_at, track_movement};
pub use reaper::{BanList, purge, purge_banned};
pub use registry::{EstateRegistry, restore_all};
pub use spatial::SpatialIndex;
