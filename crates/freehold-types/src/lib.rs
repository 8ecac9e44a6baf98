//! Shared type definitions for the Freehold claim engine.
//!
//! This crate is the single source of truth for all types used across the
//! Freehold workspace: identifiers, geometry, the estate data model, world
//! rule sets, and the domain notification contract.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`cuboid`] -- [`BlockPos`] and the normalized axis-aligned [`Cuboid`]
//! - [`enums`] -- Estate kinds, roles, capabilities, approval states
//! - [`estate`] -- The [`Estate`] entity and pending expansion requests
//! - [`world`] -- [`WorldName`], [`WorldRuleSet`], and the loaded rule table
//! - [`events`] -- [`ClaimEvent`] variants and the [`NotificationSink`] trait

pub mod cuboid;
pub mod enums;
pub mod estate;
pub mod events;
pub mod ids;
pub mod world;

// Re-export all public types at crate root for convenience.
pub use cuboid::{BlockPos, Cuboid};
pub use enums::{ApprovalState, Capability, EstateKind, RejectionReason, Role};
pub use estate::{Estate, PendingExpansionRequest};
pub use events::{ClaimEvent, NotificationSink, NullSink};
pub use ids::{AccountId, EstateId, RequestId, ReservationId};
pub use world::{WorldName, WorldRuleSet, WorldRules};
