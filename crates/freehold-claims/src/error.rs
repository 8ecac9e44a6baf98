//! Error types for the `freehold-claims` crate.
//!
//! All of these are expected, recoverable, caller-visible outcomes returned
//! through typed `Result`s -- a rejected claim or a missing estate is a
//! normal answer, never a fault.

use freehold_types::{AccountId, EstateId, RejectionReason, RequestId, ReservationId, WorldName};

/// Errors raised by the spatial region index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlapError {
    /// The requested region shares at least one block with a committed
    /// reservation in the same world.
    #[error("region overlaps estate {with} in world {world}")]
    Overlaps {
        /// The world of the conflict.
        world: WorldName,
        /// The estate holding the conflicting reservation.
        with: EstateId,
    },

    /// The reservation to operate on does not exist (already released).
    #[error("reservation not found: {0}")]
    ReservationNotFound(ReservationId),
}

/// Why a claim attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// The world's rule set does not permit claiming.
    #[error("claiming is not permitted in world {0}")]
    WorldDisallows(WorldName),

    /// The requested region overlaps a committed estate.
    #[error("region overlaps estate {with}")]
    Overlap {
        /// The estate already holding the space.
        with: EstateId,
    },

    /// The owner could not pay the claim cost.
    ///
    /// Raised by the service layer, which fronts the registry with the
    /// economy collaborator; the registry itself never touches money.
    #[error("insufficient funds for claim")]
    InsufficientFunds,

    /// The requested region has no positive footprint area.
    #[error("region has no footprint area")]
    InvalidRegion,
}

impl ClaimError {
    /// The notification-facing rejection reason for this error.
    pub const fn rejection_reason(&self) -> RejectionReason {
        match self {
            Self::WorldDisallows(_) => RejectionReason::WorldDisallows,
            Self::Overlap { .. } => RejectionReason::Overlap,
            Self::InsufficientFunds => RejectionReason::InsufficientFunds,
            Self::InvalidRegion => RejectionReason::InvalidRegion,
        }
    }
}

/// Errors raised by estate registry operations other than claiming.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No estate with this identity exists.
    #[error("estate not found: {0}")]
    NotFound(EstateId),

    /// An estate with this identity is already committed (load path).
    #[error("duplicate estate id: {0}")]
    Duplicate(EstateId),

    /// The account is not on the estate's membership roster.
    #[error("account {account} is not a member of estate {estate}")]
    MemberNotFound {
        /// The estate operated on.
        estate: EstateId,
        /// The absent account.
        account: AccountId,
    },

    /// The owner's roster entry is immutable.
    #[error("the owner of estate {0} cannot be removed or demoted")]
    OwnerImmutable(EstateId),

    /// A resize target region has no positive footprint area.
    #[error("region has no footprint area")]
    InvalidRegion,

    /// A resize target region overlaps another committed estate.
    #[error("region overlaps estate {with}")]
    Overlap {
        /// The estate already holding the space.
        with: EstateId,
    },
}

/// Errors raised by the pending expansion queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    /// No request with this identity exists.
    #[error("expansion request not found: {0}")]
    RequestNotFound(RequestId),

    /// The request has already been approved or rejected.
    #[error("expansion request {0} has already been decided")]
    AlreadyDecided(RequestId),

    /// Applying the approved resize failed.
    #[error("applying expansion failed: {source}")]
    Apply {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },
}
