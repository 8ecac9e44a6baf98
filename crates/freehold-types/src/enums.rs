//! Enumeration types for the claim engine.
//!
//! [`Capability`] is the closed internal form of the open string flag keys:
//! commands and config files speak strings, the access-policy evaluator
//! speaks this enum, and unrecognized keys survive as [`Capability::Custom`]
//! so future or third-party flags keep working.

use serde::{Deserialize, Serialize};

/// The category of an estate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstateKind {
    /// Owned by a single player account.
    Private,
    /// Owned by a guild; the owner account administers it.
    Guild,
    /// Owned by the reserved server account; exempt from upkeep.
    Server,
}

/// An estate-scoped permission tier.
///
/// Variants are declared in ascending order of privilege so the derived
/// ordering can be used directly in threshold checks
/// (`role >= Role::Trusted`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May build, interact, and open containers inside the estate.
    Member,
    /// A member who additionally opts out of protective flags (PvP, mobs).
    Trusted,
    /// The estate owner; exactly one per estate, never removable.
    Owner,
}

/// Approval state of a pending expansion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Awaiting an administrative decision.
    Pending,
    /// Approved and applied to the estate.
    Approved,
    /// Rejected; the estate keeps its current region.
    Rejected,
}

/// Why a claim attempt was rejected.
///
/// Mirrors the claim error taxonomy for the notification sink, so the
/// command layer can tell the player the specific reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The world's rule set does not permit claiming.
    WorldDisallows,
    /// The requested region overlaps a committed estate.
    Overlap,
    /// The owner could not pay the claim cost.
    InsufficientFunds,
    /// The requested region has no positive footprint area.
    InvalidRegion,
}

/// A protective or behavioral capability controlled by estate flags and
/// world defaults.
///
/// Known capabilities get typed handling in the policy evaluator; anything
/// else round-trips through [`Capability::Custom`] with its raw key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Placing and breaking blocks.
    Build,
    /// Using doors, buttons, beds, and other interactables.
    Interact,
    /// Opening chests, barrels, and other inventories.
    Containers,
    /// Player-versus-player combat (protective: evaluated for the victim).
    Pvp,
    /// Hostile mob targeting (protective: evaluated for the victim).
    Mobs,
    /// Explosion damage to terrain.
    TntDamage,
    /// Flight inside the region.
    Fly,
    /// Crossing into the region at all.
    Entry,
    /// Interacting with tamed animals.
    Pets,
    /// Trampling or harvesting crops.
    Farms,
    /// An unrecognized flag key, matched verbatim (lowercased) against the
    /// estate flag map and treated permissively everywhere else.
    Custom(String),
}

impl Capability {
    /// Parse a flag key into a capability, case-insensitively.
    pub fn parse(key: &str) -> Self {
        match key.to_ascii_lowercase().as_str() {
            "build" => Self::Build,
            "interact" => Self::Interact,
            "containers" => Self::Containers,
            "pvp" => Self::Pvp,
            "mobs" => Self::Mobs,
            "tnt-damage" => Self::TntDamage,
            "fly" => Self::Fly,
            "entry" => Self::Entry,
            "pets" => Self::Pets,
            "farms" => Self::Farms,
            other => Self::Custom(other.to_owned()),
        }
    }

    /// The canonical flag key for this capability.
    pub fn flag_key(&self) -> &str {
        match self {
            Self::Build => "build",
            Self::Interact => "interact",
            Self::Containers => "containers",
            Self::Pvp => "pvp",
            Self::Mobs => "mobs",
            Self::TntDamage => "tnt-damage",
            Self::Fly => "fly",
            Self::Entry => "entry",
            Self::Pets => "pets",
            Self::Farms => "farms",
            Self::Custom(key) => key,
        }
    }

    /// Whether this capability protects a victim rather than gating an
    /// actor: the policy exception applies to the victim's membership.
    pub const fn is_protective(&self) -> bool {
        matches!(self, Self::Pvp | Self::Mobs)
    }
}
