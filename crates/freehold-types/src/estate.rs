//! The [`Estate`] entity and the pending expansion request record.
//!
//! An estate is a committed land claim: a region, an owner, a flag map, and
//! a membership roster. The registry in `freehold-claims` is the sole
//! mutator; these types carry the data and the small invariant-preserving
//! helpers (owner membership, lowercased flag keys).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cuboid::Cuboid;
use crate::enums::{ApprovalState, EstateKind, Role};
use crate::ids::{AccountId, EstateId, RequestId};
use crate::world::{WorldName, WorldRuleSet};

/// A committed land claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estate {
    /// Unique, stable identity for the estate's lifetime.
    pub id: EstateId,
    /// The owning account, or [`AccountId::SERVER`] for server land.
    pub owner: AccountId,
    /// Estate category.
    pub kind: EstateKind,
    /// The world the region lives in.
    pub world: WorldName,
    /// The claimed region. Never overlaps another committed estate in the
    /// same world (enforced by the registry at creation and resize time).
    pub region: Cuboid,
    /// Boolean capability flags, keyed by lowercase flag key.
    pub flags: BTreeMap<String, bool>,
    /// Membership roster. The owner is always present with [`Role::Owner`].
    pub members: BTreeMap<AccountId, Role>,
    /// Upgrade tier.
    pub level: u32,
    /// When upkeep was last successfully charged.
    pub last_upkeep_payment: DateTime<Utc>,
    /// When the estate was claimed.
    pub created_at: DateTime<Utc>,
    /// Process-local modified marker; never persisted.
    #[serde(skip)]
    pub dirty: bool,
}

impl Estate {
    /// Create a new estate with flags seeded from the world's rule set and
    /// the owner registered with [`Role::Owner`].
    pub fn new(
        owner: AccountId,
        kind: EstateKind,
        world: WorldName,
        region: Cuboid,
        rules: &WorldRuleSet,
        now: DateTime<Utc>,
    ) -> Self {
        let mut members = BTreeMap::new();
        members.insert(owner, Role::Owner);
        Self {
            id: EstateId::new(),
            owner,
            kind,
            world,
            region,
            flags: rules.initial_estate_flags(),
            members,
            level: 1,
            last_upkeep_payment: now,
            created_at: now,
            dirty: true,
        }
    }

    /// The role an account holds in this estate, if any.
    ///
    /// The owner always resolves to [`Role::Owner`], regardless of the
    /// roster's content.
    pub fn role_of(&self, account: AccountId) -> Option<Role> {
        if account == self.owner {
            return Some(Role::Owner);
        }
        self.members.get(&account).copied()
    }

    /// Whether an account holds at least the given role.
    pub fn has_role(&self, account: AccountId, at_least: Role) -> bool {
        self.role_of(account).is_some_and(|role| role >= at_least)
    }

    /// Look up a flag by key, case-insensitively.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.flags.get(&key.to_ascii_lowercase()).copied()
    }

    /// Set a flag, storing the key lowercased.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_ascii_lowercase(), value);
        self.dirty = true;
    }

    /// Re-assert the owner-membership invariant after deserialization.
    ///
    /// Persisted data from older versions may lack the owner's roster
    /// entry; the load path calls this before committing the estate.
    pub fn ensure_owner_membership(&mut self) {
        self.members.insert(self.owner, Role::Owner);
    }
}

/// A player's request to expand an estate into a new, larger region.
///
/// Follows the same dirty/save contract as estates: the queue that owns
/// these records tracks its own dirty flag for the persistence coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingExpansionRequest {
    /// Unique request identity.
    pub id: RequestId,
    /// The estate to be resized.
    pub estate: EstateId,
    /// The requested replacement region.
    pub new_region: Cuboid,
    /// Who asked for the expansion.
    pub requester: AccountId,
    /// Current approval state.
    pub state: ApprovalState,
    /// When the request was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl PendingExpansionRequest {
    /// Create a new pending request.
    pub fn new(
        estate: EstateId,
        new_region: Cuboid,
        requester: AccountId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            estate,
            new_region,
            requester,
            state: ApprovalState::Pending,
            submitted_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cuboid::BlockPos;

    use super::*;

    fn make_estate() -> Estate {
        Estate::new(
            AccountId::new(),
            EstateKind::Private,
            WorldName::from("overworld"),
            Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(10, 255, 10)),
            &WorldRuleSet::default(),
            Utc::now(),
        )
    }

    #[test]
    fn owner_is_always_a_member() {
        let estate = make_estate();
        assert_eq!(estate.role_of(estate.owner), Some(Role::Owner));
        assert!(estate.has_role(estate.owner, Role::Trusted));
    }

    #[test]
    fn non_member_has_no_role() {
        let estate = make_estate();
        assert_eq!(estate.role_of(AccountId::new()), None);
        assert!(!estate.has_role(AccountId::new(), Role::Member));
    }

    #[test]
    fn flags_are_case_insensitive() {
        let mut estate = make_estate();
        estate.set_flag("TNT-Damage", true);
        assert_eq!(estate.flag("tnt-damage"), Some(true));
        assert_eq!(estate.flag("Tnt-Damage"), Some(true));
        assert_eq!(estate.flag("unset-key"), None);
    }

    #[test]
    fn new_estate_starts_dirty() {
        let estate = make_estate();
        assert!(estate.dirty);
    }

    #[test]
    fn dirty_flag_is_not_persisted() {
        let estate = make_estate();
        let json = serde_json::to_string(&estate).ok();
        assert!(json.is_some());
        let restored: Result<Estate, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
        if let Ok(e) = restored {
            assert!(!e.dirty);
            assert_eq!(e.id, estate.id);
        }
    }

    #[test]
    fn ensure_owner_membership_restores_roster() {
        let mut estate = make_estate();
        estate.members.clear();
        estate.ensure_owner_membership();
        assert_eq!(estate.role_of(estate.owner), Some(Role::Owner));
    }
}
