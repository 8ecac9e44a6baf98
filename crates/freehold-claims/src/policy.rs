//! Access-policy evaluation: the effective answer to "may this actor do
//! this here?".
//!
//! The evaluator is a pure function of the estate snapshot (or its
//! absence), the world's rule set, the actor identity, and the capability.
//! No hidden state, no side effects: every movement tick and every block
//! interaction calls it, so it must stay cheap and deterministic.
//!
//! # Exception table
//!
//! Capabilities are not all gated the same way:
//!
//! - **Member-gated** (`build`, `interact`, `containers`): an enrolled
//!   member of at least [`Role::Member`] always passes; the public passes
//!   only if the estate opened the corresponding flag.
//! - **Protective** (`pvp`, `mobs`): the flag protects a victim, so the
//!   actor argument is the would-be victim. A victim of at least
//!   [`Role::Trusted`] has opted out of the protection and can be targeted.
//! - **Ambient** (`entry`, `fly`, `pets`, `farms`, `tnt-damage`): members
//!   pass; the public follows the flag, falling back to the world default.
//! - **Custom** keys follow the estate flag map verbatim; a missing key is
//!   permissive, mirroring the rule that unrecognized protections must not
//!   unexpectedly block gameplay.

use freehold_types::{AccountId, BlockPos, Capability, Estate, Role, WorldName, WorldRuleSet};

use crate::movement::MovementTracker;
use crate::registry::EstateRegistry;

/// Decide whether `actor` holds `capability` at a point covered by
/// `estate`, or outside all estates when `estate` is `None`.
///
/// For protective capabilities (`pvp`, `mobs`) the `actor` is the
/// would-be victim, per the exception table above.
pub fn is_allowed(
    actor: AccountId,
    estate: Option<&Estate>,
    rules: &WorldRuleSet,
    capability: &Capability,
) -> bool {
    let Some(estate) = estate else {
        return rules.default_for(capability);
    };

    match capability {
        Capability::Build | Capability::Interact | Capability::Containers => {
            estate.has_role(actor, Role::Member)
                || estate.flag(capability.flag_key()).unwrap_or(false)
        }
        Capability::Pvp | Capability::Mobs => {
            // The victim's membership decides: trusted members waive the
            // protection, everyone else is shielded unless the flag is open.
            estate.has_role(actor, Role::Trusted)
                || estate
                    .flag(capability.flag_key())
                    .unwrap_or_else(|| rules.default_for(capability))
        }
        Capability::Entry
        | Capability::Fly
        | Capability::Pets
        | Capability::Farms
        | Capability::TntDamage => {
            estate.has_role(actor, Role::Member)
                || estate
                    .flag(capability.flag_key())
                    .unwrap_or_else(|| rules.default_for(capability))
        }
        Capability::Custom(key) => estate.flag(key).unwrap_or(true),
    }
}

/// Convenience wrapper resolving the estate from the registry first.
///
/// This is the hot-path entry point: one index lookup, then the pure
/// evaluation above against the world's effective rule set.
pub fn is_allowed_at(
    registry: &EstateRegistry,
    actor: AccountId,
    world: &WorldName,
    pos: BlockPos,
    capability: &Capability,
) -> bool {
    let estate = registry.estate_at(world, pos);
    let rules = registry.rules().rules_for(world);
    is_allowed(actor, estate, rules, capability)
}

/// Feed one observed actor position into the movement tracker, resolving
/// which estate (if any) covers it.
///
/// Returns the boundary crossings to notify, in leave-then-enter order.
pub fn track_movement(
    registry: &EstateRegistry,
    tracker: &mut MovementTracker,
    actor: AccountId,
    world: &WorldName,
    pos: BlockPos,
) -> Vec<crate::movement::BoundaryCrossing> {
    let estate = registry.estate_at(world, pos).map(|e| e.id);
    tracker.update(actor, estate)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use freehold_types::{Cuboid, EstateKind};

    use super::*;

    fn make_estate(rules: &WorldRuleSet) -> Estate {
        Estate::new(
            AccountId::new(),
            EstateKind::Private,
            WorldName::from("overworld"),
            Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(10, 255, 10)),
            rules,
            Utc::now(),
        )
    }

    #[test]
    fn outside_estates_uses_world_default() {
        let rules = WorldRuleSet {
            pvp: false,
            containers: true,
            ..WorldRuleSet::default()
        };
        let actor = AccountId::new();
        assert!(!is_allowed(actor, None, &rules, &Capability::Pvp));
        assert!(is_allowed(actor, None, &rules, &Capability::Containers));
    }

    #[test]
    fn unknown_capability_is_permissive_everywhere() {
        let rules = WorldRuleSet::default();
        let estate = make_estate(&rules);
        let stranger = AccountId::new();
        let custom = Capability::Custom("ender-pearls".to_owned());

        assert!(is_allowed(stranger, None, &rules, &custom));
        assert!(is_allowed(stranger, Some(&estate), &rules, &custom));
    }

    #[test]
    fn member_gated_capabilities_require_membership() {
        let rules = WorldRuleSet::default();
        let mut estate = make_estate(&rules);
        let member = AccountId::new();
        let stranger = AccountId::new();
        estate.members.insert(member, Role::Member);

        for cap in [Capability::Build, Capability::Interact, Capability::Containers] {
            assert!(is_allowed(member, Some(&estate), &rules, &cap));
            assert!(is_allowed(estate.owner, Some(&estate), &rules, &cap));
            assert!(!is_allowed(stranger, Some(&estate), &rules, &cap));
        }
    }

    #[test]
    fn open_build_flag_admits_the_public() {
        let rules = WorldRuleSet::default();
        let mut estate = make_estate(&rules);
        estate.set_flag("build", true);
        assert!(is_allowed(AccountId::new(), Some(&estate), &rules, &Capability::Build));
    }

    #[test]
    fn protective_flags_follow_the_victim() {
        let rules = WorldRuleSet::default();
        let mut estate = make_estate(&rules);
        estate.set_flag("pvp", false);

        let trusted = AccountId::new();
        let member = AccountId::new();
        let visitor = AccountId::new();
        estate.members.insert(trusted, Role::Trusted);
        estate.members.insert(member, Role::Member);

        // A trusted victim waived the protection.
        assert!(is_allowed(trusted, Some(&estate), &rules, &Capability::Pvp));
        // Plain members and visitors stay shielded while the flag is closed.
        assert!(!is_allowed(member, Some(&estate), &rules, &Capability::Pvp));
        assert!(!is_allowed(visitor, Some(&estate), &rules, &Capability::Pvp));

        // Opening the flag exposes everyone.
        estate.set_flag("pvp", true);
        assert!(is_allowed(visitor, Some(&estate), &rules, &Capability::Pvp));
    }

    #[test]
    fn entry_flag_gates_visitors_but_not_members() {
        let rules = WorldRuleSet::default();
        let mut estate = make_estate(&rules);
        estate.set_flag("entry", false);

        let member = AccountId::new();
        estate.members.insert(member, Role::Member);

        assert!(is_allowed(member, Some(&estate), &rules, &Capability::Entry));
        assert!(!is_allowed(AccountId::new(), Some(&estate), &rules, &Capability::Entry));
    }

    #[test]
    fn capability_lookup_is_case_insensitive() {
        let rules = WorldRuleSet::default();
        let mut estate = make_estate(&rules);
        estate.set_flag("Ender-Pearls", false);
        let cap = Capability::parse("ENDER-PEARLS");
        assert!(!is_allowed(AccountId::new(), Some(&estate), &rules, &cap));
    }

    #[test]
    fn registry_wrapper_resolves_position() {
        use freehold_types::WorldRules;

        let mut registry = EstateRegistry::new(WorldRules::default());
        let owner = AccountId::new();
        let claimed = registry.claim(
            owner,
            EstateKind::Private,
            Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(10, 255, 10)),
            WorldName::from("overworld"),
            Utc::now(),
        );
        assert!(claimed.is_ok());

        let world = WorldName::from("overworld");
        // Owner builds inside; a stranger cannot.
        assert!(is_allowed_at(&registry, owner, &world, BlockPos::new(5, 64, 5), &Capability::Build));
        assert!(!is_allowed_at(
            &registry,
            AccountId::new(),
            &world,
            BlockPos::new(5, 64, 5),
            &Capability::Build
        ));
        // Outside the claim, wilderness building is open.
        assert!(is_allowed_at(
            &registry,
            AccountId::new(),
            &world,
            BlockPos::new(50, 64, 50),
            &Capability::Build
        ));
    }
}
