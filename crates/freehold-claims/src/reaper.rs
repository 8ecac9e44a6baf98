//! Removal of estates owned by banned accounts.
//!
//! Runs in two modes: reactively when the host signals a ban, and
//! proactively at startup against the full registry to catch bans that
//! happened while the engine was offline. Both paths go through
//! [`purge`], which is idempotent -- a second purge of the same account
//! removes nothing and returns 0.

use freehold_types::AccountId;
use tracing::{info, warn};

use crate::registry::EstateRegistry;

/// Collaborator answering whether an account is currently banned.
///
/// The host platform owns the ban list; the engine only reads it during
/// the startup scan.
pub trait BanList: Send + Sync {
    /// Whether the account is banned.
    fn is_banned(&self, account: AccountId) -> bool;
}

/// Unclaim every estate owned by `account`. Returns how many were removed.
///
/// Works from a stable snapshot of the owner's estate IDs, so a failure on
/// one estate is logged and the rest are still processed. The reserved
/// server account is never purged.
pub fn purge(registry: &mut EstateRegistry, account: AccountId) -> usize {
    if account.is_server() {
        return 0;
    }

    let owned = registry.estates_owned_by(account);
    let mut removed: usize = 0;
    for id in owned {
        match registry.unclaim(id) {
            Ok(_) => removed = removed.saturating_add(1),
            Err(e) => {
                warn!(estate = %id, error = %e, "failed to purge estate of banned account");
            }
        }
    }
    if removed > 0 {
        info!(account = %account, removed, "purged estates of banned account");
    }
    removed
}

/// Scan the whole registry against the ban list and purge every owner that
/// is banned. Returns the total number of estates removed.
pub fn purge_banned(registry: &mut EstateRegistry, bans: &dyn BanList) -> usize {
    let mut banned_owners: Vec<AccountId> = registry
        .estates()
        .map(|e| e.owner)
        .filter(|owner| !owner.is_server() && bans.is_banned(*owner))
        .collect();
    banned_owners.sort_unstable();
    banned_owners.dedup();

    let mut removed: usize = 0;
    for owner in banned_owners {
        removed = removed.saturating_add(purge(registry, owner));
    }
    removed
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use freehold_types::{BlockPos, Cuboid, EstateKind, WorldName, WorldRules};

    use super::*;

    struct SetBanList(BTreeSet<AccountId>);

    impl BanList for SetBanList {
        fn is_banned(&self, account: AccountId) -> bool {
            self.0.contains(&account)
        }
    }

    fn claim_at(registry: &mut EstateRegistry, owner: AccountId, x: i32) {
        let result = registry.claim(
            owner,
            EstateKind::Private,
            Cuboid::new(
                BlockPos::new(x, 0, 0),
                BlockPos::new(x.saturating_add(10), 255, 10),
            ),
            WorldName::from("overworld"),
            Utc::now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn purge_removes_all_estates_of_the_account() {
        let mut registry = EstateRegistry::new(WorldRules::default());
        let banned = AccountId::new();
        let innocent = AccountId::new();

        claim_at(&mut registry, banned, 0);
        claim_at(&mut registry, banned, 100);
        claim_at(&mut registry, innocent, 200);

        assert_eq!(purge(&mut registry, banned), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.estates_owned_by(innocent).len(), 1);
    }

    #[test]
    fn purge_is_idempotent() {
        let mut registry = EstateRegistry::new(WorldRules::default());
        let banned = AccountId::new();
        claim_at(&mut registry, banned, 0);

        assert_eq!(purge(&mut registry, banned), 1);
        assert_eq!(purge(&mut registry, banned), 0);
    }

    #[test]
    fn purge_of_account_with_no_estates_returns_zero() {
        let mut registry = EstateRegistry::new(WorldRules::default());
        assert_eq!(purge(&mut registry, AccountId::new()), 0);
    }

    #[test]
    fn server_account_is_never_purged() {
        let mut registry = EstateRegistry::new(WorldRules::default());
        claim_at(&mut registry, AccountId::SERVER, 0);
        assert_eq!(purge(&mut registry, AccountId::SERVER), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn startup_scan_purges_every_banned_owner() {
        let mut registry = EstateRegistry::new(WorldRules::default());
        let banned_a = AccountId::new();
        let banned_b = AccountId::new();
        let innocent = AccountId::new();

        claim_at(&mut registry, banned_a, 0);
        claim_at(&mut registry, banned_b, 100);
        claim_at(&mut registry, banned_b, 200);
        claim_at(&mut registry, innocent, 300);

        let bans = SetBanList([banned_a, banned_b].into_iter().collect());
        assert_eq!(purge_banned(&mut registry, &bans), 3);
        assert_eq!(registry.len(), 1);
    }
}
