//! Ban list wiring: the config-backed list and the runtime ban signal.
//!
//! The host platform owns bans. At startup the engine scans the registry
//! against a [`BanList`]; at runtime it listens on an mpsc channel for
//! ban signals and purges reactively.

use std::collections::BTreeSet;

use freehold_claims::BanList;
use freehold_types::AccountId;
use uuid::Uuid;

/// A fixed ban list loaded from configuration.
#[derive(Debug, Default)]
pub struct StaticBanList {
    banned: BTreeSet<AccountId>,
}

impl StaticBanList {
    /// Build the list from raw account UUIDs.
    pub fn from_uuids(ids: &[Uuid]) -> Self {
        Self {
            banned: ids.iter().copied().map(AccountId::from).collect(),
        }
    }

    /// Number of banned accounts.
    pub fn len(&self) -> usize {
        self.banned.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.banned.is_empty()
    }
}

impl BanList for StaticBanList {
    fn is_banned(&self, account: AccountId) -> bool {
        self.banned.contains(&account)
    }
}
