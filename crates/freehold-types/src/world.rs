//! World identity and per-world default rules.
//!
//! A [`WorldRuleSet`] is the bundle of boolean defaults that applies
//! wherever no estate is present, and that seeds the flag map of newly
//! created estates. Rule sets are immutable once loaded; a config reload
//! replaces the whole [`WorldRules`] table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::Capability;

/// The name of a world, as the host platform knows it.
///
/// Comparison is case-sensitive; the engine stores names exactly as the
/// host reports them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldName(String);

impl WorldName {
    /// Wrap a world name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw world name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for WorldName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorldName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// Per-world boolean defaults applied outside estates and seeded into new
/// estate flag maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct WorldRuleSet {
    /// Whether players may create estates in this world.
    #[serde(default = "default_true")]
    pub allow_claims: bool,
    /// Player-versus-player combat outside estates.
    #[serde(default)]
    pub pvp: bool,
    /// Hostile mob targeting outside estates.
    #[serde(default = "default_true")]
    pub mobs: bool,
    /// Container access outside estates.
    #[serde(default = "default_true")]
    pub containers: bool,
    /// Pet interaction outside estates.
    #[serde(default = "default_true")]
    pub pets: bool,
    /// Crop trampling and harvesting outside estates.
    #[serde(default = "default_true")]
    pub farms: bool,
    /// Flight.
    #[serde(default)]
    pub fly: bool,
    /// Region entry. Only meaningful inside estates, but kept here so a
    /// world can seed new estates as entry-restricted.
    #[serde(default = "default_true")]
    pub entry: bool,
    /// Largest footprint area, in blocks, a single claim may cover.
    ///
    /// `None` means unlimited. Bounds both new claims and resizes, which
    /// also bounds the chunk buckets one reservation can occupy in the
    /// spatial index.
    #[serde(default)]
    pub max_claim_area: Option<i64>,
}

impl Default for WorldRuleSet {
    fn default() -> Self {
        Self {
            allow_claims: true,
            pvp: false,
            mobs: true,
            containers: true,
            pets: true,
            farms: true,
            fly: false,
            entry: true,
            max_claim_area: None,
        }
    }
}

impl WorldRuleSet {
    /// The world default for a capability, used for points outside all
    /// estates.
    ///
    /// Capabilities this rule set does not configure are permissive:
    /// an unrecognized protection must not unexpectedly block gameplay.
    pub fn default_for(&self, capability: &Capability) -> bool {
        match capability {
            Capability::Pvp => self.pvp,
            Capability::Mobs => self.mobs,
            Capability::Containers => self.containers,
            Capability::Pets => self.pets,
            Capability::Farms => self.farms,
            Capability::Fly => self.fly,
            Capability::Entry => self.entry,
            Capability::Build
            | Capability::Interact
            | Capability::TntDamage
            | Capability::Custom(_) => true,
        }
    }

    /// The initial flag map for a newly created estate in this world.
    ///
    /// Protective behavior follows the world defaults; the member-gated
    /// capabilities (build, interact, containers) and explosion damage
    /// start closed so a fresh claim is private by default.
    pub fn initial_estate_flags(&self) -> BTreeMap<String, bool> {
        let mut flags = BTreeMap::new();
        flags.insert("build".to_owned(), false);
        flags.insert("interact".to_owned(), false);
        flags.insert("containers".to_owned(), false);
        flags.insert("tnt-damage".to_owned(), false);
        flags.insert("pvp".to_owned(), self.pvp);
        flags.insert("mobs".to_owned(), self.mobs);
        flags.insert("pets".to_owned(), self.pets);
        flags.insert("farms".to_owned(), self.farms);
        flags.insert("fly".to_owned(), self.fly);
        flags.insert("entry".to_owned(), self.entry);
        flags
    }
}

/// The loaded rule table: one rule set per configured world plus a global
/// fallback for worlds the config does not mention.
///
/// Replaced wholesale on config reload; never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldRules {
    /// The fallback rule set for unconfigured worlds.
    #[serde(default)]
    pub global: WorldRuleSet,
    /// Per-world overrides, keyed by world name.
    #[serde(default)]
    pub worlds: BTreeMap<WorldName, WorldRuleSet>,
}

impl WorldRules {
    /// The effective rule set for a world.
    pub fn rules_for(&self, world: &WorldName) -> &WorldRuleSet {
        self.worlds.get(world).unwrap_or(&self.global)
    }

    /// Whether claiming is permitted in a world.
    pub fn is_claiming_allowed(&self, world: &WorldName) -> bool {
        self.rules_for(world).allow_claims
    }
}

const fn default_true() -> bool {
    true
}
