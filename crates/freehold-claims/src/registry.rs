//! The estate registry: exclusive owner and sole mutator of all [`Estate`]
//! values.
//!
//! The registry holds the [`SpatialIndex`] internally and keeps it in
//! lockstep on every create, resize, and delete, so callers can never
//! observe an estate and its reservation in an inconsistent pairing. All
//! mutating entry points must be serialized through one writer (the engine
//! wraps the registry in a single lock guarding both structures together).
//!
//! Mutators do not check permissions: deciding whether an actor may toggle
//! a flag or edit the roster is the command layer's job, via the policy
//! evaluator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use freehold_types::{
    AccountId, BlockPos, Cuboid, Estate, EstateId, EstateKind, ReservationId, Role, WorldName,
    WorldRules,
};
use tracing::{debug, warn};

use crate::error::{ClaimError, OverlapError, RegistryError};
use crate::spatial::SpatialIndex;

/// The authoritative in-memory set of committed estates.
#[derive(Debug, Default)]
pub struct EstateRegistry {
    estates: BTreeMap<EstateId, Estate>,
    reservations: BTreeMap<EstateId, ReservationId>,
    index: SpatialIndex,
    rules: WorldRules,
    /// Monotonic change counter, bumped on every mutation.
    generation: u64,
    /// The generation the last completed save captured.
    saved_generation: u64,
}

impl EstateRegistry {
    /// Create an empty registry with the given world rule table.
    pub fn new(rules: WorldRules) -> Self {
        Self {
            estates: BTreeMap::new(),
            reservations: BTreeMap::new(),
            index: SpatialIndex::new(),
            rules,
            generation: 0,
            saved_generation: 0,
        }
    }

    /// The current world rule table.
    pub const fn rules(&self) -> &WorldRules {
        &self.rules
    }

    /// Replace the world rule table wholesale (config reload).
    ///
    /// Already-committed estates keep their flags; only future claims and
    /// outside-estate defaults see the new rules.
    pub fn set_rules(&mut self, rules: WorldRules) {
        self.rules = rules;
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Commit a new claim.
    ///
    /// Preconditions are checked in order: the world permits claiming, the
    /// region has positive footprint area within the world's claim cap, and
    /// the region conflicts with no committed estate. On success the new
    /// estate's flags are seeded from the world's rule set, the owner is
    /// enrolled with [`Role::Owner`], and the upkeep clock starts at `now`.
    ///
    /// Payment is the caller's concern; the registry never touches money.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WorldDisallows`], [`ClaimError::InvalidRegion`],
    /// or [`ClaimError::Overlap`]. The registry and index are unchanged on
    /// failure.
    pub fn claim(
        &mut self,
        owner: AccountId,
        kind: EstateKind,
        region: Cuboid,
        world: WorldName,
        now: DateTime<Utc>,
    ) -> Result<Estate, ClaimError> {
        if !self.rules.is_claiming_allowed(&world) {
            return Err(ClaimError::WorldDisallows(world));
        }
        if region.area() < 1 {
            return Err(ClaimError::InvalidRegion);
        }

        let rule_set = self.rules.rules_for(&world).clone();
        if rule_set
            .max_claim_area
            .is_some_and(|max| region.area() > max)
        {
            return Err(ClaimError::InvalidRegion);
        }
        let estate = Estate::new(owner, kind, world, region, &rule_set, now);

        let reservation = self
            .index
            .try_reserve(&estate.world, region, estate.id)
            .map_err(|e| match e {
                OverlapError::Overlaps { with, .. } => ClaimError::Overlap { with },
                // try_reserve never reports a missing reservation.
                OverlapError::ReservationNotFound(_) => ClaimError::InvalidRegion,
            })?;

        debug!(estate = %estate.id, owner = %owner, world = %estate.world, "estate claimed");
        let snapshot = estate.clone();
        self.reservations.insert(estate.id, reservation);
        self.estates.insert(estate.id, estate);
        self.touch();
        Ok(snapshot)
    }

    /// Remove an estate, releasing its spatial reservation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist --
    /// including on a second call for the same ID, which is the defined
    /// idempotent failure mode.
    pub fn unclaim(&mut self, id: EstateId) -> Result<Estate, RegistryError> {
        let estate = self
            .estates
            .remove(&id)
            .ok_or(RegistryError::NotFound(id))?;
        if let Some(reservation) = self.reservations.remove(&id) {
            self.index.release(reservation);
        }
        debug!(estate = %id, owner = %estate.owner, "estate unclaimed");
        self.touch();
        Ok(estate)
    }

    /// Replace an estate's region.
    ///
    /// The new region is checked against every other committed estate; on
    /// failure both the registry and the index are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::InvalidRegion`],
    /// or [`RegistryError::Overlap`].
    pub fn resize(&mut self, id: EstateId, new_region: Cuboid) -> Result<(), RegistryError> {
        if new_region.area() < 1 {
            return Err(RegistryError::InvalidRegion);
        }
        let world = self
            .estates
            .get(&id)
            .map(|e| e.world.clone())
            .ok_or(RegistryError::NotFound(id))?;
        if self
            .rules
            .rules_for(&world)
            .max_claim_area
            .is_some_and(|max| new_region.area() > max)
        {
            return Err(RegistryError::InvalidRegion);
        }
        let reservation = *self
            .reservations
            .get(&id)
            .ok_or(RegistryError::NotFound(id))?;
        self.index
            .resize(reservation, new_region)
            .map_err(|e| match e {
                OverlapError::Overlaps { with, .. } => RegistryError::Overlap { with },
                OverlapError::ReservationNotFound(_) => RegistryError::NotFound(id),
            })?;
        let estate = self.estate_entry(id)?;
        estate.region = new_region;
        estate.dirty = true;
        self.touch();
        Ok(())
    }

    /// Re-commit a persisted estate at load time.
    ///
    /// Unlike [`claim`], this keeps the estate's identity, flags, roster,
    /// and upkeep clock, and does not consult world rules (already-committed
    /// estates are never retroactively validated). The owner-membership
    /// invariant is re-asserted for data from older versions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] for a repeated ID and
    /// [`RegistryError::Overlap`] if the persisted region conflicts with an
    /// already-restored estate -- a data-integrity condition the load path
    /// reports and skips without aborting the remaining estates.
    ///
    /// [`claim`]: EstateRegistry::claim
    pub fn restore(&mut self, mut estate: Estate) -> Result<(), RegistryError> {
        if self.estates.contains_key(&estate.id) {
            return Err(RegistryError::Duplicate(estate.id));
        }
        let reservation = self
            .index
            .try_reserve(&estate.world, estate.region, estate.id)
            .map_err(|e| match e {
                OverlapError::Overlaps { with, .. } => RegistryError::Overlap { with },
                OverlapError::ReservationNotFound(_) => RegistryError::NotFound(estate.id),
            })?;
        estate.ensure_owner_membership();
        estate.dirty = false;
        self.reservations.insert(estate.id, reservation);
        self.estates.insert(estate.id, estate);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Estate mutation
    // -------------------------------------------------------------------

    /// Set a capability flag on an estate.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist.
    pub fn set_flag(&mut self, id: EstateId, key: &str, value: bool) -> Result<(), RegistryError> {
        let estate = self.estate_entry(id)?;
        estate.set_flag(key, value);
        self.touch();
        Ok(())
    }

    /// Add an account to an estate's roster, or change its role.
    ///
    /// The owner's entry is immutable: attempting to demote the owner is
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] or [`RegistryError::OwnerImmutable`].
    pub fn set_member(
        &mut self,
        id: EstateId,
        account: AccountId,
        role: Role,
    ) -> Result<(), RegistryError> {
        let estate = self.estate_entry(id)?;
        if account == estate.owner && role != Role::Owner {
            return Err(RegistryError::OwnerImmutable(id));
        }
        estate.members.insert(account, role);
        estate.dirty = true;
        self.touch();
        Ok(())
    }

    /// Remove an account from an estate's roster.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::OwnerImmutable`]
    /// for the owner, or [`RegistryError::MemberNotFound`] for an account
    /// that was never enrolled.
    pub fn remove_member(&mut self, id: EstateId, account: AccountId) -> Result<(), RegistryError> {
        let estate = self.estate_entry(id)?;
        if account == estate.owner {
            return Err(RegistryError::OwnerImmutable(id));
        }
        if estate.members.remove(&account).is_none() {
            return Err(RegistryError::MemberNotFound {
                estate: id,
                account,
            });
        }
        estate.dirty = true;
        self.touch();
        Ok(())
    }

    /// Raise an estate's upgrade tier by one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist.
    pub fn upgrade(&mut self, id: EstateId) -> Result<u32, RegistryError> {
        let estate = self.estate_entry(id)?;
        estate.level = estate.level.checked_add(1).unwrap_or(u32::MAX);
        estate.dirty = true;
        let level = estate.level;
        self.touch();
        Ok(level)
    }

    /// Lower an estate's upgrade tier by one, never below tier 1.
    ///
    /// The explicit downgrade action is the only way a level decreases.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist.
    pub fn downgrade(&mut self, id: EstateId) -> Result<u32, RegistryError> {
        let estate = self.estate_entry(id)?;
        estate.level = estate.level.saturating_sub(1).max(1);
        estate.dirty = true;
        let level = estate.level;
        self.touch();
        Ok(level)
    }

    /// Record a successful upkeep charge.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist.
    pub fn record_upkeep_payment(
        &mut self,
        id: EstateId,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let estate = self.estate_entry(id)?;
        estate.last_upkeep_payment = now;
        estate.dirty = true;
        self.touch();
        Ok(())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// The estate whose region contains the given block, if any.
    pub fn estate_at(&self, world: &WorldName, pos: BlockPos) -> Option<&Estate> {
        let reservation = self.index.find_at(world, pos)?;
        let id = self.index.estate_of(reservation)?;
        self.estates.get(&id)
    }

    /// Look up an estate by ID.
    pub fn estate(&self, id: EstateId) -> Option<&Estate> {
        self.estates.get(&id)
    }

    /// A stable snapshot of all estate IDs.
    ///
    /// Background sweeps iterate this snapshot and re-resolve each ID, so
    /// estates claimed or unclaimed mid-sweep are neither skipped twice nor
    /// double-processed.
    pub fn estate_ids(&self) -> Vec<EstateId> {
        self.estates.keys().copied().collect()
    }

    /// Iterate all committed estates.
    pub fn estates(&self) -> impl Iterator<Item = &Estate> {
        self.estates.values()
    }

    /// IDs of every estate owned by the given account.
    pub fn estates_owned_by(&self, owner: AccountId) -> Vec<EstateId> {
        self.estates
            .values()
            .filter(|e| e.owner == owner)
            .map(|e| e.id)
            .collect()
    }

    /// Number of committed estates.
    pub fn len(&self) -> usize {
        self.estates.len()
    }

    /// Whether the registry holds no estates.
    pub fn is_empty(&self) -> bool {
        self.estates.is_empty()
    }

    // -------------------------------------------------------------------
    // Dirty tracking
    // -------------------------------------------------------------------

    /// Whether any estate state changed since the last completed save.
    pub const fn is_dirty(&self) -> bool {
        self.generation != self.saved_generation
    }

    /// The current change counter.
    ///
    /// Captured alongside a snapshot so the save can later be committed
    /// with [`mark_saved`] without clobbering mutations made while the
    /// snapshot was being written.
    ///
    /// [`mark_saved`]: EstateRegistry::mark_saved
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Record that a snapshot captured at `generation` was saved.
    ///
    /// Mutations made after the snapshot keep the registry dirty for the
    /// next cycle; per-estate markers clear only when nothing changed
    /// since the snapshot.
    pub fn mark_saved(&mut self, generation: u64) {
        self.saved_generation = generation;
        if self.generation == generation {
            for estate in self.estates.values_mut() {
                estate.dirty = false;
            }
        }
    }

    /// Mark all state clean, for the load path.
    pub fn clear_dirty(&mut self) {
        let generation = self.generation;
        self.mark_saved(generation);
    }

    const fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn estate_entry(&mut self, id: EstateId) -> Result<&mut Estate, RegistryError> {
        self.estates.get_mut(&id).ok_or(RegistryError::NotFound(id))
    }
}

/// Restore a batch of persisted estates, isolating per-estate failures.
///
/// Overlapping or duplicate records are reported with a warning and
/// skipped; the remaining estates still load. Returns how many estates
/// were committed.
pub fn restore_all(registry: &mut EstateRegistry, estates: Vec<Estate>) -> usize {
    let mut committed: usize = 0;
    for estate in estates {
        let id = estate.id;
        match registry.restore(estate) {
            Ok(()) => committed = committed.saturating_add(1),
            Err(e) => {
                warn!(estate = %id, error = %e, "skipping estate with integrity conflict");
            }
        }
    }
    committed
}
