//! The spatial region index: committed reservations per world with
//! chunk-grid bucketing.
//!
//! The index answers two hot-path questions -- "which estate owns this
//! block?" and "does this region conflict with anything?" -- in time
//! proportional to local claim density rather than total claim count.
//! Every reservation is registered in each 16 x 16 chunk bucket its region
//! touches; a query only ever inspects the buckets under the queried
//! region.
//!
//! The index holds geometry plus an estate back-reference only. Estate
//! lifecycle belongs to the registry, which keeps the index in lockstep on
//! every create, resize, and delete.

use std::collections::{BTreeMap, BTreeSet};

use freehold_types::{BlockPos, Cuboid, EstateId, ReservationId, WorldName};

use crate::error::OverlapError;

/// A chunk coordinate: block coordinates floor-divided by 16.
type ChunkPos = (i32, i32);

/// One committed reservation: the region and the estate that holds it.
#[derive(Debug, Clone)]
struct Reservation {
    region: Cuboid,
    estate: EstateId,
}

/// Reservations for a single world, bucketed by chunk.
#[derive(Debug, Clone, Default)]
struct WorldIndex {
    reservations: BTreeMap<ReservationId, Reservation>,
    buckets: BTreeMap<ChunkPos, Vec<ReservationId>>,
}

impl WorldIndex {
    /// Reservation IDs whose buckets intersect the given region's chunks.
    fn candidates(&self, region: &Cuboid) -> BTreeSet<ReservationId> {
        let mut found = BTreeSet::new();
        for chunk in chunks_of(region) {
            if let Some(ids) = self.buckets.get(&chunk) {
                found.extend(ids.iter().copied());
            }
        }
        found
    }

    /// First reservation overlapping `region`, excluding `skip` if given.
    fn find_conflict(
        &self,
        region: &Cuboid,
        skip: Option<ReservationId>,
    ) -> Option<&Reservation> {
        self.candidates(region)
            .into_iter()
            .filter(|id| Some(*id) != skip)
            .filter_map(|id| self.reservations.get(&id))
            .find(|r| r.region.intersects(region))
    }

    fn insert_buckets(&mut self, id: ReservationId, region: &Cuboid) {
        for chunk in chunks_of(region) {
            self.buckets.entry(chunk).or_default().push(id);
        }
    }

    fn remove_buckets(&mut self, id: ReservationId, region: &Cuboid) {
        for chunk in chunks_of(region) {
            if let Some(ids) = self.buckets.get_mut(&chunk) {
                ids.retain(|existing| *existing != id);
                if ids.is_empty() {
                    self.buckets.remove(&chunk);
                }
            }
        }
    }
}

/// The committed-region index across all worlds.
///
/// Guarantees the no-overlap invariant: at any time, no two reservations
/// in the same world intersect. A failed operation leaves the index
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    worlds: BTreeMap<WorldName, WorldIndex>,
    /// Which world each live reservation belongs to.
    homes: BTreeMap<ReservationId, WorldName>,
}

impl SpatialIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            worlds: BTreeMap::new(),
            homes: BTreeMap::new(),
        }
    }

    /// Commit a reservation for `region` in `world` on behalf of `estate`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlapError::Overlaps`] naming the conflicting estate if
    /// the region shares any block with an existing reservation in the
    /// same world. The index is unchanged on failure.
    pub fn try_reserve(
        &mut self,
        world: &WorldName,
        region: Cuboid,
        estate: EstateId,
    ) -> Result<ReservationId, OverlapError> {
        let index = self.worlds.entry(world.clone()).or_default();
        if let Some(conflict) = index.find_conflict(&region, None) {
            return Err(OverlapError::Overlaps {
                world: world.clone(),
                with: conflict.estate,
            });
        }

        let id = ReservationId::new();
        index.reservations.insert(id, Reservation { region, estate });
        index.insert_buckets(id, &region);
        self.homes.insert(id, world.clone());
        Ok(id)
    }

    /// Release a reservation. Safe to call on an already-released ID.
    pub fn release(&mut self, id: ReservationId) {
        let Some(world) = self.homes.remove(&id) else {
            return;
        };
        if let Some(index) = self.worlds.get_mut(&world)
            && let Some(reservation) = index.reservations.remove(&id)
        {
            index.remove_buckets(id, &reservation.region);
        }
    }

    /// Replace a reservation's region, checking the new region against all
    /// other reservations in the same world.
    ///
    /// # Errors
    ///
    /// Returns [`OverlapError::Overlaps`] if the new region conflicts, or
    /// [`OverlapError::ReservationNotFound`] if the reservation is gone.
    /// The index is unchanged on failure.
    pub fn resize(
        &mut self,
        id: ReservationId,
        new_region: Cuboid,
    ) -> Result<(), OverlapError> {
        let world = self
            .homes
            .get(&id)
            .ok_or(OverlapError::ReservationNotFound(id))?;
        let index = self
            .worlds
            .get_mut(world)
            .ok_or(OverlapError::ReservationNotFound(id))?;

        if let Some(conflict) = index.find_conflict(&new_region, Some(id)) {
            return Err(OverlapError::Overlaps {
                world: world.clone(),
                with: conflict.estate,
            });
        }

        let Some(reservation) = index.reservations.get_mut(&id) else {
            return Err(OverlapError::ReservationNotFound(id));
        };
        let old_region = reservation.region;
        reservation.region = new_region;
        index.remove_buckets(id, &old_region);
        index.insert_buckets(id, &new_region);
        Ok(())
    }

    /// The reservation whose region contains `pos`, if any.
    ///
    /// By the no-overlap invariant there is at most one.
    pub fn find_at(&self, world: &WorldName, pos: BlockPos) -> Option<ReservationId> {
        let index = self.worlds.get(world)?;
        let chunk = (chunk_coord(pos.x), chunk_coord(pos.z));
        index
            .buckets
            .get(&chunk)?
            .iter()
            .copied()
            .find(|id| {
                index
                    .reservations
                    .get(id)
                    .is_some_and(|r| r.region.contains(pos))
            })
    }

    /// The estate holding a reservation.
    pub fn estate_of(&self, id: ReservationId) -> Option<EstateId> {
        let world = self.homes.get(&id)?;
        self.worlds
            .get(world)?
            .reservations
            .get(&id)
            .map(|r| r.estate)
    }

    /// Total number of live reservations across all worlds.
    pub fn len(&self) -> usize {
        self.homes.len()
    }

    /// Whether the index holds no reservations.
    pub fn is_empty(&self) -> bool {
        self.homes.is_empty()
    }
}

/// Floor-divide a block coordinate into its chunk coordinate.
fn chunk_coord(block: i32) -> i32 {
    block.div_euclid(16)
}

/// Iterate every chunk coordinate a region touches.
fn chunks_of(region: &Cuboid) -> impl Iterator<Item = ChunkPos> {
    let min_cx = chunk_coord(region.min().x);
    let max_cx = chunk_coord(region.max().x);
    let min_cz = chunk_coord(region.min().z);
    let max_cz = chunk_coord(region.max().z);
    (min_cx..=max_cx).flat_map(move |cx| (min_cz..=max_cz).map(move |cz| (cx, cz)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(min: (i32, i32, i32), max: (i32, i32, i32)) -> Cuboid {
        Cuboid::new(
            BlockPos::new(min.0, min.1, min.2),
            BlockPos::new(max.0, max.1, max.2),
        )
    }

    #[test]
    fn reserve_and_find() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");
        let estate = EstateId::new();

        let id = index.try_reserve(&world, region((0, 0, 0), (15, 255, 15)), estate);
        assert!(id.is_ok());

        let found = index.find_at(&world, BlockPos::new(8, 64, 8));
        assert_eq!(found, id.ok());
        assert_eq!(found.and_then(|r| index.estate_of(r)), Some(estate));
    }

    #[test]
    fn overlap_is_rejected_and_index_unchanged() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");
        let first = EstateId::new();

        let _ = index.try_reserve(&world, region((0, 0, 0), (10, 255, 10)), first);
        let result = index.try_reserve(&world, region((5, 0, 5), (20, 255, 20)), EstateId::new());
        assert_eq!(
            result,
            Err(OverlapError::Overlaps {
                world: world.clone(),
                with: first,
            })
        );
        assert_eq!(index.len(), 1);
        // The rejected region's exclusive space is still free.
        assert!(index.find_at(&world, BlockPos::new(20, 0, 20)).is_none());
    }

    #[test]
    fn edge_touching_regions_coexist() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");

        let a = index.try_reserve(&world, region((0, 0, 0), (10, 255, 10)), EstateId::new());
        assert!(a.is_ok());
        // min.x == existing max.x + 1: adjacent, not overlapping.
        let b = index.try_reserve(&world, region((11, 0, 0), (20, 255, 10)), EstateId::new());
        assert!(b.is_ok());
    }

    #[test]
    fn same_region_in_different_worlds() {
        let mut index = SpatialIndex::new();
        let r = region((0, 0, 0), (10, 255, 10));
        assert!(
            index
                .try_reserve(&WorldName::from("overworld"), r, EstateId::new())
                .is_ok()
        );
        assert!(
            index
                .try_reserve(&WorldName::from("nether"), r, EstateId::new())
                .is_ok()
        );
    }

    #[test]
    fn release_frees_the_slot_and_is_noop_safe() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");
        let r = region((0, 0, 0), (10, 255, 10));

        let id = index.try_reserve(&world, r, EstateId::new()).ok();
        assert!(id.is_some());
        if let Some(id) = id {
            index.release(id);
            index.release(id); // second release is a no-op
        }
        assert!(index.is_empty());
        assert!(index.try_reserve(&world, r, EstateId::new()).is_ok());
    }

    #[test]
    fn resize_checks_others_but_not_self() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");
        let estate = EstateId::new();

        let id = index
            .try_reserve(&world, region((0, 0, 0), (10, 255, 10)), estate)
            .ok();
        let other = EstateId::new();
        let _ = index.try_reserve(&world, region((30, 0, 0), (40, 255, 10)), other);

        let Some(id) = id else {
            assert!(id.is_some());
            return;
        };

        // Growing over its own old footprint is fine.
        assert!(index.resize(id, region((0, 0, 0), (20, 255, 20))).is_ok());

        // Growing into the neighbor is not, and leaves the region as-is.
        let conflict = index.resize(id, region((0, 0, 0), (35, 255, 10)));
        assert_eq!(
            conflict,
            Err(OverlapError::Overlaps {
                world: world.clone(),
                with: other,
            })
        );
        assert_eq!(index.find_at(&world, BlockPos::new(20, 0, 20)), Some(id));
        assert!(index.find_at(&world, BlockPos::new(25, 0, 5)).is_none());
    }

    #[test]
    fn resize_of_released_reservation_fails() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");
        let id = index
            .try_reserve(&world, region((0, 0, 0), (10, 255, 10)), EstateId::new())
            .ok();
        let Some(id) = id else {
            assert!(id.is_some());
            return;
        };
        index.release(id);
        assert_eq!(
            index.resize(id, region((0, 0, 0), (5, 255, 5))),
            Err(OverlapError::ReservationNotFound(id))
        );
    }

    #[test]
    fn find_at_misses_outside_all_regions() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");
        let _ = index.try_reserve(&world, region((0, 0, 0), (10, 255, 10)), EstateId::new());
        assert!(index.find_at(&world, BlockPos::new(11, 0, 0)).is_none());
        assert!(index.find_at(&WorldName::from("nether"), BlockPos::new(5, 0, 5)).is_none());
    }

    #[test]
    fn negative_coordinates_bucket_correctly() {
        let mut index = SpatialIndex::new();
        let world = WorldName::from("overworld");
        let estate = EstateId::new();
        let id = index.try_reserve(&world, region((-20, 0, -20), (-5, 255, -5)), estate);
        assert!(id.is_ok());
        assert_eq!(index.find_at(&world, BlockPos::new(-10, 64, -10)), id.ok());
        assert!(index.find_at(&world, BlockPos::new(-4, 64, -10)).is_none());
    }
}
