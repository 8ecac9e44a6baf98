//! The persistence coordinator: dirty-gated snapshot saves and the
//! load-time restore path.
//!
//! The coordinator is the only component that talks to the storage
//! backend. Saves are skipped entirely while nothing is dirty; on a save
//! failure the dirty flags are left set so the next cycle retries, and the
//! backend's atomic-replace contract means the previous snapshot on disk
//! stays intact.

use freehold_claims::{EstateRegistry, ExpansionQueue, restore_all};
use freehold_types::Estate;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::storage::EstateStorage;

/// Counts from a completed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Estates committed to the registry.
    pub estates: usize,
    /// Estates skipped for integrity conflicts (overlap or duplicate ID).
    pub skipped: usize,
    /// Expansion requests restored.
    pub requests: usize,
}

/// Owns the storage backend and drives saves and loads.
pub struct PersistenceCoordinator {
    storage: Box<dyn EstateStorage>,
}

impl PersistenceCoordinator {
    /// Create a coordinator over the given backend.
    pub fn new(storage: Box<dyn EstateStorage>) -> Self {
        Self { storage }
    }

    /// Restore all persisted state into an empty registry and queue.
    ///
    /// Estates with integrity conflicts are reported and skipped without
    /// aborting the rest of the load. Restored state starts clean: nothing
    /// is dirty until the first post-load mutation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] only when the backend itself fails;
    /// per-record conflicts are counted in the summary instead.
    pub fn load_all(
        &self,
        registry: &mut EstateRegistry,
        queue: &mut ExpansionQueue,
    ) -> Result<LoadSummary, StorageError> {
        let estates = self.storage.load_estates()?;
        let total = estates.len();
        let committed = restore_all(registry, estates);
        let skipped = total.saturating_sub(committed);
        if skipped > 0 {
            warn!(skipped, "estates dropped during load for integrity conflicts");
        }

        let requests = self.storage.load_requests()?;
        let request_count = requests.len();
        for request in requests {
            queue.restore(request);
        }
        queue.clear_dirty();
        registry.clear_dirty();

        info!(
            estates = committed,
            requests = request_count,
            "claim state loaded"
        );
        Ok(LoadSummary {
            estates: committed,
            skipped,
            requests: request_count,
        })
    }

    /// Save whatever is dirty in one synchronous call; returns whether a
    /// write happened.
    ///
    /// Dirty state clears only after the corresponding save succeeds, so a
    /// failed write is retried on the next cycle. This borrows the state
    /// exclusively for the whole write, so it belongs on the shutdown path
    /// and in tests; the periodic task snapshots under a short lock and
    /// runs [`save_estates`]/[`save_requests`] with no lock held.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] from the backend. State already saved in
    /// this call stays clean; the failed portion stays dirty.
    ///
    /// [`save_estates`]: PersistenceCoordinator::save_estates
    /// [`save_requests`]: PersistenceCoordinator::save_requests
    pub fn flush(
        &self,
        registry: &mut EstateRegistry,
        queue: &mut ExpansionQueue,
    ) -> Result<bool, StorageError> {
        let mut wrote = false;

        if registry.is_dirty() {
            let generation = registry.generation();
            let snapshot: Vec<Estate> = registry.estates().cloned().collect();
            self.save_estates(&snapshot)?;
            registry.mark_saved(generation);
            wrote = true;
        }

        if queue.is_dirty() {
            let generation = queue.generation();
            let snapshot = queue.snapshot();
            self.save_requests(&snapshot)?;
            queue.mark_saved(generation);
            wrote = true;
        }

        Ok(wrote)
    }

    /// Write an estate snapshot to the backend.
    ///
    /// Takes the snapshot by slice so callers can clone it under a short
    /// lock and run the write with no lock held; the caller commits the
    /// save afterwards with the registry's `mark_saved`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] from the backend.
    pub fn save_estates(&self, estates: &[Estate]) -> Result<(), StorageError> {
        self.storage.save_estates(estates)?;
        debug!(estates = estates.len(), "estate snapshot flushed");
        Ok(())
    }

    /// Write an expansion-request snapshot to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] from the backend.
    pub fn save_requests(
        &self,
        requests: &[freehold_types::PendingExpansionRequest],
    ) -> Result<(), StorageError> {
        self.storage.save_requests(requests)?;
        debug!(requests = requests.len(), "expansion request snapshot flushed");
        Ok(())
    }
}

impl std::fmt::Debug for PersistenceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceCoordinator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use freehold_types::{
        AccountId, BlockPos, Cuboid, EstateKind, WorldName, WorldRules,
    };

    use crate::storage::MemoryStorage;

    use super::*;

    fn region(min: (i32, i32, i32), max: (i32, i32, i32)) -> Cuboid {
        Cuboid::new(
            BlockPos::new(min.0, min.1, min.2),
            BlockPos::new(max.0, max.1, max.2),
        )
    }

    fn claim(reg: &mut EstateRegistry, min: (i32, i32, i32), max: (i32, i32, i32)) {
        let result = reg.claim(
            AccountId::new(),
            EstateKind::Private,
            region(min, max),
            WorldName::from("overworld"),
            Utc::now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn flush_skips_when_clean() {
        let coordinator = PersistenceCoordinator::new(Box::new(MemoryStorage::new()));
        let mut registry = EstateRegistry::new(WorldRules::default());
        let mut queue = ExpansionQueue::new();

        assert_eq!(coordinator.flush(&mut registry, &mut queue).ok(), Some(false));
    }

    #[test]
    fn flush_writes_once_then_goes_idle() {
        let coordinator = PersistenceCoordinator::new(Box::new(MemoryStorage::new()));
        let mut registry = EstateRegistry::new(WorldRules::default());
        let mut queue = ExpansionQueue::new();
        claim(&mut registry, (0, 0, 0), (10, 255, 10));

        assert_eq!(coordinator.flush(&mut registry, &mut queue).ok(), Some(true));
        assert!(!registry.is_dirty());
        // Nothing changed since: the next cycle writes nothing.
        assert_eq!(coordinator.flush(&mut registry, &mut queue).ok(), Some(false));
    }

    #[test]
    fn save_load_roundtrip_preserves_state() {
        let coordinator = PersistenceCoordinator::new(Box::new(MemoryStorage::new()));
        let mut registry = EstateRegistry::new(WorldRules::default());
        let mut queue = ExpansionQueue::new();
        claim(&mut registry, (0, 0, 0), (10, 255, 10));
        claim(&mut registry, (30, 0, 0), (40, 255, 10));
        let ids = registry.estate_ids();
        let _ = queue.submit(
            ids.first().copied().unwrap_or_default(),
            region((0, 0, 0), (20, 255, 20)),
            AccountId::new(),
            Utc::now(),
        );

        assert!(coordinator.flush(&mut registry, &mut queue).is_ok());

        let mut restored_registry = EstateRegistry::new(WorldRules::default());
        let mut restored_queue = ExpansionQueue::new();
        let summary = coordinator
            .load_all(&mut restored_registry, &mut restored_queue)
            .unwrap_or_default();

        assert_eq!(summary.estates, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.requests, 1);
        assert_eq!(restored_registry.estate_ids(), ids);
        assert!(!restored_registry.is_dirty());
        assert!(!restored_queue.is_dirty());
    }

    #[test]
    fn load_skips_conflicting_records() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let rules = freehold_types::WorldRuleSet::default();
        let good = freehold_types::Estate::new(
            AccountId::new(),
            EstateKind::Private,
            WorldName::from("overworld"),
            region((0, 0, 0), (10, 255, 10)),
            &rules,
            now,
        );
        let conflicting = freehold_types::Estate::new(
            AccountId::new(),
            EstateKind::Private,
            WorldName::from("overworld"),
            region((5, 0, 5), (15, 255, 15)),
            &rules,
            now,
        );
        assert!(storage.save_estates(&[good, conflicting]).is_ok());

        let coordinator = PersistenceCoordinator::new(Box::new(storage));
        let mut registry = EstateRegistry::new(WorldRules::default());
        let mut queue = ExpansionQueue::new();
        let summary = coordinator.load_all(&mut registry, &mut queue).unwrap_or_default();

        assert_eq!(summary.estates, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(registry.len(), 1);
    }
}
