//! The single-writer service facade over all claim state.
//!
//! [`ClaimService`] wraps the registry, the expansion queue, and the
//! movement tracker in one `RwLock` -- a single mutual-exclusion domain,
//! so the spatial index and the estates are never observed in an
//! inconsistent pairing. Hot-path reads (`is_allowed`) take short read
//! locks; every mutation takes the write lock for one bounded operation.
//!
//! The service is also where money meets claims: the registry validates
//! world, region, and overlap, and the service charges the claim cost,
//! rolling the claim back if the charge fails.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use freehold_billing::{CostSchedule, Economy};
use freehold_claims::{
    BoundaryCrossing, ClaimError, EstateRegistry, ExpansionError, ExpansionQueue, MovementTracker,
    RegistryError, is_allowed_at, purge, track_movement,
};
use freehold_types::{
    AccountId, BlockPos, Capability, ClaimEvent, Cuboid, Estate, EstateId, EstateKind,
    NotificationSink, PendingExpansionRequest, RejectionReason, RequestId, Role, WorldName,
};
use tracing::{info, warn};

/// All mutable claim state, guarded together by one lock.
#[derive(Debug)]
pub struct EngineState {
    /// The authoritative estate set and its spatial index.
    pub registry: EstateRegistry,
    /// Pending expansion requests.
    pub queue: ExpansionQueue,
    /// Which estate each actor was last observed in.
    pub tracker: MovementTracker,
}

impl EngineState {
    /// Create engine state around a loaded registry.
    pub fn new(registry: EstateRegistry) -> Self {
        Self {
            registry,
            queue: ExpansionQueue::new(),
            tracker: MovementTracker::new(),
        }
    }
}

/// Pre-commit hook consulted before a claim is applied.
///
/// A deny aborts the claim before any state changes or money moves. Hosts
/// use this for plot limits, protected zones, or moderation holds.
pub trait ClaimHook: Send + Sync {
    /// Whether the claim may proceed.
    fn allow_claim(&self, owner: AccountId, world: &WorldName, region: Cuboid) -> bool;
}

/// The default hook: every claim may proceed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllClaims;

impl ClaimHook for AllowAllClaims {
    fn allow_claim(&self, _owner: AccountId, _world: &WorldName, _region: Cuboid) -> bool {
        true
    }
}

/// A sink that logs every event through `tracing`.
///
/// The stock sink for headless runs; hosts replace it with chat or GUI
/// delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: ClaimEvent) {
        info!(?event, "claim event");
    }
}

/// The service facade the host calls into.
pub struct ClaimService {
    state: Arc<RwLock<EngineState>>,
    economy: Arc<dyn Economy>,
    sink: Arc<dyn NotificationSink>,
    hook: Arc<dyn ClaimHook>,
    claim_schedule: CostSchedule,
}

impl ClaimService {
    /// Wire up the service around shared state and collaborators.
    pub fn new(
        state: Arc<RwLock<EngineState>>,
        economy: Arc<dyn Economy>,
        sink: Arc<dyn NotificationSink>,
        hook: Arc<dyn ClaimHook>,
        claim_schedule: CostSchedule,
    ) -> Self {
        Self {
            state,
            economy,
            sink,
            hook,
            claim_schedule,
        }
    }

    /// The shared state handle, for background tasks.
    pub fn state(&self) -> Arc<RwLock<EngineState>> {
        Arc::clone(&self.state)
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------
    // Claim lifecycle
    // -------------------------------------------------------------------

    /// Create a new estate, charging the one-time claim cost.
    ///
    /// Preconditions are checked in order: the pre-commit hook, then world
    /// rules, region validity, and overlap (inside the registry), and
    /// funds last. A failed charge rolls the committed claim back, so no
    /// partial state survives. Every rejection emits a
    /// [`ClaimEvent::ClaimRejected`] with the specific reason.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError`] naming the failed precondition.
    pub fn claim(
        &self,
        owner: AccountId,
        kind: EstateKind,
        region: Cuboid,
        world: WorldName,
    ) -> Result<Estate, ClaimError> {
        if !self.hook.allow_claim(owner, &world, region) {
            self.reject(owner, world.clone(), RejectionReason::WorldDisallows);
            return Err(ClaimError::WorldDisallows(world));
        }

        let cost = self.claim_schedule.cost_for(region.area());
        let mut state = self.write();

        let estate = state
            .registry
            .claim(owner, kind, region, world.clone(), Utc::now())
            .inspect_err(|e| self.reject(owner, world.clone(), e.rejection_reason()))?;

        if !self.economy.charge(owner, cost) {
            // Roll the commit back; the claim never happened.
            if let Err(e) = state.registry.unclaim(estate.id) {
                warn!(estate = %estate.id, error = %e, "failed to roll back unpaid claim");
            }
            self.reject(owner, world, RejectionReason::InsufficientFunds);
            return Err(ClaimError::InsufficientFunds);
        }

        info!(estate = %estate.id, owner = %owner, cost = %cost, "estate claimed");
        Ok(estate)
    }

    /// Remove an estate.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for a missing (or already
    /// removed) estate.
    pub fn unclaim(&self, id: EstateId) -> Result<Estate, RegistryError> {
        let mut state = self.write();
        let estate = state.registry.unclaim(id)?;
        state.tracker.forget_estate(id);
        Ok(estate)
    }

    // -------------------------------------------------------------------
    // Estate mutation passthroughs
    // -------------------------------------------------------------------

    /// Set a capability flag on an estate.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist.
    pub fn set_flag(&self, id: EstateId, key: &str, value: bool) -> Result<(), RegistryError> {
        self.write().registry.set_flag(id, key, value)
    }

    /// Add or re-role a roster member.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] or [`RegistryError::OwnerImmutable`].
    pub fn set_member(
        &self,
        id: EstateId,
        account: AccountId,
        role: Role,
    ) -> Result<(), RegistryError> {
        self.write().registry.set_member(id, account, role)
    }

    /// Remove a roster member.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::OwnerImmutable`],
    /// or [`RegistryError::MemberNotFound`].
    pub fn remove_member(&self, id: EstateId, account: AccountId) -> Result<(), RegistryError> {
        self.write().registry.remove_member(id, account)
    }

    /// Raise an estate's tier. Returns the new level.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist.
    pub fn upgrade(&self, id: EstateId) -> Result<u32, RegistryError> {
        self.write().registry.upgrade(id)
    }

    /// Lower an estate's tier, never below 1. Returns the new level.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the estate does not exist.
    pub fn downgrade(&self, id: EstateId) -> Result<u32, RegistryError> {
        self.write().registry.downgrade(id)
    }

    // -------------------------------------------------------------------
    // Expansion workflow
    // -------------------------------------------------------------------

    /// Queue a request to grow an estate.
    pub fn request_expansion(
        &self,
        estate: EstateId,
        new_region: Cuboid,
        requester: AccountId,
    ) -> RequestId {
        self.write()
            .queue
            .submit(estate, new_region, requester, Utc::now())
    }

    /// Approve a pending expansion, applying the resize.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError`]; on an apply conflict the request is
    /// marked rejected.
    pub fn approve_expansion(&self, id: RequestId) -> Result<(), ExpansionError> {
        let mut state = self.write();
        let EngineState {
            registry, queue, ..
        } = &mut *state;
        queue.approve(id, registry)
    }

    /// Reject a pending expansion.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError::RequestNotFound`] or
    /// [`ExpansionError::AlreadyDecided`].
    pub fn reject_expansion(&self, id: RequestId) -> Result<(), ExpansionError> {
        self.write().queue.reject(id)
    }

    /// Snapshot of the requests still awaiting a decision.
    pub fn pending_expansions(&self) -> Vec<PendingExpansionRequest> {
        self.read().queue.pending().into_iter().cloned().collect()
    }

    // -------------------------------------------------------------------
    // Hot path: reads and movement
    // -------------------------------------------------------------------

    /// Whether `actor` holds `capability` at the given point.
    pub fn is_allowed(
        &self,
        actor: AccountId,
        world: &WorldName,
        pos: BlockPos,
        capability: &Capability,
    ) -> bool {
        is_allowed_at(&self.read().registry, actor, world, pos, capability)
    }

    /// A point-in-time copy of an estate.
    pub fn estate(&self, id: EstateId) -> Option<Estate> {
        self.read().registry.estate(id).cloned()
    }

    /// The estate covering a point, if any.
    pub fn estate_at(&self, world: &WorldName, pos: BlockPos) -> Option<EstateId> {
        self.read().registry.estate_at(world, pos).map(|e| e.id)
    }

    /// IDs of every estate owned by the account.
    pub fn estates_owned_by(&self, owner: AccountId) -> Vec<EstateId> {
        self.read().registry.estates_owned_by(owner)
    }

    /// Feed one observed actor position in, emitting enter/leave events
    /// for any boundary crossed.
    ///
    /// Most positions land in the estate (or open ground) the actor was
    /// already in, so the common case is resolved under a read lock; the
    /// write lock is taken only when a boundary was actually crossed. The
    /// tracker re-compares under the write lock, so a crossing slipping in
    /// between the two locks is still recorded exactly once.
    pub fn move_to(&self, actor: AccountId, world: &WorldName, pos: BlockPos) {
        {
            let state = self.read();
            let current = state.registry.estate_at(world, pos).map(|e| e.id);
            if state.tracker.location_of(actor) == current {
                return;
            }
        }
        let crossings = {
            let mut state = self.write();
            let EngineState {
                registry, tracker, ..
            } = &mut *state;
            track_movement(registry, tracker, actor, world, pos)
        };
        for crossing in crossings {
            let event = match crossing {
                BoundaryCrossing::Entered(estate) => ClaimEvent::EnterEstate {
                    estate,
                    account: actor,
                },
                BoundaryCrossing::Left(estate) => ClaimEvent::LeaveEstate {
                    estate,
                    account: actor,
                },
            };
            self.sink.notify(event);
        }
    }

    /// The actor left the session; drop its movement state.
    pub fn forget_actor(&self, actor: AccountId) {
        self.write().tracker.forget(actor);
    }

    // -------------------------------------------------------------------
    // Moderation
    // -------------------------------------------------------------------

    /// Remove every estate owned by a (newly banned) account.
    pub fn purge_account(&self, account: AccountId) -> usize {
        purge(&mut self.write().registry, account)
    }

    fn reject(&self, account: AccountId, world: WorldName, reason: RejectionReason) {
        self.sink.notify(ClaimEvent::ClaimRejected {
            account,
            world,
            reason,
        });
    }
}

impl std::fmt::Debug for ClaimService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use freehold_billing::InMemoryEconomy;
    use freehold_types::WorldRules;
    use rust_decimal_macros::dec;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSink {
        events: Mutex<Vec<ClaimEvent>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<ClaimEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, event: ClaimEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }

    struct DenyAll;

    impl ClaimHook for DenyAll {
        fn allow_claim(&self, _: AccountId, _: &WorldName, _: Cuboid) -> bool {
            false
        }
    }

    fn region() -> Cuboid {
        Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(10, 255, 10))
    }

    fn service_with(
        economy: Arc<InMemoryEconomy>,
        sink: Arc<RecordingSink>,
        hook: Arc<dyn ClaimHook>,
    ) -> ClaimService {
        let state = Arc::new(RwLock::new(EngineState::new(EstateRegistry::new(
            WorldRules::default(),
        ))));
        ClaimService::new(
            state,
            economy,
            sink,
            hook,
            // base 100 + 0.25/block
            CostSchedule::new(dec!(100), dec!(0.25)),
        )
    }

    #[test]
    fn claim_charges_the_owner() {
        let owner = AccountId::new();
        let economy = Arc::new(InMemoryEconomy::with_balances([(owner, dec!(200))]));
        let sink = Arc::new(RecordingSink::default());
        let service = service_with(
            Arc::clone(&economy),
            Arc::clone(&sink),
            Arc::new(AllowAllClaims),
        );

        let estate = service.claim(owner, EstateKind::Private, region(), WorldName::from("overworld"));
        assert!(estate.is_ok());
        // 100 + 0.25 * 121 = 130.25 charged.
        assert_eq!(economy.balance(owner), dec!(69.75));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn unpaid_claim_is_rolled_back() {
        let owner = AccountId::new();
        let economy = Arc::new(InMemoryEconomy::new());
        let sink = Arc::new(RecordingSink::default());
        let service = service_with(
            Arc::clone(&economy),
            Arc::clone(&sink),
            Arc::new(AllowAllClaims),
        );

        let world = WorldName::from("overworld");
        let result = service.claim(owner, EstateKind::Private, region(), world.clone());
        assert_eq!(result.err(), Some(ClaimError::InsufficientFunds));
        // No estate survives the failed charge.
        assert!(service.estate_at(&world, BlockPos::new(5, 64, 5)).is_none());
        assert_eq!(
            sink.events(),
            vec![ClaimEvent::ClaimRejected {
                account: owner,
                world,
                reason: RejectionReason::InsufficientFunds,
            }]
        );
    }

    #[test]
    fn hook_denial_aborts_before_any_charge() {
        let owner = AccountId::new();
        let economy = Arc::new(InMemoryEconomy::with_balances([(owner, dec!(500))]));
        let sink = Arc::new(RecordingSink::default());
        let service = service_with(Arc::clone(&economy), Arc::clone(&sink), Arc::new(DenyAll));

        let result = service.claim(
            owner,
            EstateKind::Private,
            region(),
            WorldName::from("overworld"),
        );
        assert!(result.is_err());
        assert_eq!(economy.balance(owner), dec!(500));
    }

    #[test]
    fn movement_emits_enter_and_leave_once() {
        let owner = AccountId::new();
        let economy = Arc::new(InMemoryEconomy::with_balances([(owner, dec!(500))]));
        let sink = Arc::new(RecordingSink::default());
        let service = service_with(
            Arc::clone(&economy),
            Arc::clone(&sink),
            Arc::new(AllowAllClaims),
        );
        let world = WorldName::from("overworld");
        let estate = service.claim(owner, EstateKind::Private, region(), world.clone());
        let id = estate.map(|e| e.id).unwrap_or_default();

        let visitor = AccountId::new();
        service.move_to(visitor, &world, BlockPos::new(5, 64, 5));
        // Movement within the same estate is silent.
        service.move_to(visitor, &world, BlockPos::new(6, 64, 6));
        service.move_to(visitor, &world, BlockPos::new(50, 64, 50));

        assert_eq!(
            sink.events(),
            vec![
                ClaimEvent::EnterEstate {
                    estate: id,
                    account: visitor,
                },
                ClaimEvent::LeaveEstate {
                    estate: id,
                    account: visitor,
                },
            ]
        );
    }

    #[test]
    fn movement_outside_all_estates_emits_nothing() {
        let economy = Arc::new(InMemoryEconomy::new());
        let sink = Arc::new(RecordingSink::default());
        let service = service_with(economy, Arc::clone(&sink), Arc::new(AllowAllClaims));
        let world = WorldName::from("overworld");

        let wanderer = AccountId::new();
        service.move_to(wanderer, &world, BlockPos::new(500, 64, 500));
        service.move_to(wanderer, &world, BlockPos::new(501, 64, 500));

        assert!(sink.events().is_empty());
    }

    #[test]
    fn purge_account_removes_all_owned_estates() {
        let owner = AccountId::new();
        let economy = Arc::new(InMemoryEconomy::with_balances([(owner, dec!(10_000))]));
        let sink = Arc::new(RecordingSink::default());
        let service = service_with(economy, sink, Arc::new(AllowAllClaims));
        let world = WorldName::from("overworld");

        let first = service.claim(owner, EstateKind::Private, region(), world.clone());
        assert!(first.is_ok());
        let second = service.claim(
            owner,
            EstateKind::Private,
            Cuboid::new(BlockPos::new(100, 0, 100), BlockPos::new(110, 255, 110)),
            world,
        );
        assert!(second.is_ok());

        assert_eq!(service.purge_account(owner), 2);
        assert_eq!(service.purge_account(owner), 0);
        assert!(service.estates_owned_by(owner).is_empty());
    }
}
