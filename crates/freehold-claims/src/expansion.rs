//! The pending expansion queue: player requests to grow an estate that
//! await administrative approval.
//!
//! Requests follow the same dirty/save contract as estates: the queue
//! tracks its own dirty flag for the persistence coordinator and exposes a
//! snapshot of every record (decided requests are kept for audit until the
//! host prunes them).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use freehold_types::{
    AccountId, ApprovalState, Cuboid, EstateId, PendingExpansionRequest, RequestId,
};
use tracing::debug;

use crate::error::ExpansionError;
use crate::registry::EstateRegistry;

/// All expansion requests known to the engine.
#[derive(Debug, Default)]
pub struct ExpansionQueue {
    requests: BTreeMap<RequestId, PendingExpansionRequest>,
    /// Monotonic change counter, bumped on every mutation.
    generation: u64,
    /// The generation the last completed save captured.
    saved_generation: u64,
}

impl ExpansionQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            generation: 0,
            saved_generation: 0,
        }
    }

    /// Submit a new expansion request.
    pub fn submit(
        &mut self,
        estate: EstateId,
        new_region: Cuboid,
        requester: AccountId,
        now: DateTime<Utc>,
    ) -> RequestId {
        let request = PendingExpansionRequest::new(estate, new_region, requester, now);
        let id = request.id;
        debug!(request = %id, estate = %estate, requester = %requester, "expansion requested");
        self.requests.insert(id, request);
        self.touch();
        id
    }

    /// Approve a pending request and apply the resize to the registry.
    ///
    /// If the resize fails (the requested space was claimed in the
    /// meantime, or the estate is gone), the request is marked rejected and
    /// the failure is returned -- an approval is never left dangling.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError::RequestNotFound`],
    /// [`ExpansionError::AlreadyDecided`], or [`ExpansionError::Apply`].
    pub fn approve(
        &mut self,
        id: RequestId,
        registry: &mut EstateRegistry,
    ) -> Result<(), ExpansionError> {
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(ExpansionError::RequestNotFound(id))?;
        if request.state != ApprovalState::Pending {
            return Err(ExpansionError::AlreadyDecided(id));
        }

        match registry.resize(request.estate, request.new_region) {
            Ok(()) => {
                request.state = ApprovalState::Approved;
                debug!(request = %id, estate = %request.estate, "expansion approved");
                self.touch();
                Ok(())
            }
            Err(source) => {
                request.state = ApprovalState::Rejected;
                self.touch();
                Err(ExpansionError::Apply { source })
            }
        }
    }

    /// Reject a pending request.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError::RequestNotFound`] or
    /// [`ExpansionError::AlreadyDecided`].
    pub fn reject(&mut self, id: RequestId) -> Result<(), ExpansionError> {
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(ExpansionError::RequestNotFound(id))?;
        if request.state != ApprovalState::Pending {
            return Err(ExpansionError::AlreadyDecided(id));
        }
        request.state = ApprovalState::Rejected;
        self.touch();
        Ok(())
    }

    /// All requests still awaiting a decision.
    pub fn pending(&self) -> Vec<&PendingExpansionRequest> {
        self.requests
            .values()
            .filter(|r| r.state == ApprovalState::Pending)
            .collect()
    }

    /// Look up a request by ID.
    pub fn request(&self, id: RequestId) -> Option<&PendingExpansionRequest> {
        self.requests.get(&id)
    }

    /// A point-in-time copy of every record, for the persistence coordinator.
    pub fn snapshot(&self) -> Vec<PendingExpansionRequest> {
        self.requests.values().cloned().collect()
    }

    /// Re-commit a persisted request at load time (does not mark dirty).
    pub fn restore(&mut self, request: PendingExpansionRequest) {
        self.requests.insert(request.id, request);
    }

    /// Whether any request changed since the last completed save.
    pub const fn is_dirty(&self) -> bool {
        self.generation != self.saved_generation
    }

    /// The current change counter, captured alongside [`snapshot`].
    ///
    /// [`snapshot`]: ExpansionQueue::snapshot
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Record that a snapshot captured at `generation` was saved.
    ///
    /// Requests mutated after the snapshot keep the queue dirty for the
    /// next cycle.
    pub const fn mark_saved(&mut self, generation: u64) {
        self.saved_generation = generation;
    }

    /// Mark the queue clean, for the load path.
    pub const fn clear_dirty(&mut self) {
        self.saved_generation = self.generation;
    }

    const fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
