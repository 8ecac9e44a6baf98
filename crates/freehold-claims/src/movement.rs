//! Boundary-crossing detection for moving actors.
//!
//! Access decisions never depend on this state; it only exists to drive
//! enter/leave side effects (notifications, title messages) exactly once
//! per crossing. An actor is either `Outside` all estates or inside exactly
//! one -- the no-overlap invariant guarantees there is never ambiguity.

use std::collections::BTreeMap;

use freehold_types::{AccountId, EstateId};

/// One observed boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCrossing {
    /// The actor moved into the estate.
    Entered(EstateId),
    /// The actor moved out of the estate.
    Left(EstateId),
}

/// Tracks which estate each actor was last observed in.
///
/// Actors absent from the map are outside all estates; the map stays small
/// because only actors currently standing inside an estate are stored.
#[derive(Debug, Default)]
pub struct MovementTracker {
    inside: BTreeMap<AccountId, EstateId>,
}

impl MovementTracker {
    /// Create an empty tracker.
    pub const fn new() -> Self {
        Self {
            inside: BTreeMap::new(),
        }
    }

    /// Record the actor's current containing estate (or none) and return
    /// the crossings this implies, in leave-then-enter order.
    ///
    /// Sub-cell movement within the same estate, or while fully outside,
    /// yields no crossings.
    pub fn update(&mut self, actor: AccountId, current: Option<EstateId>) -> Vec<BoundaryCrossing> {
        let previous = self.inside.get(&actor).copied();
        if previous == current {
            return Vec::new();
        }

        let mut crossings = Vec::new();
        if let Some(old) = previous {
            crossings.push(BoundaryCrossing::Left(old));
        }
        match current {
            Some(new) => {
                crossings.push(BoundaryCrossing::Entered(new));
                self.inside.insert(actor, new);
            }
            None => {
                self.inside.remove(&actor);
            }
        }
        crossings
    }

    /// The estate the actor was last observed inside, if any.
    pub fn location_of(&self, actor: AccountId) -> Option<EstateId> {
        self.inside.get(&actor).copied()
    }

    /// Drop all state for an actor (disconnect). Returns the estate they
    /// were inside, so the caller can decide whether to fire a final leave.
    pub fn forget(&mut self, actor: AccountId) -> Option<EstateId> {
        self.inside.remove(&actor)
    }

    /// Drop state referring to a removed estate so a future re-entry of
    /// freshly claimed land at the same spot fires a clean enter.
    pub fn forget_estate(&mut self, estate: EstateId) {
        self.inside.retain(|_, inside| *inside != estate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entering_from_outside_fires_enter_only() {
        let mut tracker = MovementTracker::new();
        let actor = AccountId::new();
        let estate = EstateId::new();

        let crossings = tracker.update(actor, Some(estate));
        assert_eq!(crossings, vec![BoundaryCrossing::Entered(estate)]);
        assert_eq!(tracker.location_of(actor), Some(estate));
    }

    #[test]
    fn movement_within_the_same_estate_is_silent() {
        let mut tracker = MovementTracker::new();
        let actor = AccountId::new();
        let estate = EstateId::new();

        let _ = tracker.update(actor, Some(estate));
        assert!(tracker.update(actor, Some(estate)).is_empty());
        assert!(tracker.update(actor, Some(estate)).is_empty());
    }

    #[test]
    fn movement_outside_all_estates_is_silent() {
        let mut tracker = MovementTracker::new();
        let actor = AccountId::new();
        assert!(tracker.update(actor, None).is_empty());
        assert!(tracker.update(actor, None).is_empty());
    }

    #[test]
    fn leaving_fires_leave_only() {
        let mut tracker = MovementTracker::new();
        let actor = AccountId::new();
        let estate = EstateId::new();

        let _ = tracker.update(actor, Some(estate));
        let crossings = tracker.update(actor, None);
        assert_eq!(crossings, vec![BoundaryCrossing::Left(estate)]);
        assert_eq!(tracker.location_of(actor), None);
    }

    #[test]
    fn estate_to_estate_fires_leave_then_enter() {
        let mut tracker = MovementTracker::new();
        let actor = AccountId::new();
        let first = EstateId::new();
        let second = EstateId::new();

        let _ = tracker.update(actor, Some(first));
        let crossings = tracker.update(actor, Some(second));
        assert_eq!(
            crossings,
            vec![
                BoundaryCrossing::Left(first),
                BoundaryCrossing::Entered(second),
            ]
        );
    }

    #[test]
    fn forget_estate_clears_stale_occupants() {
        let mut tracker = MovementTracker::new();
        let actor = AccountId::new();
        let estate = EstateId::new();

        let _ = tracker.update(actor, Some(estate));
        tracker.forget_estate(estate);
        // Re-observing the same containing estate now fires a fresh enter.
        let crossings = tracker.update(actor, Some(estate));
        assert_eq!(crossings, vec![BoundaryCrossing::Entered(estate)]);
    }
}
