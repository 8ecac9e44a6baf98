//! Semantic domain notifications and the sink collaborator.
//!
//! The core never talks to chat, GUIs, or webhooks directly; it hands a
//! [`ClaimEvent`] to whatever [`NotificationSink`] the host wired in.
//! Delivery is fire-and-forget: a sink must not fail, block, or feed back
//! into the engine.

use chrono::TimeDelta;
use rust_decimal::Decimal;

use crate::enums::RejectionReason;
use crate::ids::{AccountId, EstateId};
use crate::world::WorldName;

/// A semantic event emitted by the claim engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimEvent {
    /// An actor crossed into an estate.
    EnterEstate {
        /// The estate entered.
        estate: EstateId,
        /// The actor who crossed the boundary.
        account: AccountId,
    },
    /// An actor crossed out of an estate.
    LeaveEstate {
        /// The estate left.
        estate: EstateId,
        /// The actor who crossed the boundary.
        account: AccountId,
    },
    /// Upkeep was charged successfully.
    UpkeepPaid {
        /// The estate billed.
        estate: EstateId,
        /// The estate owner who paid.
        owner: AccountId,
        /// The amount charged.
        amount: Decimal,
    },
    /// An upkeep charge failed but the estate is still within its grace
    /// period. Repeats every sweep until paid or expired.
    UpkeepWarning {
        /// The estate billed.
        estate: EstateId,
        /// The estate owner in arrears.
        owner: AccountId,
        /// The amount that could not be charged.
        amount_due: Decimal,
        /// How long the estate has been overdue.
        overdue: TimeDelta,
    },
    /// The grace period ran out and the estate was removed.
    EstateExpired {
        /// The removed estate.
        estate: EstateId,
        /// Its former owner.
        owner: AccountId,
    },
    /// A claim attempt was turned down.
    ClaimRejected {
        /// The account that tried to claim.
        account: AccountId,
        /// The world of the attempt.
        world: WorldName,
        /// The specific rejection reason.
        reason: RejectionReason,
    },
}

/// Collaborator that receives domain notifications.
///
/// Implementations are presentation-layer concerns (chat messages, GUI
/// toasts, audit logs); the engine only guarantees it calls `notify` once
/// per semantic occurrence.
pub trait NotificationSink: Send + Sync {
    /// Deliver one event. Must not block the caller.
    fn notify(&self, event: ClaimEvent);
}

/// A sink that discards every event. Useful for tests and headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: ClaimEvent) {}
}
