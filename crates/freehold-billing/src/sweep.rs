//! The periodic upkeep sweep and the per-estate billing state machine.
//!
//! A sweep walks a stable snapshot of estate IDs taken at sweep start:
//! estates claimed after that point wait for the next sweep, estates
//! unclaimed mid-sweep resolve to nothing and are skipped, and no estate
//! is ever visited twice in one sweep. Each estate's assessment and
//! mutation is one bounded step -- a failure there is logged and isolated,
//! never aborting the rest of the sweep.

use chrono::{DateTime, TimeDelta, Utc};
use freehold_claims::EstateRegistry;
use freehold_types::{ClaimEvent, Estate, EstateId, EstateKind, NotificationSink};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::cost::UpkeepConfig;
use crate::economy::Economy;

/// The decision reached for one estate during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingOutcome {
    /// Upkeep is not owed yet.
    NotDue,
    /// Server-owned estates never pay upkeep.
    Exempt,
    /// The owner was charged successfully.
    Paid {
        /// The amount charged.
        amount: Decimal,
    },
    /// The charge failed but the estate is inside its grace period.
    Warned {
        /// The amount that could not be charged.
        amount_due: Decimal,
        /// How long the estate has been overdue.
        overdue: TimeDelta,
    },
    /// The charge failed and the grace period has elapsed.
    Expired {
        /// How long the estate had been overdue.
        overdue: TimeDelta,
    },
}

/// Counters describing one completed sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Estates examined.
    pub visited: usize,
    /// Successful charges.
    pub paid: usize,
    /// Grace-period warnings emitted.
    pub warned: usize,
    /// Estates removed for non-payment.
    pub expired: usize,
    /// Estates skipped as exempt or vanished mid-sweep.
    pub skipped: usize,
    /// Per-estate failures that were isolated and logged.
    pub errors: usize,
}

/// Drives upkeep assessment and collection.
#[derive(Debug, Clone, Copy)]
pub struct BillingEngine {
    config: UpkeepConfig,
}

impl BillingEngine {
    /// Create a billing engine with the given upkeep configuration.
    pub const fn new(config: UpkeepConfig) -> Self {
        Self { config }
    }

    /// The active upkeep configuration.
    pub const fn config(&self) -> &UpkeepConfig {
        &self.config
    }

    /// Assess one estate against the clock and attempt collection.
    ///
    /// Pure apart from the charge call: the caller applies the outcome to
    /// the registry, which keeps each mutation inside its own bounded
    /// critical section.
    pub fn assess(
        &self,
        estate: &Estate,
        economy: &dyn Economy,
        now: DateTime<Utc>,
    ) -> BillingOutcome {
        if estate.kind == EstateKind::Server || estate.owner.is_server() {
            return BillingOutcome::Exempt;
        }

        let elapsed = now.signed_duration_since(estate.last_upkeep_payment);
        if elapsed < self.config.check_interval {
            return BillingOutcome::NotDue;
        }

        let amount = self.config.schedule.cost_for(estate.region.area());
        if economy.charge(estate.owner, amount) {
            return BillingOutcome::Paid { amount };
        }

        // Strictly greater than the grace period: an estate exactly at the
        // boundary gets one more warning.
        if elapsed > self.config.grace_period {
            BillingOutcome::Expired { overdue: elapsed }
        } else {
            BillingOutcome::Warned {
                amount_due: amount,
                overdue: elapsed,
            }
        }
    }

    /// Run one full upkeep sweep over the registry.
    ///
    /// The caller is responsible for holding the single-writer lock (or
    /// being the single writer); background schedulers should take the
    /// lock per estate, not across the whole sweep.
    pub fn sweep(
        &self,
        registry: &mut EstateRegistry,
        economy: &dyn Economy,
        sink: &dyn NotificationSink,
        now: DateTime<Utc>,
    ) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let snapshot = registry.estate_ids();
        for id in snapshot {
            self.collect(registry, economy, sink, id, now, &mut summary);
        }

        if summary.paid > 0 || summary.warned > 0 || summary.expired > 0 {
            info!(
                visited = summary.visited,
                paid = summary.paid,
                warned = summary.warned,
                expired = summary.expired,
                "upkeep sweep complete"
            );
        }
        summary
    }

    /// Assess one estate and apply the outcome, tallying into `summary`.
    ///
    /// This is the bounded per-estate step: background schedulers call it
    /// under a write lock held only for this one estate.
    pub fn collect(
        &self,
        registry: &mut EstateRegistry,
        economy: &dyn Economy,
        sink: &dyn NotificationSink,
        id: EstateId,
        now: DateTime<Utc>,
        summary: &mut SweepSummary,
    ) {
        // Unclaimed since the id snapshot was taken: skip silently.
        let Some(estate) = registry.estate(id) else {
            summary.skipped = summary.skipped.saturating_add(1);
            return;
        };
        summary.visited = summary.visited.saturating_add(1);
        let owner = estate.owner;

        match self.assess(estate, economy, now) {
            BillingOutcome::NotDue => {}
            BillingOutcome::Exempt => {
                summary.skipped = summary.skipped.saturating_add(1);
            }
            BillingOutcome::Paid { amount } => match registry.record_upkeep_payment(id, now) {
                Ok(()) => {
                    debug!(estate = %id, %amount, "upkeep collected");
                    sink.notify(ClaimEvent::UpkeepPaid {
                        estate: id,
                        owner,
                        amount,
                    });
                    summary.paid = summary.paid.saturating_add(1);
                }
                Err(e) => {
                    warn!(estate = %id, error = %e, "failed to record upkeep payment");
                    summary.errors = summary.errors.saturating_add(1);
                }
            },
            BillingOutcome::Warned { amount_due, overdue } => {
                sink.notify(ClaimEvent::UpkeepWarning {
                    estate: id,
                    owner,
                    amount_due,
                    overdue,
                });
                summary.warned = summary.warned.saturating_add(1);
            }
            BillingOutcome::Expired { overdue } => match registry.unclaim(id) {
                Ok(removed) => {
                    info!(
                        estate = %id,
                        owner = %removed.owner,
                        overdue_days = overdue.num_days(),
                        "estate expired for unpaid upkeep"
                    );
                    sink.notify(ClaimEvent::EstateExpired {
                        estate: id,
                        owner: removed.owner,
                    });
                    summary.expired = summary.expired.saturating_add(1);
                }
                Err(e) => {
                    warn!(estate = %id, error = %e, "failed to expire estate");
                    summary.errors = summary.errors.saturating_add(1);
                }
            },
        }
    }
}
