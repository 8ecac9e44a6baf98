//! Upkeep billing for the Freehold claim engine.
//!
//! Estates owe a recurring upkeep cost (flat base plus a per-block rate
//! over the footprint area). This crate owns the cost schedules, the
//! currency-backend contract, and the sweep that assesses every estate:
//! charge on success, warn while inside the grace period, and expire the
//! claim once the grace period has strictly elapsed.
//!
//! Server-owned estates are administrative and never billed.

pub mod cost;
pub mod economy;
pub mod sweep;

pub use cost::{CostSchedule, UpkeepConfig};
pub use economy::{Economy, InMemoryEconomy};
pub use sweep::{BillingEngine, BillingOutcome, SweepSummary};
