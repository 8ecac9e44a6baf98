//! Cost schedules for claiming and upkeep.
//!
//! All amounts are [`Decimal`] -- no floating point anywhere near money.
//! Both the one-time claim cost and the recurring upkeep follow the same
//! shape: a flat base plus a per-block rate over the region's footprint
//! area, which makes cost non-decreasing in area for any fixed schedule.

use chrono::TimeDelta;
use rust_decimal::Decimal;

/// A linear cost schedule: `base + per_block * area`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSchedule {
    /// Flat component charged regardless of size.
    pub base: Decimal,
    /// Rate per block of footprint area.
    pub per_block: Decimal,
}

impl CostSchedule {
    /// Create a schedule from its two components.
    pub const fn new(base: Decimal, per_block: Decimal) -> Self {
        Self { base, per_block }
    }

    /// The cost for a region of the given footprint area.
    ///
    /// Never negative; checked arithmetic saturates at [`Decimal::MAX`]
    /// rather than wrapping.
    pub fn cost_for(&self, area: i64) -> Decimal {
        self.per_block
            .checked_mul(Decimal::from(area.max(0)))
            .and_then(|variable| variable.checked_add(self.base))
            .unwrap_or(Decimal::MAX)
            .max(Decimal::ZERO)
    }
}

/// Configuration of the upkeep billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpkeepConfig {
    /// The upkeep cost schedule.
    pub schedule: CostSchedule,
    /// How often an estate owes upkeep.
    pub check_interval: TimeDelta,
    /// How long after a missed payment an estate survives before expiry.
    ///
    /// Expiry requires `overdue > grace_period`, strictly: an estate
    /// exactly at the boundary is warned, not removed.
    pub grace_period: TimeDelta,
}

impl Default for UpkeepConfig {
    fn default() -> Self {
        Self {
            schedule: CostSchedule::new(Decimal::from(100), Decimal::new(5, 1)),
            check_interval: TimeDelta::hours(24),
            grace_period: TimeDelta::days(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn cost_matches_schedule() {
        let schedule = CostSchedule::new(dec!(100), dec!(0.5));
        // 11 x 11 footprint.
        assert_eq!(schedule.cost_for(121), dec!(160.5));
        assert_eq!(schedule.cost_for(0), dec!(100));
    }

    #[test]
    fn cost_is_monotone_in_area() {
        let schedule = CostSchedule::new(dec!(100), dec!(0.5));
        let mut previous = Decimal::MIN;
        for area in [0_i64, 1, 9, 121, 1_024, 65_536, 1_000_000] {
            let cost = schedule.cost_for(area);
            assert!(cost >= previous);
            previous = cost;
        }
    }

    #[test]
    fn negative_area_is_clamped() {
        let schedule = CostSchedule::new(dec!(100), dec!(0.5));
        assert_eq!(schedule.cost_for(-50), dec!(100));
    }

    #[test]
    fn free_schedule_costs_nothing() {
        let schedule = CostSchedule::new(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(schedule.cost_for(1_000_000), Decimal::ZERO);
    }

    #[test]
    fn cost_never_goes_negative() {
        let schedule = CostSchedule::new(dec!(-100), Decimal::ZERO);
        assert_eq!(schedule.cost_for(10), Decimal::ZERO);
    }
}
