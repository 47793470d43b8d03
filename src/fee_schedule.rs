//! Fee schedule: a pure value object mapping a fee tier to maker/taker rates
//! and deriving the minimum profitable half-spread (Section 4.1).

use crate::types::{ClampMode, FeeTier};
use std::fmt;

/// Floor every gated spread is clamped to regardless of fee-tier economics
/// (Section 4.1: "the caller MUST still clamp to MIN_SPREAD_DOLLAR").
pub const MIN_SPREAD_DOLLAR_FLOOR: f64 = 0.0;

/// Maker/taker rates (as fractions, e.g. `0.0002` = 2 bps) for one fee tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    pub tier: FeeTier,
    pub maker_bps: f64,
    pub taker_bps: f64,
}

impl fmt::Display for FeeSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} tier | maker={:.4}bps taker={:.4}bps",
            self.tier,
            self.maker_bps * 10_000.0,
            self.taker_bps * 10_000.0
        )
    }
}

impl FeeSchedule {
    /// Construct the schedule for a tier using the venue's published rates.
    pub fn for_tier(tier: FeeTier) -> Self {
        match tier {
            FeeTier::Regular => FeeSchedule {
                tier,
                maker_bps: 0.0002,
                taker_bps: 0.0006,
            },
            // Negative-rebate market-maker program: maker leg pays us, not the reverse.
            FeeTier::MarketMaker => FeeSchedule {
                tier,
                maker_bps: -0.0001,
                taker_bps: 0.0003,
            },
            FeeTier::Custom { maker_bps, taker_bps } => FeeSchedule { tier, maker_bps, taker_bps },
        }
    }

    /// Smallest half-spread such that a round trip covers the configured fee
    /// legs, clamped to `min_spread_dollar` (Section 4.1). `mode` selects
    /// whether the round trip is priced as two maker fills or one maker plus
    /// one taker fill; `TwoMaker` is the default since quotes are posted
    /// `post_only = true` (Section 6).
    pub fn min_profitable_half_spread(
        &self,
        mid: f64,
        mode: ClampMode,
        min_spread_dollar: f64,
    ) -> f64 {
        let round_trip_bps = match mode {
            ClampMode::TwoMaker => 2.0 * self.maker_bps,
            ClampMode::MakerPlusTaker => self.maker_bps + self.taker_bps,
        };
        let raw = round_trip_bps * mid / 2.0;
        raw.max(min_spread_dollar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_tier_not_viable_at_typical_bbo() {
        // S6: Regular tier at S=100000, BBO=$0.20 -> half-spread of $0.20/2
        // is far below the fee-aware floor, so it's not viable (strictly <).
        let sched = FeeSchedule::for_tier(FeeTier::Regular);
        let half = sched.min_profitable_half_spread(100_000.0, ClampMode::TwoMaker, 0.0);
        assert!(half > 0.20 / 2.0, "regular tier should require more than half the typical BBO gap");
    }

    #[test]
    fn market_maker_tier_is_viable() {
        let sched = FeeSchedule::for_tier(FeeTier::MarketMaker);
        // Negative maker rebate: raw economics would be negative/zero, clamp kicks in.
        let half = sched.min_profitable_half_spread(100_000.0, ClampMode::TwoMaker, 0.0);
        assert_eq!(half, 0.0);
    }

    #[test]
    fn custom_tier_uses_supplied_rates() {
        let sched = FeeSchedule::for_tier(FeeTier::Custom { maker_bps: 0.0004, taker_bps: 0.0008 });
        assert_eq!(sched.maker_bps, 0.0004);
        assert_eq!(sched.taker_bps, 0.0008);
        let half = sched.min_profitable_half_spread(100_000.0, ClampMode::TwoMaker, 0.0);
        assert!((half - 0.0004 * 100_000.0).abs() < 1e-9);
    }

    #[test]
    fn clamp_floor_applies_even_when_negative() {
        let sched = FeeSchedule::for_tier(FeeTier::MarketMaker);
        let half = sched.min_profitable_half_spread(100_000.0, ClampMode::TwoMaker, 0.05);
        assert_eq!(half, 0.05);
    }

    #[test]
    fn monotone_non_decreasing_in_each_fee_component() {
        // Invariant 8: monotone non-decreasing in maker/taker fee rates.
        let low = FeeSchedule { tier: FeeTier::Regular, maker_bps: 0.0001, taker_bps: 0.0004 };
        let high = FeeSchedule { tier: FeeTier::Regular, maker_bps: 0.0003, taker_bps: 0.0004 };
        assert!(
            high.min_profitable_half_spread(100_000.0, ClampMode::TwoMaker, 0.0)
                >= low.min_profitable_half_spread(100_000.0, ClampMode::TwoMaker, 0.0)
        );

        let low_taker = FeeSchedule { tier: FeeTier::Regular, maker_bps: 0.0002, taker_bps: 0.0003 };
        let high_taker = FeeSchedule { tier: FeeTier::Regular, maker_bps: 0.0002, taker_bps: 0.0006 };
        assert!(
            high_taker.min_profitable_half_spread(100_000.0, ClampMode::MakerPlusTaker, 0.0)
                >= low_taker.min_profitable_half_spread(100_000.0, ClampMode::MakerPlusTaker, 0.0)
        );
    }
}
