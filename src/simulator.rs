//! Tick simulator (Section 4.7): synthesizes a deterministic intra-candle
//! tick path from OHLCV data and evaluates queue-position-aware fills
//! against resting quotes.
//!
//! Candle-to-tick synthesis has no live-trading counterpart; the seeded-jitter
//! and deterministic-replay discipline follows the crate's general "no
//! wall-clock, no OS randomness in core logic" posture.

use crate::fee_schedule::FeeSchedule;
use crate::types::{Candle, Fill, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One synthesized intra-candle price/volume observation.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub price: f64,
    pub volume: f64,
}

/// Reconstruct `n_ticks` synthetic ticks from a single candle (Section 4.7).
/// Bullish candles (`close >= open`) walk `open -> low -> high -> close`;
/// bearish candles walk `open -> high -> low -> close`. This is the
/// well-known OHLCV reconstruction heuristic, not a claim about the true
/// intra-candle path.
pub fn synthesize_ticks(candle: &Candle, n_ticks: usize, seed: u64) -> Vec<Tick> {
    let n_ticks = n_ticks.max(4);
    let (p2, p3) = if candle.is_bullish() {
        (candle.low, candle.high)
    } else {
        (candle.high, candle.low)
    };
    let path = [candle.open, p2, p3, candle.close];

    let steps_total = n_ticks - 1;
    let segments = 3;
    let base_steps = steps_total / segments;
    let extra = steps_total % segments;

    let mut rng = StdRng::seed_from_u64(seed ^ candle.ts.to_bits());
    let jitter_scale = (candle.high - candle.low).abs() * 0.0005;
    let lo = candle.low.min(candle.high);
    let hi = candle.low.max(candle.high);

    let mut prices = Vec::with_capacity(n_ticks);
    prices.push(candle.open);
    for seg in 0..segments {
        let steps = base_steps + if seg < extra { 1 } else { 0 };
        let start = path[seg];
        let end = path[seg + 1];
        for s in 1..=steps {
            let frac = s as f64 / steps as f64;
            let mut price = start + (end - start) * frac;
            if jitter_scale > 0.0 {
                let jitter = rng.random_range(-jitter_scale..=jitter_scale);
                price = (price + jitter).clamp(lo, hi);
            }
            prices.push(price);
        }
    }
    if let Some(last) = prices.last_mut() {
        *last = candle.close;
    }

    let n = prices.len();
    let per_tick = candle.volume / n as f64;
    let mut volumes = vec![per_tick; n];
    let distributed: f64 = volumes.iter().take(n - 1).sum();
    if let Some(last) = volumes.last_mut() {
        *last = candle.volume - distributed;
    }

    prices
        .into_iter()
        .zip(volumes)
        .map(|(price, volume)| Tick { price, volume })
        .collect()
}

/// A resting order evaluated by the simulator (Section 4.7 fill model).
#[derive(Debug, Clone, Copy)]
pub struct SimOrder {
    pub price: f64,
    pub size: f64,
    /// Base units resting ahead of this order in the queue at placement time.
    pub queue: f64,
}

impl SimOrder {
    /// `Q = α · depth_at_touch` (Section 4.7, α default 0.5).
    pub fn with_calibrated_queue(price: f64, size: f64, depth_at_touch: f64, alpha: f64) -> Self {
        Self { price, size, queue: (alpha * depth_at_touch).max(0.0) }
    }
}

/// Evaluate fills for up to one resting bid and one resting ask across a
/// candle's synthesized ticks. Both sides are checked independently; when
/// both fill on the same tick, the buy fill is ordered first (Section 4.7).
pub fn simulate_candle(
    candle: &Candle,
    ticks: &[Tick],
    mut bid: Option<SimOrder>,
    mut ask: Option<SimOrder>,
) -> Vec<Fill> {
    let mut fills = Vec::new();
    for (i, tick) in ticks.iter().enumerate() {
        let ts = candle.ts + i as f64 * 1e-6;

        if let Some(order) = bid.as_mut() {
            if tick.price <= order.price {
                if order.queue > 0.0 {
                    order.queue = (order.queue - tick.volume).max(0.0);
                }
                if order.queue <= 0.0 {
                    fills.push(Fill {
                        ts,
                        side: Side::Buy,
                        price: order.price,
                        size: order.size,
                        order_id: "sim-bid".into(),
                        is_maker: true,
                    });
                    bid = None;
                }
            }
        }

        if let Some(order) = ask.as_mut() {
            if tick.price >= order.price {
                if order.queue > 0.0 {
                    order.queue = (order.queue - tick.volume).max(0.0);
                }
                if order.queue <= 0.0 {
                    fills.push(Fill {
                        ts,
                        side: Side::Sell,
                        price: order.price,
                        size: order.size,
                        order_id: "sim-ask".into(),
                        is_maker: true,
                    });
                    ask = None;
                }
            }
        }

        if bid.is_none() && ask.is_none() {
            break;
        }
    }
    fills
}

/// Maker fee owed on a single fill, per the configured schedule
/// (Section 4.7: "maker rate applied on every simulated fill").
pub fn maker_fee(fill: &Fill, schedule: &FeeSchedule) -> f64 {
    schedule.maker_bps * fill.price * fill.size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeeTier;

    fn bullish_candle() -> Candle {
        Candle { ts: 1000.0, open: 100.0, high: 105.0, low: 98.0, close: 103.0, volume: 50.0 }
    }

    fn bearish_candle() -> Candle {
        Candle { ts: 1000.0, open: 103.0, high: 105.0, low: 98.0, close: 100.0, volume: 50.0 }
    }

    #[test]
    fn first_and_last_tick_match_open_and_close() {
        let candle = bullish_candle();
        let ticks = synthesize_ticks(&candle, 20, 42);
        assert_eq!(ticks.first().unwrap().price, candle.open);
        assert_eq!(ticks.last().unwrap().price, candle.close);
    }

    #[test]
    fn all_ticks_stay_within_high_low_bounds() {
        for candle in [bullish_candle(), bearish_candle()] {
            let ticks = synthesize_ticks(&candle, 37, 7);
            for t in &ticks {
                assert!(t.price >= candle.low - 1e-9 && t.price <= candle.high + 1e-9);
            }
        }
    }

    #[test]
    fn volume_sums_exactly_to_candle_volume() {
        let candle = bullish_candle();
        let ticks = synthesize_ticks(&candle, 31, 99);
        let total: f64 = ticks.iter().map(|t| t.volume).sum();
        assert!((total - candle.volume).abs() < 1e-9);
    }

    #[test]
    fn same_seed_and_candle_produce_identical_ticks() {
        let candle = bullish_candle();
        let a = synthesize_ticks(&candle, 50, 123);
        let b = synthesize_ticks(&candle, 50, 123);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.price.to_bits(), y.price.to_bits());
            assert_eq!(x.volume.to_bits(), y.volume.to_bits());
        }
    }

    #[test]
    fn zero_queue_depth_fills_on_first_crossing_tick() {
        let candle = bullish_candle();
        let ticks = synthesize_ticks(&candle, 20, 1);
        let bid = SimOrder { price: 99.0, size: 1.0, queue: 0.0 };
        let fills = simulate_candle(&candle, &ticks, Some(bid), None);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].side, Side::Buy);
        assert_eq!(fills[0].price, 99.0);
    }

    #[test]
    fn large_queue_depth_requires_volume_to_clear_before_filling() {
        let candle = bullish_candle();
        let ticks = synthesize_ticks(&candle, 20, 1);
        let huge_queue = candle.volume * 1000.0;
        let bid = SimOrder { price: 99.0, size: 1.0, queue: huge_queue };
        let fills = simulate_candle(&candle, &ticks, Some(bid), None);
        assert!(fills.is_empty(), "queue far exceeding total candle volume must not clear");
    }

    #[test]
    fn buy_ordered_before_sell_on_same_tick() {
        let candle = bullish_candle();
        let ticks = synthesize_ticks(&candle, 20, 1);
        let bid = SimOrder { price: 104.0, size: 1.0, queue: 0.0 }; // crosses almost immediately
        let ask = SimOrder { price: 98.5, size: 1.0, queue: 0.0 };
        let fills = simulate_candle(&candle, &ticks, Some(bid), Some(ask));
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].side, Side::Buy);
        assert_eq!(fills[1].side, Side::Sell);
    }

    #[test]
    fn maker_fee_scales_with_price_and_size() {
        let schedule = FeeSchedule::for_tier(FeeTier::Regular);
        let fill = Fill { ts: 0.0, side: Side::Buy, price: 100.0, size: 2.0, order_id: "x".into(), is_maker: true };
        let fee = maker_fee(&fill, &schedule);
        assert!((fee - schedule.maker_bps * 200.0).abs() < 1e-9);
    }
}
