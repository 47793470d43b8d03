//! Risk/safety gate (Section 4.5): sequentially applies tick-jump filtering,
//! displacement widening, regime filtering, inventory skew, hard-limit
//! withdrawal, spread clamping, fill-imbalance cooldown and the liquidation
//! guard to a raw `(bid, ask)` pair. Step ordering is load-bearing — later
//! steps see the output of earlier ones.
//!
//! Built in this crate's usual module/error-propagation idiom (`Result<_,
//! CoreError>`, `tracing::warn!` on each guard trip).

use crate::error::{CoreError, Result};
use crate::types::{Regime, Side};
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    pub tick_jump_pct: f64,
    pub displacement_pct: f64,
    pub tau_displacement_sec: f64,
    pub displacement_widen_mult: f64,
    pub regime_filter_enabled: bool,
    pub inventory_soft: f64,
    pub inventory_hard: f64,
    pub min_spread_dollar: f64,
    pub max_spread_dollar: f64,
    pub n_imbalance: usize,
    pub imbalance_threshold: f64,
    pub tau_imbalance_sec: f64,
    pub liq_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            tick_jump_pct: 0.02,
            displacement_pct: 0.005,
            tau_displacement_sec: 30.0,
            displacement_widen_mult: 2.0,
            regime_filter_enabled: true,
            inventory_soft: 1.0,
            inventory_hard: 2.0,
            min_spread_dollar: 0.01,
            max_spread_dollar: 1000.0,
            n_imbalance: 20,
            imbalance_threshold: 0.8,
            tau_imbalance_sec: 60.0,
            liq_threshold: 0.20,
        }
    }
}

/// Mutable guard state owned exclusively by the gate (Section 3, Section 5).
#[derive(Debug, Clone, Default)]
pub struct GateState {
    pub displacement_cooldown_until: Option<f64>,
    pub imbalance_cooldown_until: Option<f64>,
    pub imbalance_favored_side: Option<Side>,
    pub last_quote_mid: Option<f64>,
    recent_fills: VecDeque<Side>,
}

impl GateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a confirmed fill into the imbalance tracker (Section 4.8 step 6).
    pub fn record_fill(&mut self, side: Side, n_imbalance: usize) {
        if self.recent_fills.len() == n_imbalance.max(1) {
            self.recent_fills.pop_front();
        }
        self.recent_fills.push_back(side);
    }

    fn imbalance_fraction(&self, side: Side) -> Option<f64> {
        if self.recent_fills.is_empty() {
            return None;
        }
        let count = self.recent_fills.iter().filter(|&&s| s == side).count();
        Some(count as f64 / self.recent_fills.len() as f64)
    }
}

/// A single side's gated quote: price plus whether it must be reduce-only
/// (Section 4.5 step 8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidedQuote {
    pub price: f64,
    pub reduce_only: bool,
}

/// Outcome of running the gate on one epoch's raw quotes.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Neither side may quote this epoch.
    Withdraw { reason: String },
    /// Per-side outcome; `None` means that side is withdrawn while the
    /// other may still quote (hard limit / liquidation guard).
    Quote {
        bid: Option<SidedQuote>,
        ask: Option<SidedQuote>,
    },
}

/// Everything the gate needs to know about the current epoch beyond the
/// raw quoter output (Section 4.5).
#[derive(Debug, Clone, Copy)]
pub struct GateInputs {
    pub now: f64,
    pub mid: f64,
    pub inventory: f64,
    pub regime: Regime,
    pub reservation_price: f64,
    pub bid_raw: f64,
    pub ask_raw: f64,
    pub min_profitable_half_spread: f64,
    pub is_futures: bool,
    /// `distance_to_liquidation / S`, `None` for spot / no position.
    pub liquidation_distance_pct: Option<f64>,
}

/// Step 1 (Section 4.5): outlier tick filter. Run *before* the volatility
/// estimator is updated and before [`apply`] — a rejected tick means the
/// whole epoch is skipped, not just the gate.
pub fn check_tick_jump(prev_mid: Option<f64>, mid: f64, cfg: &GateConfig) -> Result<()> {
    if let Some(prev) = prev_mid {
        if prev > 0.0 {
            let jump = (mid - prev).abs() / prev;
            if jump > cfg.tick_jump_pct {
                return Err(CoreError::StaleTick(format!(
                    "tick jump {:.4}% exceeds {:.4}%",
                    jump * 100.0,
                    cfg.tick_jump_pct * 100.0
                )));
            }
        }
    }
    Ok(())
}

/// Steps 2-8 (Section 4.5). Call only after [`check_tick_jump`] passed.
pub fn apply(state: &mut GateState, cfg: &GateConfig, input: GateInputs) -> GateOutcome {
    let mut bid = input.bid_raw;
    let mut ask = input.ask_raw;

    // Step 2: displacement guard. Pure widening, not a withdraw.
    if let Some(last_mid) = state.last_quote_mid {
        if last_mid > 0.0 && (input.mid - last_mid).abs() / last_mid > cfg.displacement_pct {
            state.displacement_cooldown_until = Some(input.now + cfg.tau_displacement_sec);
        }
    }
    let displacement_active = state
        .displacement_cooldown_until
        .map(|until| input.now < until)
        .unwrap_or(false);
    if displacement_active {
        let half = input.reservation_price - bid;
        let widened_half = half * cfg.displacement_widen_mult;
        bid = input.reservation_price - widened_half;
        let half_ask = ask - input.reservation_price;
        ask = input.reservation_price + half_ask * cfg.displacement_widen_mult;
        warn!("displacement guard active: widening spread by {}x", cfg.displacement_widen_mult);
    }

    // Step 3: regime filter.
    if cfg.regime_filter_enabled && input.regime == Regime::Trending {
        return GateOutcome::Withdraw { reason: "regime filter: TRENDING".into() };
    }

    // Step 4: inventory skew. u in [-1, 1]; widen the side that would push
    // |q| further out, narrow the side that would reduce it.
    let u = (input.inventory / cfg.inventory_soft).clamp(-1.0, 1.0);
    let r = input.reservation_price;
    let half_spread = (ask - r).max(r - bid).max((ask - bid) / 2.0);
    let bid_mult = 0.5 * (1.0 + u);
    let ask_mult = 0.5 * (1.0 - u);
    bid = r - 2.0 * half_spread * bid_mult;
    ask = r + 2.0 * half_spread * ask_mult;

    // Step 5: hard inventory limit.
    let mut bid_withdrawn = false;
    let mut ask_withdrawn = false;
    if cfg.inventory_hard <= 0.0 && input.inventory == 0.0 {
        bid_withdrawn = true;
        ask_withdrawn = true;
    } else if input.inventory >= cfg.inventory_hard {
        bid_withdrawn = true; // further buys would increase |q|
    } else if input.inventory <= -cfg.inventory_hard {
        ask_withdrawn = true; // further sells would increase |q|
    }
    if bid_withdrawn && ask_withdrawn {
        return GateOutcome::Withdraw { reason: "hard inventory limit breached on both sides".into() };
    }

    // Step 6: spread clamp.
    let floor = cfg.min_spread_dollar.max(2.0 * input.min_profitable_half_spread);
    let mut spread = ask - bid;
    if spread < floor {
        let mid_of_quotes = (ask + bid) / 2.0;
        bid = mid_of_quotes - floor / 2.0;
        ask = mid_of_quotes + floor / 2.0;
        spread = floor;
    }
    if spread > cfg.max_spread_dollar {
        let mid_of_quotes = (ask + bid) / 2.0;
        bid = mid_of_quotes - cfg.max_spread_dollar / 2.0;
        ask = mid_of_quotes + cfg.max_spread_dollar / 2.0;
    }
    if bid >= ask {
        return GateOutcome::Withdraw { reason: "spread clamp inverted bid/ask".into() };
    }

    // Step 7: fill-imbalance cooldown.
    if let Some(frac_buy) = state.imbalance_fraction(Side::Buy) {
        let (dominant, dominant_frac) = if frac_buy >= 0.5 {
            (Side::Buy, frac_buy)
        } else {
            (Side::Sell, 1.0 - frac_buy)
        };
        if dominant_frac >= cfg.imbalance_threshold {
            state.imbalance_cooldown_until = Some(input.now + cfg.tau_imbalance_sec);
            state.imbalance_favored_side = Some(dominant.opposite());
        }
    }
    let imbalance_active = state
        .imbalance_cooldown_until
        .map(|until| input.now < until)
        .unwrap_or(false);
    if imbalance_active {
        if let Some(allowed) = state.imbalance_favored_side {
            match allowed {
                Side::Buy => ask_withdrawn = true,
                Side::Sell => bid_withdrawn = true,
            }
            warn!(side = %allowed, "fill-imbalance cooldown active: only under-filled side may quote");
        }
    }

    // Step 8: liquidation guard (futures only).
    let mut bid_reduce_only = false;
    let mut ask_reduce_only = false;
    if input.is_futures {
        if let Some(dist_pct) = input.liquidation_distance_pct {
            if dist_pct < cfg.liq_threshold {
                if input.inventory > 0.0 {
                    // Long near liquidation: close by selling, reduce-only.
                    ask = input.mid + cfg.min_spread_dollar;
                    ask_reduce_only = true;
                    bid_withdrawn = true;
                } else if input.inventory < 0.0 {
                    bid = input.mid - cfg.min_spread_dollar;
                    bid_reduce_only = true;
                    ask_withdrawn = true;
                }
                warn!(distance_pct = dist_pct, "liquidation guard armed");
            }
        }
    }

    if bid_withdrawn && ask_withdrawn {
        return GateOutcome::Withdraw { reason: "both sides withdrawn after guards".into() };
    }

    state.last_quote_mid = Some(input.mid);

    GateOutcome::Quote {
        bid: if bid_withdrawn {
            None
        } else {
            Some(SidedQuote { price: bid, reduce_only: bid_reduce_only })
        },
        ask: if ask_withdrawn {
            None
        } else {
            Some(SidedQuote { price: ask, reduce_only: ask_reduce_only })
        },
    }
}
