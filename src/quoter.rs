//! GLFT quoter (Section 4.4): converts `(mid, inventory, volatility, κ, A)`
//! into a reservation price and half-spread under the Guéant-Lehalle-
//! Fernandez-Tapia infinite-horizon extension of Avellaneda-Stoikov.
//!
//! Struct/Display shape follows the style of `SpreadCalculation`/
//! `compute_spread_for_gamma` elsewhere in this codebase's history, but the
//! formula here is the GLFT infinite-horizon closed form rather than a
//! finite-horizon Avellaneda-Stoikov term.

use crate::error::{CoreError, Result};
use std::fmt;

const EULER: f64 = std::f64::consts::E;

/// Above this ratio of κ/γ, `ln(1 + κ/γ)` is computed in log-space to avoid
/// losing precision to catastrophic cancellation (Section 4.4 "Numerical").
const LOG_SPACE_THRESHOLD: f64 = 1e6;

/// A single GLFT quote computation.
#[derive(Debug, Clone, Copy)]
pub struct GlftQuote {
    pub mid: f64,
    pub inventory: f64,
    pub reservation_price: f64,
    pub half_spread: f64,
    pub bid_raw: f64,
    pub ask_raw: f64,
}

impl fmt::Display for GlftQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q={:+.4} | r=${:.4} | δ=${:.4} | bid=${:.4} | ask=${:.4}",
            self.inventory, self.reservation_price, self.half_spread, self.bid_raw, self.ask_raw
        )
    }
}

/// Tagged model variant (Section 9 design note: new variants without
/// changing callers). Only GLFT is implemented; `AsFinite` is reserved for
/// a future finite-horizon Avellaneda-Stoikov counterpart.
pub enum QuoteModel {
    Glft,
}

/// `quote(S, q, σ_dollar, κ, A) → (bid_raw, ask_raw, r, δ)` (Section 4.4).
pub fn quote(
    model: QuoteModel,
    mid: f64,
    inventory: f64,
    sigma_dollar: f64,
    kappa: f64,
    gamma: f64,
    arrival_rate: f64,
) -> Result<GlftQuote> {
    match model {
        QuoteModel::Glft => quote_glft(mid, inventory, sigma_dollar, kappa, gamma, arrival_rate),
    }
}

fn quote_glft(
    mid: f64,
    inventory: f64,
    sigma_dollar: f64,
    kappa: f64,
    gamma: f64,
    arrival_rate: f64,
) -> Result<GlftQuote> {
    if kappa <= 0.0 {
        return Err(CoreError::InvalidParameters(format!("kappa must be > 0, got {kappa}")));
    }
    if gamma <= 0.0 {
        return Err(CoreError::InvalidParameters(format!("gamma must be > 0, got {gamma}")));
    }
    if sigma_dollar < 0.0 {
        return Err(CoreError::InvalidParameters(format!(
            "sigma_dollar must be >= 0, got {sigma_dollar}"
        )));
    }
    if arrival_rate <= 0.0 {
        return Err(CoreError::InvalidParameters(format!(
            "arrival_rate must be > 0, got {arrival_rate}"
        )));
    }

    // r = S - q * γ * σ_dollar²  (q=0 -> r=S, no skew).
    let reservation_price = mid - inventory * gamma * sigma_dollar.powi(2);

    let ratio = kappa / gamma;
    let liquidity_term = if ratio > LOG_SPACE_THRESHOLD {
        // ln(1+x) ≈ ln(x) for x >> 1; avoids ln(1+huge) rounding to ln(huge) anyway
        // but keeps the computation explicit about the approximation taken.
        ratio.ln() / kappa
    } else {
        (1.0 + ratio).ln() / kappa
    };

    let risk_term_arg = EULER * sigma_dollar.powi(2) * gamma / (2.0 * arrival_rate * kappa);
    if !risk_term_arg.is_finite() {
        return Ok(GlftQuote {
            mid,
            inventory,
            reservation_price,
            half_spread: f64::INFINITY,
            bid_raw: f64::NEG_INFINITY,
            ask_raw: f64::INFINITY,
        });
    }
    let risk_term = risk_term_arg.sqrt();

    let half_spread = liquidity_term + risk_term;
    if !half_spread.is_finite() {
        return Ok(GlftQuote {
            mid,
            inventory,
            reservation_price,
            half_spread: f64::INFINITY,
            bid_raw: f64::NEG_INFINITY,
            ask_raw: f64::INFINITY,
        });
    }

    Ok(GlftQuote {
        mid,
        inventory,
        reservation_price,
        half_spread,
        bid_raw: reservation_price - half_spread / 2.0,
        ask_raw: reservation_price + half_spread / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(mid: f64, inv: f64, sigma: f64, kappa: f64, gamma: f64, a: f64) -> GlftQuote {
        quote(QuoteModel::Glft, mid, inv, sigma, kappa, gamma, a).unwrap()
    }

    #[test]
    fn test_reservation_price_neutral_inventory() {
        // S=100000, q=0, γ=0.01, κ=1.0, A=50, σ_pct=0.01 -> σ_dollar=1000.
        // Neutral inventory: reservation price collapses to mid, and the
        // liquidity term (1/κ)·ln(1+κ/γ) = ln(101) ≈ 4.615 must be present
        // in the half-spread regardless of how large the risk term is.
        let out = q(100_000.0, 0.0, 1000.0, 1.0, 0.01, 50.0);
        assert!((out.reservation_price - 100_000.0).abs() < 1e-9);
        assert!(out.half_spread >= 4.615 - 1e-3);
        assert!(out.bid_raw < out.reservation_price);
        assert!(out.ask_raw > out.reservation_price);
        assert!((out.ask_raw - out.reservation_price - (out.reservation_price - out.bid_raw)).abs() < 1e-9);
    }

    #[test]
    fn test_long_inventory_shifts_reservation_down() {
        let neutral = q(100_000.0, 0.0, 1000.0, 1.0, 0.01, 50.0);
        let long = q(100_000.0, 0.1, 1000.0, 1.0, 0.01, 50.0);
        assert!(long.reservation_price < neutral.reservation_price);
        assert!(long.bid_raw < neutral.bid_raw);
        assert!(long.ask_raw < neutral.ask_raw);
    }

    #[test]
    fn test_reservation_price_sign_matches_inventory_sign() {
        // For all q, if γ·σ²·q > 0 then r < S iff q > 0.
        let sigma = 500.0;
        let gamma = 0.02;
        for &inv in &[-2.0, -0.5, 0.5, 2.0] {
            let out = q(50_000.0, inv, sigma, 2.0, gamma, 20.0);
            if gamma * sigma.powi(2) * inv > 0.0 {
                assert_eq!(out.reservation_price < 50_000.0, inv > 0.0);
            }
        }
    }

    #[test]
    fn test_half_spread_monotone_in_sigma_and_gamma() {
        let base = q(10_000.0, 0.0, 50.0, 1.5, 0.05, 30.0);
        assert!(base.half_spread > 0.0);
        assert!(base.half_spread.is_finite());

        let higher_sigma = q(10_000.0, 0.0, 100.0, 1.5, 0.05, 30.0);
        assert!(higher_sigma.half_spread >= base.half_spread);

        let higher_gamma = q(10_000.0, 0.0, 50.0, 1.5, 0.1, 30.0);
        assert!(higher_gamma.half_spread >= base.half_spread);
    }

    #[test]
    fn rejects_non_positive_kappa_or_gamma() {
        assert!(matches!(
            quote(QuoteModel::Glft, 100.0, 0.0, 1.0, 0.0, 0.01, 10.0),
            Err(CoreError::InvalidParameters(_))
        ));
        assert!(matches!(
            quote(QuoteModel::Glft, 100.0, 0.0, 1.0, 1.0, 0.0, 10.0),
            Err(CoreError::InvalidParameters(_))
        ));
    }

    #[test]
    fn log_space_branch_stays_finite_for_huge_kappa_over_gamma() {
        let out = q(100.0, 0.0, 1.0, 1e9, 1e-6, 10.0);
        assert!(out.half_spread.is_finite());
        assert!(out.half_spread > 0.0);
    }
}
