//! Rolling-window volatility estimator (Section 4.2): maintains the last `W`
//! log-returns and exposes `sigma_pct`/`sigma_dollar`. Below `W` samples, a
//! configured bootstrap floor is returned instead of zero or NaN.

use std::collections::VecDeque;

/// Never let the bootstrap or the ring-buffer estimate collapse to zero —
/// a zero sigma would make the GLFT half-spread degenerate to the pure
/// liquidity term with no risk buffer at all.
const MIN_SIGMA_PCT: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct VolatilityEstimator {
    window: usize,
    returns: VecDeque<f64>,
    last_mid: Option<f64>,
    bootstrap_sigma_pct: f64,
}

impl VolatilityEstimator {
    /// `window` is `W` from Section 3 (typical 20-100); `bootstrap_sigma_pct`
    /// is returned until `W` samples have accumulated.
    pub fn new(window: usize, bootstrap_sigma_pct: f64) -> Self {
        Self {
            window: window.max(1),
            returns: VecDeque::with_capacity(window.max(1)),
            last_mid: None,
            bootstrap_sigma_pct: bootstrap_sigma_pct.max(MIN_SIGMA_PCT),
        }
    }

    /// Feed the next mid-price observation. No-op on the very first call
    /// (nothing to compute a return against yet).
    pub fn observe(&mut self, mid: f64) {
        if let Some(prev) = self.last_mid {
            if prev > 0.0 && mid > 0.0 {
                let r = (mid / prev).ln();
                if self.returns.len() == self.window {
                    self.returns.pop_front();
                }
                self.returns.push_back(r);
            }
        }
        self.last_mid = Some(mid);
    }

    pub fn sample_count(&self) -> usize {
        self.returns.len()
    }

    pub fn has_full_window(&self) -> bool {
        self.returns.len() >= self.window
    }

    /// Sample standard deviation of log-returns, in fractional (percent) units.
    pub fn sigma_pct(&self) -> f64 {
        if self.returns.len() < self.window || self.returns.len() < 2 {
            return self.bootstrap_sigma_pct;
        }
        let n = self.returns.len() as f64;
        let mean = self.returns.iter().sum::<f64>() / n;
        let variance = self.returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt().max(MIN_SIGMA_PCT)
    }

    /// σ scaled into dollar units around the current mid (Section 3:
    /// `σ_dollar = σ_pct · S_t`).
    pub fn sigma_dollar(&self, mid: f64) -> f64 {
        self.sigma_pct() * mid
    }
}
