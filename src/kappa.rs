//! κ (order-book liquidity) provider (Section 4.3): calibrates the
//! exponential fill-intensity parameter `λ(δ) = A · exp(-κ·δ)` from a live
//! depth book, or returns a fixed configured value.
//!
//! Reuses the OLS/standard-error/R² regression machinery this codebase has
//! carried before, but the fit itself is a single-snapshot static regression
//! over `(distance_from_mid, cumulative_resting_size)` pairs, not a
//! time-based virtual-fill simulation across many snapshots (see
//! `DESIGN.md`).

use crate::error::{CoreError, Result};
use crate::types::DepthSnapshot;
use tracing::warn;

/// Capability shared by both κ provider variants.
pub trait KappaProvider {
    /// Returns `(kappa, A)`. `depth` is ignored by the constant provider.
    fn get_kappa(&mut self, now: f64, depth: Option<&DepthSnapshot>) -> Result<(f64, f64)>;

    /// True once `K_stale` consecutive calibration failures have occurred;
    /// the gate must pull quotes while this holds (Section 4.3, 7).
    fn is_degraded(&self) -> bool {
        false
    }

    fn stale_count(&self) -> u32 {
        0
    }
}

/// Fixed `(κ, A)`, read straight from configuration (Section 3, Section 4.3).
#[derive(Debug, Clone, Copy)]
pub struct ConstantKappa {
    pub kappa: f64,
    pub arrival_rate: f64,
}

impl ConstantKappa {
    pub fn new(kappa: f64, arrival_rate: f64) -> Self {
        Self { kappa, arrival_rate }
    }
}

impl KappaProvider for ConstantKappa {
    fn get_kappa(&mut self, _now: f64, _depth: Option<&DepthSnapshot>) -> Result<(f64, f64)> {
        Ok((self.kappa, self.arrival_rate))
    }
}

/// Live, depth-calibrated κ provider. Recalibrates at most once per `τ_κ`
/// seconds; on a failed fit it keeps serving the last good value and
/// escalates to `Degraded` after `K_stale` consecutive failures.
#[derive(Debug, Clone)]
pub struct LiveKappa {
    n_levels: usize,
    tau_kappa: f64,
    k_stale_threshold: u32,
    last_good: Option<(f64, f64)>,
    last_refresh_ts: Option<f64>,
    stale_count: u32,
}

impl LiveKappa {
    pub fn new(n_levels: usize, tau_kappa: f64, k_stale_threshold: u32) -> Self {
        Self {
            n_levels: n_levels.max(1),
            tau_kappa,
            k_stale_threshold,
            last_good: None,
            last_refresh_ts: None,
            stale_count: 0,
        }
    }

    fn due(&self, now: f64) -> bool {
        match self.last_refresh_ts {
            Some(last) => now - last >= self.tau_kappa,
            None => true,
        }
    }

    /// Fit `ln(size) = ln(A) - κ·δ` over the first `n_levels` of each side,
    /// using distance-from-mid as `δ` and cumulative resting size as the
    /// dependent variable, via weighted least squares (weight = size, so
    /// deep illiquid levels don't dominate the fit).
    fn calibrate(&self, depth: &DepthSnapshot) -> Result<(f64, f64)> {
        let mid = depth
            .mid()
            .ok_or_else(|| CoreError::CalibrationError("depth snapshot has no valid mid".into()))?;

        let mut points: Vec<(f64, f64, f64)> = Vec::new(); // (delta, ln_size, weight)
        let mut cum = 0.0;
        for lvl in depth.bids.iter().take(self.n_levels) {
            cum += lvl.size;
            let delta = (mid - lvl.price).abs();
            if delta > 0.0 && cum > 0.0 {
                points.push((delta, cum.ln(), lvl.size));
            }
        }
        let mut cum = 0.0;
        for lvl in depth.asks.iter().take(self.n_levels) {
            cum += lvl.size;
            let delta = (lvl.price - mid).abs();
            if delta > 0.0 && cum > 0.0 {
                points.push((delta, cum.ln(), lvl.size));
            }
        }

        if points.len() < 3 {
            return Err(CoreError::CalibrationError(format!(
                "only {} usable depth levels, need at least 3",
                points.len()
            )));
        }

        let (kappa, a) = weighted_log_linear_fit(&points)?;
        if kappa <= 0.0 || a <= 0.0 || !kappa.is_finite() || !a.is_finite() {
            return Err(CoreError::CalibrationError(format!(
                "fitted parameters out of range: kappa={kappa}, A={a}"
            )));
        }
        Ok((kappa, a))
    }
}

impl KappaProvider for LiveKappa {
    fn get_kappa(&mut self, now: f64, depth: Option<&DepthSnapshot>) -> Result<(f64, f64)> {
        if !self.due(now) {
            if let Some(good) = self.last_good {
                return Ok(good);
            }
        }

        let depth = match depth {
            Some(d) => d,
            None => {
                return self.handle_calibration_failure(CoreError::CalibrationError(
                    "live kappa due for refresh but no depth snapshot supplied".into(),
                ));
            }
        };

        match self.calibrate(depth) {
            Ok(fit) => {
                self.last_good = Some(fit);
                self.last_refresh_ts = Some(now);
                self.stale_count = 0;
                Ok(fit)
            }
            Err(e) => self.handle_calibration_failure(e),
        }
    }

    fn is_degraded(&self) -> bool {
        self.stale_count >= self.k_stale_threshold
    }

    fn stale_count(&self) -> u32 {
        self.stale_count
    }
}

impl LiveKappa {
    fn handle_calibration_failure(&mut self, err: CoreError) -> Result<(f64, f64)> {
        self.stale_count += 1;
        if self.stale_count >= self.k_stale_threshold {
            warn!(
                stale_count = self.stale_count,
                "kappa provider degraded after repeated calibration failures"
            );
        }
        match self.last_good {
            Some(good) => Ok(good),
            None => Err(err),
        }
    }
}

/// Weighted least-squares fit of `y = beta0 + beta1 * x`, returning
/// `(kappa, A) = (-beta1, exp(beta0))`.
fn weighted_log_linear_fit(points: &[(f64, f64, f64)]) -> Result<(f64, f64)> {
    let w_sum: f64 = points.iter().map(|(_, _, w)| w).sum();
    if w_sum <= 0.0 {
        return Err(CoreError::CalibrationError("non-positive total weight in kappa fit".into()));
    }
    let x_mean = points.iter().map(|(x, _, w)| x * w).sum::<f64>() / w_sum;
    let y_mean = points.iter().map(|(_, y, w)| y * w).sum::<f64>() / w_sum;

    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y, w) in points {
        let dx = x - x_mean;
        let dy = y - y_mean;
        num += w * dx * dy;
        den += w * dx * dx;
    }

    if den.abs() < 1e-12 {
        return Err(CoreError::CalibrationError("degenerate delta distribution in kappa fit".into()));
    }

    let beta1 = num / den;
    let beta0 = y_mean - beta1 * x_mean;
    Ok((-beta1, beta0.exp()))
}
