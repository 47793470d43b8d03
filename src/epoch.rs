//! Epoch driver (Section 4.8, Section 9): owns every piece of mutable
//! strategy state and runs the six-step per-epoch pipeline. Strategy state
//! lives in one owned value threaded through by the caller instead of an
//! `Arc<RwLock<_>>` — no locks needed under the single-threaded cooperative
//! scheduling model (Section 5).

use crate::config::{EngineConfig, KappaMode};
use crate::error::{CoreError, Result};
use crate::fee_schedule::FeeSchedule;
use crate::gate::{self, GateConfig, GateInputs, GateOutcome, GateState};
use crate::kappa::{ConstantKappa, KappaProvider, LiveKappa};
use crate::order_manager::{OrderAction, OrderManager, SideTargets};
use crate::quoter::{self, QuoteModel};
use crate::types::{DepthSnapshot, Fill, Regime, Side};
use crate::volatility::VolatilityEstimator;
use tracing::{info, warn};

fn build_gate_config(cfg: &EngineConfig) -> GateConfig {
    GateConfig {
        tick_jump_pct: cfg.tick_jump_pct,
        displacement_pct: cfg.displacement_pct,
        tau_displacement_sec: cfg.tau_displacement_sec,
        displacement_widen_mult: cfg.displacement_widen_mult,
        regime_filter_enabled: cfg.regime_filter,
        inventory_soft: cfg.inventory_soft,
        inventory_hard: cfg.inventory_hard,
        min_spread_dollar: cfg.min_spread_dollar,
        max_spread_dollar: cfg.max_spread_dollar,
        n_imbalance: cfg.n_imbalance,
        imbalance_threshold: cfg.imbalance_threshold,
        tau_imbalance_sec: cfg.tau_imbalance_sec,
        liq_threshold: cfg.liq_threshold,
    }
}

fn build_kappa_provider(cfg: &EngineConfig) -> Box<dyn KappaProvider> {
    match cfg.kappa_mode {
        KappaMode::Constant => Box::new(ConstantKappa::new(cfg.kappa_value, cfg.arrival_rate)),
        KappaMode::Live => Box::new(LiveKappa::new(cfg.kappa_levels, cfg.tau_kappa_sec, cfg.k_stale_threshold)),
    }
}

/// Everything one epoch needs beyond the engine's own state: the external
/// world's view of this instant (Section 3 "Regime state", "Depth
/// snapshot").
#[derive(Debug, Clone, Default)]
pub struct EpochInputs<'a> {
    pub now: f64,
    pub mid: f64,
    pub depth: Option<&'a DepthSnapshot>,
    pub regime: Regime,
    pub liquidation_distance_pct: Option<f64>,
}

pub struct EpochContext {
    config: EngineConfig,
    vol: VolatilityEstimator,
    kappa: Box<dyn KappaProvider>,
    gate_config: GateConfig,
    gate_state: GateState,
    order_manager: OrderManager,
    fee_schedule: FeeSchedule,
    inventory: f64,
    cash: f64,
    avg_entry_price: f64,
    realized_pnl: f64,
    last_mid: Option<f64>,
}

impl EpochContext {
    pub fn new(config: EngineConfig) -> Self {
        let gate_config = build_gate_config(&config);
        let kappa = build_kappa_provider(&config);
        let fee_schedule = FeeSchedule::for_tier(config.fee_tier);
        let order_manager = OrderManager::new(
            config.tick_size,
            config.replace_threshold,
            config.tau_ack_sec,
            config.supports_amend,
        );
        let vol = VolatilityEstimator::new(config.vol_window, config.bootstrap_sigma_pct);
        Self {
            config,
            vol,
            kappa,
            gate_config,
            gate_state: GateState::new(),
            order_manager,
            fee_schedule,
            inventory: 0.0,
            cash: 0.0,
            avg_entry_price: 0.0,
            realized_pnl: 0.0,
            last_mid: None,
        }
    }

    pub fn inventory(&self) -> f64 {
        self.inventory
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Closed-position PnL accumulated under a weighted-average-cost basis
    /// (Section 3a equity curve column `realized_pnl`).
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Mark-to-market PnL on the open position against `mid` (Section 3a
    /// equity curve column `unrealized_pnl`). Zero when flat.
    pub fn unrealized_pnl(&self, mid: f64) -> f64 {
        if self.inventory > 0.0 {
            self.inventory * (mid - self.avg_entry_price)
        } else if self.inventory < 0.0 {
            self.inventory.abs() * (self.avg_entry_price - mid)
        } else {
            0.0
        }
    }

    pub fn order_manager_mut(&mut self) -> &mut OrderManager {
        &mut self.order_manager
    }

    /// Record a confirmed fill (Section 3 "After any fill, q and X are
    /// updated atomically before the next epoch runs"; Section 4.5 step 7
    /// feeds the same fill into the imbalance tracker). Also maintains the
    /// weighted-average entry price so realized/unrealized PnL can be
    /// reported on the equity curve (Section 3a).
    pub fn on_fill(&mut self, fill: &Fill) {
        let notional = fill.price * fill.size;
        let fee = notional * self.fee_schedule.maker_bps;
        let signed_size = fill.side.sign() * fill.size;
        let prior_inventory = self.inventory;

        if prior_inventory == 0.0 || prior_inventory.signum() == signed_size.signum() {
            let new_inventory = prior_inventory + signed_size;
            self.avg_entry_price =
                (self.avg_entry_price * prior_inventory.abs() + fill.price * fill.size) / new_inventory.abs();
            self.inventory = new_inventory;
        } else {
            let closing_size = fill.size.min(prior_inventory.abs());
            let pnl_per_unit = if prior_inventory > 0.0 {
                fill.price - self.avg_entry_price
            } else {
                self.avg_entry_price - fill.price
            };
            self.realized_pnl += pnl_per_unit * closing_size;

            let new_inventory = prior_inventory + signed_size;
            self.inventory = new_inventory;
            if new_inventory != 0.0 && new_inventory.signum() != prior_inventory.signum() {
                self.avg_entry_price = fill.price;
            }
        }

        match fill.side {
            Side::Buy => self.cash -= notional + fee,
            Side::Sell => self.cash += notional - fee,
        }
        self.gate_state.record_fill(fill.side, self.config.n_imbalance);
    }

    /// Run one full epoch (Section 4.8 steps 1-5; step 6 is [`EpochContext::on_fill`],
    /// driven by the caller as fills arrive). Returns the order-manager
    /// actions to hand to the adapter.
    pub fn step(&mut self, inputs: EpochInputs<'_>) -> Result<Vec<OrderAction>> {
        // Step 1: tick filter runs before the vol estimator is touched.
        gate::check_tick_jump(self.last_mid, inputs.mid, &self.gate_config)?;
        self.last_mid = Some(inputs.mid);
        self.vol.observe(inputs.mid);
        let sigma_dollar = self.vol.sigma_dollar(inputs.mid);

        // Step 2: refresh κ/A if due.
        let (kappa, arrival_rate) = self.kappa.get_kappa(inputs.now, inputs.depth)?;
        if self.kappa.is_degraded() {
            return Err(CoreError::GateHalt(format!(
                "kappa provider degraded after {} consecutive calibration failures",
                self.kappa.stale_count()
            )));
        }

        // Step 3: raw quotes.
        let raw = quoter::quote(
            QuoteModel::Glft,
            inputs.mid,
            self.inventory,
            sigma_dollar,
            kappa,
            self.config.gamma,
            arrival_rate,
        )?;

        // Step 4: gate.
        let min_profitable_half_spread =
            self.fee_schedule.min_profitable_half_spread(inputs.mid, self.config.clamp_mode, self.config.min_spread_dollar);
        let gate_input = GateInputs {
            now: inputs.now,
            mid: inputs.mid,
            inventory: self.inventory,
            regime: inputs.regime,
            reservation_price: raw.reservation_price,
            bid_raw: raw.bid_raw,
            ask_raw: raw.ask_raw,
            min_profitable_half_spread,
            is_futures: self.config.is_futures,
            liquidation_distance_pct: inputs.liquidation_distance_pct,
        };
        let outcome = gate::apply(&mut self.gate_state, &self.gate_config, gate_input);

        let targets = match &outcome {
            GateOutcome::Withdraw { reason } => {
                warn!(reason = %reason, "gate withdrew quotes this epoch");
                SideTargets::default()
            }
            GateOutcome::Quote { bid, ask } => SideTargets {
                bid: bid.as_ref().map(|q| q.price),
                ask: ask.as_ref().map(|q| q.price),
            },
        };

        // Step 5: diff against open-quote table and emit actions.
        let actions = self.order_manager.diff(inputs.now, targets, self.config.order_size);
        info!(
            inventory = self.inventory,
            cash = self.cash,
            r = raw.reservation_price,
            delta = raw.half_spread,
            "epoch complete"
        );
        Ok(actions)
    }
}
