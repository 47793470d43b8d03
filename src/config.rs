//! Engine configuration (Section 6 "Configuration surface"): a single
//! serde-deserializable struct with per-field defaults, loaded from
//! `config.json` when present.
//!
//! Follows this codebase's usual `Config`/`load_config()` pattern: per-field
//! `#[serde(default = "fn")]`, graceful fallback to defaults with a println
//! banner rather than a hard failure.

use crate::types::{ClampMode, FeeTier};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KappaMode {
    Constant,
    Live,
}

impl Default for KappaMode {
    fn default() -> Self {
        KappaMode::Constant
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default)]
    pub kappa_mode: KappaMode,
    #[serde(default = "default_kappa_value")]
    pub kappa_value: f64,
    #[serde(default = "default_arrival_rate")]
    pub arrival_rate: f64,
    #[serde(default = "default_order_size")]
    pub order_size: f64,
    #[serde(default = "default_interval_s")]
    pub interval_s: f64,
    #[serde(default = "default_min_spread")]
    pub min_spread_dollar: f64,
    #[serde(default = "default_max_spread")]
    pub max_spread_dollar: f64,
    #[serde(default = "default_inventory_soft")]
    pub inventory_soft: f64,
    #[serde(default = "default_inventory_hard")]
    pub inventory_hard: f64,
    #[serde(default = "default_regime_filter")]
    pub regime_filter: bool,
    #[serde(default)]
    pub fee_tier: FeeTier,
    #[serde(default)]
    pub clamp_mode: ClampMode,
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    #[serde(default = "default_is_futures")]
    pub is_futures: bool,
    #[serde(default = "default_tick_jump_pct")]
    pub tick_jump_pct: f64,
    #[serde(default = "default_displacement_pct")]
    pub displacement_pct: f64,
    #[serde(default = "default_liq_threshold")]
    pub liq_threshold: f64,
    #[serde(default = "default_tau_displacement")]
    pub tau_displacement_sec: f64,
    #[serde(default = "default_displacement_widen_mult")]
    pub displacement_widen_mult: f64,
    #[serde(default = "default_n_imbalance")]
    pub n_imbalance: usize,
    #[serde(default = "default_imbalance_threshold")]
    pub imbalance_threshold: f64,
    #[serde(default = "default_tau_imbalance")]
    pub tau_imbalance_sec: f64,
    #[serde(default = "default_kappa_levels")]
    pub kappa_levels: usize,
    #[serde(default = "default_tau_kappa")]
    pub tau_kappa_sec: f64,
    #[serde(default = "default_k_stale_threshold")]
    pub k_stale_threshold: u32,
    #[serde(default = "default_ticks_per_candle")]
    pub ticks_per_candle: usize,
    #[serde(default = "default_queue_alpha")]
    pub queue_alpha: f64,
    #[serde(default = "default_sim_seed")]
    pub sim_seed: u64,
    #[serde(default = "default_vol_window")]
    pub vol_window: usize,
    #[serde(default = "default_bootstrap_sigma_pct")]
    pub bootstrap_sigma_pct: f64,
    #[serde(default = "default_tau_ack")]
    pub tau_ack_sec: f64,
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
    #[serde(default = "default_replace_threshold")]
    pub replace_threshold: f64,
    #[serde(default = "default_supports_amend")]
    pub supports_amend: bool,
    #[serde(default = "default_candle_path")]
    pub candle_path: String,
}

fn default_gamma() -> f64 {
    0.01
}
fn default_kappa_value() -> f64 {
    1.0
}
fn default_arrival_rate() -> f64 {
    50.0
}
fn default_order_size() -> f64 {
    1.0
}
fn default_interval_s() -> f64 {
    5.0
}
fn default_min_spread() -> f64 {
    0.01
}
fn default_max_spread() -> f64 {
    1000.0
}
fn default_inventory_soft() -> f64 {
    1.0
}
fn default_inventory_hard() -> f64 {
    2.0
}
fn default_regime_filter() -> bool {
    true
}
fn default_leverage() -> f64 {
    1.0
}
fn default_is_futures() -> bool {
    false
}
fn default_tick_jump_pct() -> f64 {
    0.02
}
fn default_displacement_pct() -> f64 {
    0.005
}
fn default_liq_threshold() -> f64 {
    0.20
}
fn default_tau_displacement() -> f64 {
    30.0
}
fn default_displacement_widen_mult() -> f64 {
    2.0
}
fn default_n_imbalance() -> usize {
    20
}
fn default_imbalance_threshold() -> f64 {
    0.8
}
fn default_tau_imbalance() -> f64 {
    60.0
}
fn default_kappa_levels() -> usize {
    10
}
fn default_tau_kappa() -> f64 {
    30.0
}
fn default_k_stale_threshold() -> u32 {
    5
}
fn default_ticks_per_candle() -> usize {
    100
}
fn default_queue_alpha() -> f64 {
    0.5
}
fn default_sim_seed() -> u64 {
    42
}
fn default_vol_window() -> usize {
    50
}
fn default_bootstrap_sigma_pct() -> f64 {
    0.01
}
fn default_tau_ack() -> f64 {
    3.0
}
fn default_tick_size() -> f64 {
    0.01
}
fn default_replace_threshold() -> f64 {
    5.0
}
fn default_supports_amend() -> bool {
    false
}
fn default_candle_path() -> String {
    "data/candles.csv".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            kappa_mode: KappaMode::default(),
            kappa_value: default_kappa_value(),
            arrival_rate: default_arrival_rate(),
            order_size: default_order_size(),
            interval_s: default_interval_s(),
            min_spread_dollar: default_min_spread(),
            max_spread_dollar: default_max_spread(),
            inventory_soft: default_inventory_soft(),
            inventory_hard: default_inventory_hard(),
            regime_filter: default_regime_filter(),
            fee_tier: FeeTier::default(),
            clamp_mode: ClampMode::default(),
            leverage: default_leverage(),
            is_futures: default_is_futures(),
            tick_jump_pct: default_tick_jump_pct(),
            displacement_pct: default_displacement_pct(),
            liq_threshold: default_liq_threshold(),
            tau_displacement_sec: default_tau_displacement(),
            displacement_widen_mult: default_displacement_widen_mult(),
            n_imbalance: default_n_imbalance(),
            imbalance_threshold: default_imbalance_threshold(),
            tau_imbalance_sec: default_tau_imbalance(),
            kappa_levels: default_kappa_levels(),
            tau_kappa_sec: default_tau_kappa(),
            k_stale_threshold: default_k_stale_threshold(),
            ticks_per_candle: default_ticks_per_candle(),
            queue_alpha: default_queue_alpha(),
            sim_seed: default_sim_seed(),
            vol_window: default_vol_window(),
            bootstrap_sigma_pct: default_bootstrap_sigma_pct(),
            tau_ack_sec: default_tau_ack(),
            tick_size: default_tick_size(),
            replace_threshold: default_replace_threshold(),
            supports_amend: default_supports_amend(),
            candle_path: default_candle_path(),
        }
    }
}

/// Load configuration from `config.json` in the current directory, falling
/// back to defaults (with a banner) if absent or malformed.
pub fn load_config() -> EngineConfig {
    if let Ok(contents) = fs::read_to_string("config.json") {
        match serde_json::from_str::<EngineConfig>(&contents) {
            Ok(config) => {
                println!("\u{2713} Loaded configuration from config.json");
                return config;
            }
            Err(e) => {
                println!("\u{26a0} config.json present but invalid ({e}); using defaults");
                return EngineConfig::default();
            }
        }
    }
    println!("\u{26a0} Using default configuration (config.json not found)");
    EngineConfig::default()
}
