pub mod adapter;
pub mod candles;
pub mod config;
pub mod epoch;
pub mod error;
pub mod fee_schedule;
pub mod gate;
pub mod kappa;
pub mod order_manager;
pub mod quoter;
pub mod simulator;
pub mod types;
pub mod volatility;

pub use adapter::{AdapterEvent, MarketAdapter};
pub use candles::load_candles;
pub use config::{load_config, EngineConfig, KappaMode};
pub use epoch::{EpochContext, EpochInputs};
pub use error::{CoreError, Result};
pub use fee_schedule::FeeSchedule;
pub use gate::{GateConfig, GateInputs, GateOutcome, GateState, SidedQuote};
pub use kappa::{ConstantKappa, KappaProvider, LiveKappa};
pub use order_manager::{OrderAction, OrderManager, SideTargets};
pub use quoter::{quote, GlftQuote, QuoteModel};
pub use simulator::{simulate_candle, synthesize_ticks, SimOrder, Tick};
pub use types::{
    AckStatus, Candle, ClampMode, DepthSnapshot, FeeTier, Fill, OpenQuote, PriceLevel, Regime, Side,
};
pub use volatility::VolatilityEstimator;

/// Initialize logging for the library.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}
