//! Backtest runner: loads candles and an `EngineConfig`, drives the epoch
//! loop once per candle, evaluates fills with the tick simulator, and
//! writes a trade log and equity curve (Section 6 "Persisted state").
//!
//! Shape follows this codebase's usual `load_config` banner and plain
//! `println!` summary style, generalized from a one-shot spread report into
//! a full per-candle backtest loop.

use csv::Writer;
use glft_market_maker::{
    config, load_candles, simulator, AckStatus, CoreError, EpochContext, EpochInputs, Fill, Regime, Side,
    SimOrder,
};
use std::env;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    glft_market_maker::init_logging();

    let cfg = config::load_config();
    let candle_path = env::args().nth(1).unwrap_or_else(|| cfg.candle_path.clone());

    let candles = match load_candles(&candle_path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load candles from {candle_path}: {e}");
            return ExitCode::from(e.exit_code() as u8);
        }
    };
    println!("Loaded {} candles from {candle_path}", candles.len());

    let mut trade_log = match Writer::from_path("trade_log.csv") {
        Ok(w) => w,
        Err(e) => {
            error!("failed to open trade_log.csv: {e}");
            return ExitCode::from(CoreError::Csv(e).exit_code() as u8);
        }
    };
    let mut equity_curve = match Writer::from_path("equity_curve.csv") {
        Ok(w) => w,
        Err(e) => {
            error!("failed to open equity_curve.csv: {e}");
            return ExitCode::from(CoreError::Csv(e).exit_code() as u8);
        }
    };
    if let Err(e) = trade_log.write_record(["ts", "side", "price", "size", "fee", "q_after", "cash_after", "reason"]) {
        error!("failed to write trade log header: {e}");
        return ExitCode::from(CoreError::Csv(e).exit_code() as u8);
    }
    if let Err(e) =
        equity_curve.write_record(["ts", "mid", "q", "cash", "equity", "realized_pnl", "unrealized_pnl"])
    {
        error!("failed to write equity curve header: {e}");
        return ExitCode::from(CoreError::Csv(e).exit_code() as u8);
    }

    let maker_bps = glft_market_maker::FeeSchedule::for_tier(cfg.fee_tier).maker_bps;
    let ticks_per_candle = cfg.ticks_per_candle;
    let queue_alpha = cfg.queue_alpha;
    let sim_seed = cfg.sim_seed;

    let mut ctx = EpochContext::new(cfg);
    let mut skipped_ticks = 0u32;
    let mut total_fills = 0u32;

    for candle in &candles {
        let inputs = EpochInputs {
            now: candle.ts,
            mid: candle.open,
            depth: None,
            regime: Regime::Ranging,
            liquidation_distance_pct: None,
        };

        let actions = match ctx.step(inputs) {
            Ok(actions) => actions,
            Err(CoreError::StaleTick(reason)) => {
                skipped_ticks += 1;
                warn!("skipping candle at ts={}: {reason}", candle.ts);
                continue;
            }
            Err(CoreError::GateHalt(reason)) => {
                error!("risk gate halt: {reason}");
                return ExitCode::from(CoreError::GateHalt(reason).exit_code() as u8);
            }
            Err(e) => {
                error!("fatal error during epoch: {e}");
                return ExitCode::from(e.exit_code() as u8);
            }
        };

        for action in actions {
            apply_action_optimistically(&mut ctx, action);
        }

        let depth_at_touch = candle.volume.max(1e-9);
        let bid_order = ctx.order_manager_mut().open_quote(Side::Buy).map(|q| {
            (q.client_id.clone(), SimOrder::with_calibrated_queue(q.price, q.size, depth_at_touch, queue_alpha))
        });
        let ask_order = ctx.order_manager_mut().open_quote(Side::Sell).map(|q| {
            (q.client_id.clone(), SimOrder::with_calibrated_queue(q.price, q.size, depth_at_touch, queue_alpha))
        });

        let ticks = simulator::synthesize_ticks(candle, ticks_per_candle, sim_seed);
        let sim_fills = simulator::simulate_candle(
            candle,
            &ticks,
            bid_order.as_ref().map(|(_, o)| *o),
            ask_order.as_ref().map(|(_, o)| *o),
        );

        for sim_fill in sim_fills {
            let client_id = match sim_fill.side {
                Side::Buy => bid_order.as_ref().map(|(id, _)| id.clone()),
                Side::Sell => ask_order.as_ref().map(|(id, _)| id.clone()),
            };
            let Some(client_id) = client_id else { continue };

            let fill = Fill { order_id: client_id.clone(), ..sim_fill };
            ctx.on_fill(&fill);
            ctx.order_manager_mut().on_ack(&client_id, AckStatus::Cancelled);
            total_fills += 1;

            let fee = fill.price * fill.size * maker_bps;
            let _ = trade_log.write_record([
                fill.ts.to_string(),
                fill.side.to_string(),
                fill.price.to_string(),
                fill.size.to_string(),
                fee.to_string(),
                ctx.inventory().to_string(),
                ctx.cash().to_string(),
                "fill".to_string(),
            ]);
        }

        let equity = ctx.cash() + ctx.inventory() * candle.close;
        let _ = equity_curve.write_record([
            candle.ts.to_string(),
            candle.close.to_string(),
            ctx.inventory().to_string(),
            ctx.cash().to_string(),
            equity.to_string(),
            ctx.realized_pnl().to_string(),
            ctx.unrealized_pnl(candle.close).to_string(),
        ]);
    }

    let _ = trade_log.flush();
    let _ = equity_curve.flush();

    let last_close = candles.last().map(|c| c.close).unwrap_or(0.0);
    let final_equity = ctx.cash() + ctx.inventory() * last_close;
    println!("--- backtest summary ---");
    println!("candles processed : {}", candles.len());
    println!("candles skipped   : {skipped_ticks} (outlier ticks)");
    println!("total fills       : {total_fills}");
    println!("final inventory   : {:.6}", ctx.inventory());
    println!("final cash        : {:.2}", ctx.cash());
    println!("final equity      : {:.2}", final_equity);
    info!("backtest complete");

    ExitCode::SUCCESS
}

/// Optimistically acknowledge our own simulated venue immediately — a
/// backtest has no real adapter round-trip, so every place/amend/cancel is
/// its own ack (Section 6: the order manager otherwise waits for `on_ack`).
fn apply_action_optimistically(ctx: &mut EpochContext, action: glft_market_maker::OrderAction) {
    use glft_market_maker::OrderAction;
    match action {
        OrderAction::Place { client_id, .. } => ctx.order_manager_mut().on_ack(&client_id, AckStatus::Accepted),
        OrderAction::Amend { client_id, .. } => ctx.order_manager_mut().on_ack(&client_id, AckStatus::Accepted),
        OrderAction::Cancel { client_id } => ctx.order_manager_mut().on_ack(&client_id, AckStatus::Cancelled),
    }
}
