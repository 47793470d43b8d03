//! Shared domain types for the quoting/risk core: order side, depth levels,
//! and the regime/guard enums threaded through the gate and order manager.

use serde::{Deserialize, Serialize};

/// Order side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Sign convention used for inventory and cash updates: +1 for buy, -1 for sell.
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// One price level of resting size on one side of the book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
}

/// A depth snapshot: bid/ask levels ordered outward from the touch. Not
/// retained across epochs — only the kappa/A derived from it persists
/// (Section 3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl DepthSnapshot {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    pub fn mid(&self) -> Option<f64> {
        Some((self.best_bid()? + self.best_ask()?) / 2.0)
    }
}

/// Coarse market regime classification, cached between refreshes (Section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Ranging,
    Trending,
    Unknown,
}

impl Default for Regime {
    fn default() -> Self {
        Regime::Unknown
    }
}

/// Venue order status as reported by an ack (Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Accepted,
    Rejected,
    Cancelled,
}

/// Fee tier identifier (Section 4.1, Section 6 `fee_tier`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeeTier {
    /// Standard retail maker/taker schedule.
    Regular,
    /// Negative-rebate market-maker program.
    MarketMaker,
    /// Operator-supplied rates for a venue/tier not built into the table.
    Custom { maker_bps: f64, taker_bps: f64 },
}

impl Default for FeeTier {
    fn default() -> Self {
        FeeTier::Regular
    }
}

/// Which pair of legs a round trip's profitability is measured against
/// (Section 9 open question: two-maker vs maker+taker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClampMode {
    TwoMaker,
    MakerPlusTaker,
}

impl Default for ClampMode {
    fn default() -> Self {
        ClampMode::TwoMaker
    }
}

/// A single resting order tracked by the order manager (Section 3). At most
/// one per side lives in the open-quote table at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenQuote {
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub client_id: String,
    pub venue_order_id: Option<String>,
    pub placed_at: f64,
}

/// A confirmed fill event drained by the epoch driver (Section 4.8, Section 6).
#[derive(Debug, Clone)]
pub struct Fill {
    pub ts: f64,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub order_id: String,
    pub is_maker: bool,
}

/// One OHLCV candle, the simulator's raw input (Section 4.7).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Candle {
    pub ts: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}
