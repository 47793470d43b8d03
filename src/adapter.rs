//! Market adapter boundary (Section 6): the capability the epoch driver
//! talks to for inbound market data and outbound order actions. A plain
//! synchronous trait, per Section 5's "no shared mutable state crosses the
//! boundary — only immutable message values".
//!
//! Earlier revisions of this codebase wired a REST/WebSocket client directly
//! into their tasks rather than behind a capability trait; this crate
//! introduces the seam so the backtest simulator and a future live venue
//! client can share one epoch driver.

use crate::error::Result;
use crate::types::{AckStatus, DepthSnapshot, Side};

/// Inbound event the adapter hands to the driver (Section 6 "Inbound from
/// exchange adapter").
#[derive(Debug, Clone)]
pub enum AdapterEvent {
    Tick { ts: f64, mid: f64 },
    Depth { ts: f64, snapshot: DepthSnapshot },
    Fill { ts: f64, side: Side, price: f64, size: f64, order_id: String, is_maker: bool },
    Ack { order_id: String, status: AckStatus },
}

/// Outbound command the driver issues through the adapter (Section 6
/// "Outbound to adapter").
pub trait MarketAdapter {
    /// Drain and return events queued since the last call. Must not block;
    /// an empty vec means nothing new arrived this epoch.
    fn poll_events(&mut self) -> Result<Vec<AdapterEvent>>;

    fn place(&mut self, side: Side, price: f64, size: f64, client_id: &str, post_only: bool) -> Result<()>;

    fn cancel(&mut self, client_id: &str) -> Result<()>;

    /// Optional capability; adapters that don't support in-place amendment
    /// should return `Ok(false)` so the order manager falls back to
    /// cancel-then-place.
    fn amend(&mut self, client_id: &str, new_price: f64, new_size: f64) -> Result<bool>;

    /// True if this adapter supports [`MarketAdapter::amend`] at all
    /// (queried once at startup, not per call).
    fn supports_amend(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// In-memory adapter used to exercise the trait boundary in tests.
    struct FakeAdapter {
        queued: VecDeque<AdapterEvent>,
        placed: Vec<(Side, f64, f64, String)>,
        cancelled: Vec<String>,
    }

    impl MarketAdapter for FakeAdapter {
        fn poll_events(&mut self) -> Result<Vec<AdapterEvent>> {
            Ok(self.queued.drain(..).collect())
        }
        fn place(&mut self, side: Side, price: f64, size: f64, client_id: &str, _post_only: bool) -> Result<()> {
            self.placed.push((side, price, size, client_id.to_string()));
            Ok(())
        }
        fn cancel(&mut self, client_id: &str) -> Result<()> {
            self.cancelled.push(client_id.to_string());
            Ok(())
        }
        fn amend(&mut self, _client_id: &str, _new_price: f64, _new_size: f64) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn poll_events_drains_queue() {
        let mut adapter = FakeAdapter {
            queued: VecDeque::from(vec![AdapterEvent::Tick { ts: 0.0, mid: 100.0 }]),
            placed: Vec::new(),
            cancelled: Vec::new(),
        };
        let events = adapter.poll_events().unwrap();
        assert_eq!(events.len(), 1);
        assert!(adapter.poll_events().unwrap().is_empty());
    }

    #[test]
    fn place_and_cancel_record_calls() {
        let mut adapter = FakeAdapter { queued: VecDeque::new(), placed: Vec::new(), cancelled: Vec::new() };
        adapter.place(Side::Buy, 99.0, 1.0, "cid-1", true).unwrap();
        adapter.cancel("cid-1").unwrap();
        assert_eq!(adapter.placed.len(), 1);
        assert_eq!(adapter.cancelled, vec!["cid-1".to_string()]);
    }
}
