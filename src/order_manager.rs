//! Order manager (Section 4.6): diffs gated `(bid, ask)` targets against an
//! open-quote table and emits the minimal place/keep/amend/cancel actions,
//! tracking pending (unacknowledged) modifications with a `τ_ACK` timeout.
//!
//! Follows the `RateLimiter`/`should_reprice`/`should_force_replace`,
//! one-order-per-side bookkeeping this codebase has used before, generalized
//! from an async ping-pong loop into a pure, synchronous diff the epoch
//! driver calls once per epoch (Section 5: "quoter, gate, order-manager
//! diff... must be pure and non-suspending").

use crate::types::{AckStatus, OpenQuote, Side};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    Place { side: Side, price: f64, size: f64, client_id: String },
    Amend { client_id: String, new_price: f64, new_size: f64 },
    Cancel { client_id: String },
}

/// Gated per-side targets for this epoch; `None` means withdraw/cancel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideTargets {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct PendingMod {
    since: f64,
    side: Side,
}

#[derive(Debug, Clone)]
pub struct OrderManager {
    tick_size: f64,
    replace_threshold: f64,
    tau_ack: f64,
    supports_amend: bool,
    open: HashMap<Side, OpenQuote>,
    pending: HashMap<String, PendingMod>,
    next_id: u64,
}

impl OrderManager {
    pub fn new(tick_size: f64, replace_threshold: f64, tau_ack: f64, supports_amend: bool) -> Self {
        Self {
            tick_size,
            replace_threshold,
            tau_ack,
            supports_amend,
            open: HashMap::new(),
            pending: HashMap::new(),
            next_id: 0,
        }
    }

    fn new_client_id(&mut self) -> String {
        self.next_id += 1;
        format!("cid-{}", self.next_id)
    }

    pub fn open_quote(&self, side: Side) -> Option<&OpenQuote> {
        self.open.get(&side)
    }

    pub fn has_pending(&self, side: Side) -> bool {
        self.open
            .get(&side)
            .map(|q| self.pending.contains_key(&q.client_id))
            .unwrap_or(false)
    }

    /// Venue ack/reject/cancel confirmation (Section 6 `on_ack`). `order_id`
    /// here is the client id the order manager assigned at placement time.
    pub fn on_ack(&mut self, client_id: &str, status: AckStatus) {
        self.pending.remove(client_id);
        match status {
            AckStatus::Accepted => {
                if let Some(q) = self.open.values_mut().find(|q| q.client_id == client_id) {
                    q.venue_order_id = Some(client_id.to_string());
                }
            }
            AckStatus::Rejected | AckStatus::Cancelled => {
                self.open.retain(|_, q| q.client_id != client_id);
            }
        }
    }

    /// Run one epoch's diff (Section 4.6, Section 4.8 step 5). `size` is the
    /// configured order size applied uniformly to both sides.
    pub fn diff(&mut self, now: f64, targets: SideTargets, size: f64) -> Vec<OrderAction> {
        let mut actions = Vec::new();

        // τ_ACK timeout: anything still pending past the deadline is lost;
        // issue a defensive cancel-by-client-id and free the slot.
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| now - p.since >= self.tau_ack)
            .map(|(cid, _)| cid.clone())
            .collect();
        for cid in expired {
            self.pending.remove(&cid);
            self.open.retain(|_, q| q.client_id != cid);
            actions.push(OrderAction::Cancel { client_id: cid });
        }

        for side in [Side::Buy, Side::Sell] {
            let target = match side {
                Side::Buy => targets.bid,
                Side::Sell => targets.ask,
            };

            if self.has_pending(side) {
                continue; // one in-flight modification per venue_order_id at a time
            }

            let existing = self.open.get(&side).cloned();
            match (existing, target) {
                (None, None) => {}
                (None, Some(price)) => {
                    let client_id = self.new_client_id();
                    self.open.insert(
                        side,
                        OpenQuote { side, price, size, client_id: client_id.clone(), venue_order_id: None, placed_at: now },
                    );
                    self.pending.insert(client_id.clone(), PendingMod { since: now, side });
                    actions.push(OrderAction::Place { side, price, size, client_id });
                }
                (Some(q), None) => {
                    self.pending.insert(q.client_id.clone(), PendingMod { since: now, side });
                    actions.push(OrderAction::Cancel { client_id: q.client_id });
                }
                (Some(q), Some(price)) => {
                    let delta = (price - q.price).abs();
                    if delta <= self.tick_size {
                        // keep: within tick size, not worth churning
                    } else if delta < self.replace_threshold && self.supports_amend {
                        self.pending.insert(q.client_id.clone(), PendingMod { since: now, side });
                        actions.push(OrderAction::Amend { client_id: q.client_id.clone(), new_price: price, new_size: size });
                        if let Some(open) = self.open.get_mut(&side) {
                            open.price = price;
                        }
                    } else {
                        // Cancel-before-place: the replacement Place is emitted
                        // on a later epoch once the cancel is ack'd and the
                        // open-quote slot frees up.
                        self.pending.insert(q.client_id.clone(), PendingMod { since: now, side });
                        actions.push(OrderAction::Cancel { client_id: q.client_id });
                    }
                }
            }
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_when_no_order_exists() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, true);
        let actions = om.diff(0.0, SideTargets { bid: Some(99.0), ask: Some(101.0) }, 1.0);
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], OrderAction::Place { side: Side::Buy, price, .. } if price == 99.0));
        assert!(matches!(actions[1], OrderAction::Place { side: Side::Sell, price, .. } if price == 101.0));
    }

    #[test]
    fn keeps_within_tick_size_after_ack() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, true);
        let actions = om.diff(0.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        let cid = match &actions[0] {
            OrderAction::Place { client_id, .. } => client_id.clone(),
            _ => panic!("expected place"),
        };
        om.on_ack(&cid, AckStatus::Accepted);

        let actions2 = om.diff(1.0, SideTargets { bid: Some(99.005), ask: None }, 1.0);
        assert!(actions2.is_empty(), "move within tick size must not churn: {actions2:?}");
    }

    #[test]
    fn amends_when_supported_and_within_replace_threshold() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, true);
        let actions = om.diff(0.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        let cid = match &actions[0] {
            OrderAction::Place { client_id, .. } => client_id.clone(),
            _ => panic!("expected place"),
        };
        om.on_ack(&cid, AckStatus::Accepted);

        let actions2 = om.diff(1.0, SideTargets { bid: Some(99.5), ask: None }, 1.0);
        assert_eq!(actions2.len(), 1);
        assert!(matches!(&actions2[0], OrderAction::Amend { new_price, .. } if (*new_price - 99.5).abs() < 1e-9));
    }

    #[test]
    fn cancels_then_replaces_when_amend_unsupported() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, false);
        let actions = om.diff(0.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        let cid = match &actions[0] {
            OrderAction::Place { client_id, .. } => client_id.clone(),
            _ => panic!("expected place"),
        };
        om.on_ack(&cid, AckStatus::Accepted);

        let actions2 = om.diff(1.0, SideTargets { bid: Some(99.5), ask: None }, 1.0);
        assert_eq!(actions2.len(), 1);
        let cancel_id = match &actions2[0] {
            OrderAction::Cancel { client_id } => client_id.clone(),
            other => panic!("expected cancel before replace, got {other:?}"),
        };
        om.on_ack(&cancel_id, AckStatus::Cancelled);

        let actions3 = om.diff(2.0, SideTargets { bid: Some(99.5), ask: None }, 1.0);
        assert_eq!(actions3.len(), 1);
        assert!(matches!(&actions3[0], OrderAction::Place { price, .. } if (*price - 99.5).abs() < 1e-9));
    }

    #[test]
    fn withdraw_cancels_existing_order() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, true);
        let actions = om.diff(0.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        let cid = match &actions[0] {
            OrderAction::Place { client_id, .. } => client_id.clone(),
            _ => panic!("expected place"),
        };
        om.on_ack(&cid, AckStatus::Accepted);

        let actions2 = om.diff(1.0, SideTargets { bid: None, ask: None }, 1.0);
        assert_eq!(actions2.len(), 1);
        assert!(matches!(&actions2[0], OrderAction::Cancel { .. }));
    }

    #[test]
    fn pending_modification_blocks_further_action_until_ack() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, true);
        om.diff(0.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        // No ack yet: repeated diffs must produce no new action for this side.
        let actions2 = om.diff(1.0, SideTargets { bid: Some(99.5), ask: None }, 1.0);
        assert!(actions2.is_empty());
    }

    #[test]
    fn tau_ack_timeout_issues_defensive_cancel() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, true);
        let actions = om.diff(0.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        let cid = match &actions[0] {
            OrderAction::Place { client_id, .. } => client_id.clone(),
            _ => panic!("expected place"),
        };
        // No ack arrives; past tau_ack the manager must self-cancel.
        let actions2 = om.diff(10.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        assert!(actions2.iter().any(|a| matches!(a, OrderAction::Cancel { client_id } if *client_id == cid)));
    }

    #[test]
    fn tau_ack_timeout_marks_slot_lost_and_re_places() {
        let mut om = OrderManager::new(0.01, 1.0, 3.0, true);
        om.diff(0.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        // No ack ever arrives; past tau_ack the slot must free up, not stay
        // phantom-occupied at the stale price.
        let timeout_actions = om.diff(10.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        assert!(timeout_actions.iter().any(|a| matches!(a, OrderAction::Cancel { .. })));
        assert!(om.open_quote(Side::Buy).is_none(), "open slot must be cleared on timeout");

        // Next epoch must re-place rather than silently "keep" a lost order.
        let actions3 = om.diff(11.0, SideTargets { bid: Some(99.0), ask: None }, 1.0);
        assert_eq!(actions3.len(), 1);
        assert!(matches!(&actions3[0], OrderAction::Place { price, .. } if (*price - 99.0).abs() < 1e-9));
    }
}
