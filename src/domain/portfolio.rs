//! Execution context: cash, positions, audit trail, and equity tracking.
//!
//! Cash only moves on fills: `cash -= signed_quantity * price`. Positions are
//! created on the first fill for a symbol and kept afterwards even when flat.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::order::{Order, OrderStatus};
use super::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    Execute,
    Undo,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::Execute => write!(f, "EXECUTE"),
            AuditEvent::Undo => write!(f, "UNDO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub event: AuditEvent,
    pub timestamp: NaiveDateTime,
    pub strategy: String,
    pub symbol: String,
    pub signed_quantity: f64,
    pub price: f64,
}

/// What a fill overwrote and what it left behind.
///
/// While the book still shows the post-fill values the prior ones are put
/// back bit for bit. Once later fills have moved the book on, revert falls
/// back to the algebraic inverse so those fills survive.
#[derive(Debug, Clone, PartialEq)]
pub struct FillReceipt {
    prior_position: Option<Position>,
    prior_cash: f64,
    post_position: Position,
    post_cash: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    cash: f64,
    positions: BTreeMap<String, Position>,
    trade_log: Vec<AuditEntry>,
}

impl ExecutionContext {
    pub fn new(cash: f64) -> Self {
        ExecutionContext {
            cash,
            positions: BTreeMap::new(),
            trade_log: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn trade_log(&self) -> &[AuditEntry] {
        &self.trade_log
    }

    /// cash + sum(quantity * avg_price): cost-basis view of the book.
    pub fn book_value(&self) -> f64 {
        self.cash
            + self
                .positions
                .values()
                .map(|p| p.quantity * p.avg_price)
                .sum::<f64>()
    }

    /// cash + sum(quantity * last known price), falling back to the
    /// position's own avg_price for symbols with no price yet.
    pub fn equity(&self, last_prices: &HashMap<String, f64>) -> f64 {
        let marked: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = last_prices.get(&pos.symbol).copied().unwrap_or(pos.avg_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + marked
    }

    /// Apply a FILLED order to the book.
    ///
    /// # Panics
    ///
    /// If the order is not FILLED or its price is not a positive finite
    /// number. Either means an upstream stage let a bad order through.
    pub(crate) fn apply_fill(&mut self, order: &Order) -> FillReceipt {
        assert_eq!(
            order.status(),
            OrderStatus::Filled,
            "only FILLED orders reach the ledger: {order}"
        );
        assert!(
            order.price > 0.0 && order.price.is_finite(),
            "non-positive price reached the ledger: {order}"
        );
        assert!(
            order.signed_quantity.is_finite(),
            "non-finite quantity reached the ledger: {order}"
        );

        let prior_position = self.positions.get(&order.symbol).cloned();
        let prior_cash = self.cash;

        let position = self
            .positions
            .entry(order.symbol.clone())
            .or_insert_with(|| Position::flat(order.symbol.clone()));
        position.apply_fill(order.signed_quantity, order.price);
        let post_position = position.clone();
        self.cash -= order.cash_impact();

        FillReceipt {
            prior_position,
            prior_cash,
            post_position,
            post_cash: self.cash,
        }
    }

    /// Undo the fill `receipt` came from.
    ///
    /// Cash is refunded by `signed_quantity * price` and the position gives
    /// back `signed_quantity`. When nothing has touched the book since the
    /// fill, the recorded prior values are restored instead, which is the
    /// same inverse without rounding.
    pub(crate) fn revert_fill(&mut self, order: &Order, receipt: &FillReceipt) {
        let current = self.positions.get(&order.symbol);
        if current == Some(&receipt.post_position) {
            match &receipt.prior_position {
                Some(prior) => {
                    self.positions.insert(order.symbol.clone(), prior.clone());
                }
                None => {
                    self.positions.remove(&order.symbol);
                }
            }
        } else if let Some(position) = self.positions.get_mut(&order.symbol) {
            position.revert_fill(order.signed_quantity, order.price);
        }

        if self.cash.to_bits() == receipt.post_cash.to_bits() {
            self.cash = receipt.prior_cash;
        } else {
            self.cash += order.cash_impact();
        }
    }

    pub(crate) fn record(&mut self, entry: AuditEntry) {
        self.trade_log.push(entry);
    }
}
