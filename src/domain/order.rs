//! Orders and their lifecycle.
//!
//! NEW -> FILLED | INVALID | FAILED. All three outcomes are terminal.

use std::fmt;

use super::error::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    New,
    Filled,
    Invalid,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::New)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub symbol: String,
    /// Positive buys, negative sells.
    pub signed_quantity: f64,
    pub price: f64,
    status: OrderStatus,
}

impl Order {
    pub fn new(symbol: impl Into<String>, signed_quantity: f64, price: f64) -> Self {
        Order {
            symbol: symbol.into(),
            signed_quantity,
            price,
            status: OrderStatus::New,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_buy(&self) -> bool {
        self.signed_quantity > 0.0
    }

    /// signed_quantity * price; what a fill takes out of cash.
    pub fn cash_impact(&self) -> f64 {
        self.signed_quantity * self.price
    }

    /// Move out of NEW. Terminal statuses never change again.
    pub fn transition(&mut self, to: OrderStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() || to == OrderStatus::New {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order(symbol={}, qty={}, price={}, status={})",
            self.symbol, self.signed_quantity, self.price, self.status
        )
    }
}
