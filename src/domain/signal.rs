//! Trade signals emitted by strategies, before validation.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            Action::Buy => 1.0,
            Action::Sell => -1.0,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            _ => Err(ValidationError::InvalidAction {
                action: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: Action,
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub reason: String,
    pub strategy_name: String,
    pub timestamp: NaiveDateTime,
}

impl Signal {
    /// |quantity| * price
    pub fn notional(&self) -> f64 {
        self.quantity.abs() * self.price
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} {} {} @ {} | {}",
            self.timestamp,
            self.strategy_name,
            self.action,
            self.quantity,
            self.symbol,
            self.price,
            self.reason
        )
    }
}
