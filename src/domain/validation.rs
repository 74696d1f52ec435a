//! Signal -> order validation. Pure: no randomness, no side effects.

use super::error::ValidationError;
use super::order::Order;
use super::signal::{Action, Signal};

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderValidator;

impl OrderValidator {
    pub fn new() -> Self {
        OrderValidator
    }

    /// Accept a signal as a NEW order, or say why not.
    ///
    /// NaN quantities and prices fail the positivity checks.
    pub fn validate(&self, signal: &Signal) -> Result<Order, ValidationError> {
        check_fields(&signal.symbol, signal.quantity, signal.price)?;
        Ok(Order::new(
            signal.symbol.clone(),
            signal.action.sign() * signal.quantity,
            signal.price,
        ))
    }

    /// Validate free-text fields as they arrive from outside the strategy
    /// layer, e.g. a replayed signal file.
    pub fn validate_raw(
        &self,
        action: &str,
        symbol: &str,
        quantity: f64,
        price: f64,
    ) -> Result<Order, ValidationError> {
        let action: Action = action.parse()?;
        check_fields(symbol, quantity, price)?;
        Ok(Order::new(symbol, action.sign() * quantity, price))
    }
}

fn check_fields(symbol: &str, quantity: f64, price: f64) -> Result<(), ValidationError> {
    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }
    if !(quantity > 0.0) {
        return Err(ValidationError::NonPositiveQuantity { quantity });
    }
    if !(price > 0.0) {
        return Err(ValidationError::NonPositivePrice { price });
    }
    Ok(())
}
