//! Domain error types.
//!
//! Three tiers: [`TickTraderError`] for run-level failures that abort a
//! command, [`ValidationError`] and [`ExecutionFailure`] for per-signal
//! rejections that are logged and skipped by the tick loop.

use crate::domain::order::{Order, OrderStatus};

/// Top-level error type for ticktrader.
#[derive(Debug, thiserror::Error)]
pub enum TickTraderError {
    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no market data: {reason}")]
    NoData { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TickTraderError> for std::process::ExitCode {
    fn from(err: &TickTraderError) -> Self {
        let code: u8 = match err {
            TickTraderError::Io(_) => 1,
            TickTraderError::ConfigParse { .. }
            | TickTraderError::ConfigMissing { .. }
            | TickTraderError::ConfigInvalid { .. } => 2,
            TickTraderError::DataLoad { .. } | TickTraderError::NoData { .. } => 5,
            TickTraderError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

/// Why a signal could not become an order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid action: {action}")]
    InvalidAction { action: String },

    #[error("symbol is empty")]
    EmptySymbol,

    #[error("invalid quantity: {quantity}")]
    NonPositiveQuantity { quantity: f64 },

    #[error("invalid price: {price}")]
    NonPositivePrice { price: f64 },
}

/// Why a valid order did not fill.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionFailure {
    /// The simulated venue refused the fill. Carries the order, now FAILED.
    #[error("order execution failed: {order}")]
    Simulated { order: Order },

    #[error("order is not NEW: {order}")]
    NotNew { order: Order },
}

impl ExecutionFailure {
    pub fn order(&self) -> &Order {
        match self {
            ExecutionFailure::Simulated { order } | ExecutionFailure::NotNew { order } => order,
        }
    }
}

/// An order status change that the lifecycle does not allow.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("illegal order transition {from} -> {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// A failure raised by a signal observer during delivery.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("observer {observer} failed: {reason}")]
pub struct ObserverError {
    pub observer: String,
    pub reason: String,
}
