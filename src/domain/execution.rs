//! Fill simulation.
//!
//! A valid order still fails with probability `failure_probability`. The
//! coin flip comes from the injected RNG only, so a seeded `StdRng` or a
//! `rand::rngs::mock::StepRng` makes outcomes reproducible.

use rand::{Rng, RngCore};

use super::error::{ExecutionFailure, TickTraderError};
use super::order::{Order, OrderStatus};

pub const DEFAULT_FAILURE_PROBABILITY: f64 = 0.005;

#[derive(Debug, Clone)]
pub struct ExecutionSimulator<R> {
    failure_probability: f64,
    rng: R,
}

impl<R: RngCore> ExecutionSimulator<R> {
    pub fn new(failure_probability: f64, rng: R) -> Result<Self, TickTraderError> {
        if !(0.0..=1.0).contains(&failure_probability) {
            return Err(TickTraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "failure_probability".into(),
                reason: "failure_probability must be between 0 and 1".into(),
            });
        }
        Ok(ExecutionSimulator {
            failure_probability,
            rng,
        })
    }

    /// Try to fill a NEW order. FILLED on success; FAILED inside the error
    /// otherwise.
    pub fn attempt(&mut self, mut order: Order) -> Result<Order, ExecutionFailure> {
        if order.status() != OrderStatus::New {
            return Err(ExecutionFailure::NotNew { order });
        }

        let next = if self.rng.gen_bool(self.failure_probability) {
            OrderStatus::Failed
        } else {
            OrderStatus::Filled
        };
        if order.transition(next).is_err() {
            return Err(ExecutionFailure::NotNew { order });
        }

        match next {
            OrderStatus::Filled => Ok(order),
            _ => Err(ExecutionFailure::Simulated { order }),
        }
    }
}
