//! Channel breakout against the prior `lookback` prices.
//!
//! The current price is compared to the max/min of the window *before* it is
//! added, so a tick never competes with itself. Equal to the prior extreme is
//! not a breakout.

use std::collections::{HashMap, VecDeque};

use super::{signal_for, Strategy};
use crate::domain::observation::MarketObservation;
use crate::domain::signal::{Action, Signal};

pub const NAME: &str = "Breakout";

#[derive(Debug, Clone)]
pub struct Breakout {
    lookback: usize,
    quantity: f64,
    windows: HashMap<String, VecDeque<f64>>,
}

impl Breakout {
    pub fn new(lookback: usize, quantity: f64) -> Self {
        assert!(lookback > 0, "breakout lookback must be positive");
        Breakout {
            lookback,
            quantity,
            windows: HashMap::new(),
        }
    }
}

impl Strategy for Breakout {
    fn name(&self) -> &str {
        NAME
    }

    fn generate_signals(&mut self, tick: &MarketObservation) -> Vec<Signal> {
        let lookback = self.lookback;
        let window = self
            .windows
            .entry(tick.symbol.clone())
            .or_insert_with(|| VecDeque::with_capacity(lookback));

        let mut signals = Vec::new();
        if window.len() == lookback {
            let prior_high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let prior_low = window.iter().copied().fold(f64::INFINITY, f64::min);

            if tick.price > prior_high {
                signals.push(signal_for(
                    tick,
                    Action::Buy,
                    self.quantity,
                    NAME,
                    format!("Breakout > {prior_high:.4}"),
                ));
            } else if tick.price < prior_low {
                signals.push(signal_for(
                    tick,
                    Action::Sell,
                    self.quantity,
                    NAME,
                    format!("Breakdown < {prior_low:.4}"),
                ));
            }
        }

        if window.len() == lookback {
            window.pop_front();
        }
        window.push_back(tick.price);
        signals
    }
}
