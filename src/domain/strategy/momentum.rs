//! Momentum: current price against the price exactly `window` ticks earlier.

use std::collections::{HashMap, VecDeque};

use super::{signal_for, Strategy};
use crate::domain::observation::MarketObservation;
use crate::domain::signal::{Action, Signal};

pub const NAME: &str = "Momentum";

#[derive(Debug, Clone)]
pub struct Momentum {
    window: usize,
    quantity: f64,
    history: HashMap<String, VecDeque<f64>>,
}

impl Momentum {
    pub fn new(window: usize, quantity: f64) -> Self {
        assert!(window > 0, "momentum window must be positive");
        Momentum {
            window,
            quantity,
            history: HashMap::new(),
        }
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        NAME
    }

    fn generate_signals(&mut self, tick: &MarketObservation) -> Vec<Signal> {
        let window = self.window;
        let prices = self
            .history
            .entry(tick.symbol.clone())
            .or_insert_with(|| VecDeque::with_capacity(window));

        // front is the price `window` ticks before this one once the buffer is full
        let reference = if prices.len() == window {
            prices.pop_front()
        } else {
            None
        };
        prices.push_back(tick.price);

        let Some(past) = reference else {
            return Vec::new();
        };

        if tick.price > past {
            vec![signal_for(
                tick,
                Action::Buy,
                self.quantity,
                NAME,
                format!("Momentum {} > {past:.4}", tick.price),
            )]
        } else if tick.price < past {
            vec![signal_for(
                tick,
                Action::Sell,
                self.quantity,
                NAME,
                format!("Momentum {} < {past:.4}", tick.price),
            )]
        } else {
            Vec::new()
        }
    }
}
