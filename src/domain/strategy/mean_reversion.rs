//! Mean reversion on the rolling z-score.
//!
//! z = (price - mean) / std over the last `window` prices, current included.
//! SELL when z >= +k, BUY when z <= -k. Silent until the window is full and
//! while the window is flat (std == 0).

use std::collections::HashMap;

use super::{signal_for, Strategy};
use crate::domain::observation::MarketObservation;
use crate::domain::rolling::RollingStatistic;
use crate::domain::signal::{Action, Signal};

pub const NAME: &str = "MeanReversion";

#[derive(Debug, Clone)]
pub struct MeanReversion {
    window: usize,
    k: f64,
    quantity: f64,
    stats: HashMap<String, RollingStatistic>,
}

impl MeanReversion {
    pub fn new(window: usize, k: f64, quantity: f64) -> Self {
        MeanReversion {
            window,
            k,
            quantity,
            stats: HashMap::new(),
        }
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        NAME
    }

    fn generate_signals(&mut self, tick: &MarketObservation) -> Vec<Signal> {
        let window = self.window;
        let rs = self
            .stats
            .entry(tick.symbol.clone())
            .or_insert_with(|| RollingStatistic::new(window));
        rs.add(tick.price);

        if !rs.ready() {
            return Vec::new();
        }
        let (mean, std) = (rs.mean(), rs.std());
        if std == 0.0 {
            return Vec::new();
        }

        let z = (tick.price - mean) / std;
        if z <= -self.k {
            vec![signal_for(
                tick,
                Action::Buy,
                self.quantity,
                NAME,
                format!("MeanReversion z={z:.2} <= -{}", self.k),
            )]
        } else if z >= self.k {
            vec![signal_for(
                tick,
                Action::Sell,
                self.quantity,
                NAME,
                format!("MeanReversion z={z:.2} >= {}", self.k),
            )]
        } else {
            Vec::new()
        }
    }
}
