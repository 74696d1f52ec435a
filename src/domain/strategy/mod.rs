//! Signal-generating strategies.
//!
//! - `Strategy`: the one capability every variant offers, tick in, signals out
//! - `StrategyConfig`: closed set of variants with their parameters, used to
//!   build fresh, independent strategy instances
//!
//! Every variant keeps per-symbol state created on first sight of a symbol.
//! No state is shared between instances.

pub mod breakout;
pub mod mean_reversion;
pub mod momentum;

use std::fmt;

use super::observation::MarketObservation;
use super::signal::{Action, Signal};

pub use breakout::Breakout;
pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Consume one tick and emit zero or more signals.
    fn generate_signals(&mut self, tick: &MarketObservation) -> Vec<Signal>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    MeanReversion { window: usize, k: f64, quantity: f64 },
    Breakout { lookback: usize, quantity: f64 },
    Momentum { window: usize, quantity: f64 },
}

impl StrategyConfig {
    /// Config section key for this variant.
    pub fn key(&self) -> &'static str {
        match self {
            StrategyConfig::MeanReversion { .. } => "mean_reversion",
            StrategyConfig::Breakout { .. } => "breakout",
            StrategyConfig::Momentum { .. } => "momentum",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::MeanReversion { .. } => mean_reversion::NAME,
            StrategyConfig::Breakout { .. } => breakout::NAME,
            StrategyConfig::Momentum { .. } => momentum::NAME,
        }
    }

    pub fn build(&self) -> Box<dyn Strategy> {
        match *self {
            StrategyConfig::MeanReversion { window, k, quantity } => {
                Box::new(MeanReversion::new(window, k, quantity))
            }
            StrategyConfig::Breakout { lookback, quantity } => {
                Box::new(Breakout::new(lookback, quantity))
            }
            StrategyConfig::Momentum { window, quantity } => {
                Box::new(Momentum::new(window, quantity))
            }
        }
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyConfig::MeanReversion { window, k, quantity } => {
                write!(f, "{}(window={window}, k={k}, quantity={quantity})", self.name())
            }
            StrategyConfig::Breakout { lookback, quantity } => {
                write!(f, "{}(lookback={lookback}, quantity={quantity})", self.name())
            }
            StrategyConfig::Momentum { window, quantity } => {
                write!(f, "{}(window={window}, quantity={quantity})", self.name())
            }
        }
    }
}

/// Build the signal a strategy emits for `tick`.
pub(crate) fn signal_for(
    tick: &MarketObservation,
    action: Action,
    quantity: f64,
    strategy_name: &str,
    reason: String,
) -> Signal {
    Signal {
        action,
        symbol: tick.symbol.clone(),
        quantity,
        price: tick.price,
        reason,
        strategy_name: strategy_name.to_string(),
        timestamp: tick.timestamp,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::run_series;
    use super::*;

    #[test]
    fn build_produces_named_strategies() {
        let configs = [
            StrategyConfig::MeanReversion {
                window: 5,
                k: 1.0,
                quantity: 10.0,
            },
            StrategyConfig::Breakout {
                lookback: 3,
                quantity: 5.0,
            },
            StrategyConfig::Momentum {
                window: 3,
                quantity: 10.0,
            },
        ];
        let names: Vec<String> = configs.iter().map(|c| c.build().name().to_string()).collect();
        assert_eq!(names, vec!["MeanReversion", "Breakout", "Momentum"]);
    }

    #[test]
    fn config_keys() {
        let cfg = StrategyConfig::Momentum {
            window: 3,
            quantity: 1.0,
        };
        assert_eq!(cfg.key(), "momentum");
        assert_eq!(cfg.to_string(), "Momentum(window=3, quantity=1)");
    }

    #[test]
    fn built_instances_do_not_share_state() {
        let cfg = StrategyConfig::Breakout {
            lookback: 3,
            quantity: 1.0,
        };
        let mut warm = cfg.build();
        let mut cold = cfg.build();

        run_series(warm.as_mut(), "AAA", &[10.0, 11.0, 12.0]);
        let warm_out = run_series(warm.as_mut(), "AAA", &[13.0]);
        let cold_out = run_series(cold.as_mut(), "AAA", &[13.0]);

        assert_eq!(warm_out[0].len(), 1);
        assert!(cold_out[0].is_empty());
    }
}
