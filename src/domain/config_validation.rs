//! Configuration validation and construction.
//!
//! Validates every field before a run, then turns the INI view into plain
//! structs. Missing keys take the documented defaults.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TickTraderError;
use crate::domain::execution::DEFAULT_FAILURE_PROBABILITY;
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_SEED: i64 = 42;
pub const DEFAULT_ALERT_NOTIONAL: f64 = 10_000.0;
pub const DEFAULT_STRATEGIES: &str = "mean_reversion,breakout";

const KNOWN_STRATEGIES: [&str; 3] = ["mean_reversion", "breakout", "momentum"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TickTraderError> {
    validate_initial_capital(config)?;
    validate_failure_probability(config)?;
    validate_seed(config)?;
    validate_alert_notional(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TickTraderError> {
    for name in strategy_names(config)? {
        match name.as_str() {
            "mean_reversion" => {
                positive_int(config, "mean_reversion", "window", 20)?;
                positive_double(config, "mean_reversion", "k", 2.0)?;
                positive_double(config, "mean_reversion", "quantity", 10.0)?;
            }
            "breakout" => {
                positive_int(config, "breakout", "lookback", 20)?;
                positive_double(config, "breakout", "quantity", 10.0)?;
            }
            _ => {
                positive_int(config, "momentum", "window", 3)?;
                positive_double(config, "momentum", "quantity", 10.0)?;
            }
        }
    }
    Ok(())
}

/// Validate then build the run parameters.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TickTraderError> {
    validate_backtest_config(config)?;
    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        failure_probability: config.get_double(
            "backtest",
            "failure_probability",
            DEFAULT_FAILURE_PROBABILITY,
        ),
        seed: config.get_int("backtest", "seed", DEFAULT_SEED) as u64,
        alert_notional: config.get_double("backtest", "alert_notional", DEFAULT_ALERT_NOTIONAL),
    })
}

/// Validate then build the strategy set, in the order `strategies` lists it.
pub fn build_strategy_configs(
    config: &dyn ConfigPort,
) -> Result<Vec<StrategyConfig>, TickTraderError> {
    validate_strategy_config(config)?;
    strategy_names(config)?
        .iter()
        .map(|name| {
            Ok(match name.as_str() {
                "mean_reversion" => StrategyConfig::MeanReversion {
                    window: positive_int(config, "mean_reversion", "window", 20)?,
                    k: positive_double(config, "mean_reversion", "k", 2.0)?,
                    quantity: positive_double(config, "mean_reversion", "quantity", 10.0)?,
                },
                "breakout" => StrategyConfig::Breakout {
                    lookback: positive_int(config, "breakout", "lookback", 20)?,
                    quantity: positive_double(config, "breakout", "quantity", 10.0)?,
                },
                _ => StrategyConfig::Momentum {
                    window: positive_int(config, "momentum", "window", 3)?,
                    quantity: positive_double(config, "momentum", "quantity", 10.0)?,
                },
            })
        })
        .collect()
}

fn strategy_names(config: &dyn ConfigPort) -> Result<Vec<String>, TickTraderError> {
    let raw = config
        .get_string("backtest", "strategies")
        .unwrap_or_else(|| DEFAULT_STRATEGIES.to_string());
    let names: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if names.is_empty() {
        return Err(invalid("backtest", "strategies", "at least one strategy is required"));
    }
    if let Some(unknown) = names.iter().find(|n| !KNOWN_STRATEGIES.contains(&n.as_str())) {
        return Err(invalid(
            "backtest",
            "strategies",
            &format!(
                "unknown strategy '{unknown}', expected one of {}",
                KNOWN_STRATEGIES.join(", ")
            ),
        ));
    }
    if let Some(dup) = names
        .iter()
        .enumerate()
        .find_map(|(i, n)| names[..i].contains(n).then_some(n))
    {
        return Err(invalid(
            "backtest",
            "strategies",
            &format!("strategy '{dup}' is listed more than once"),
        ));
    }
    Ok(names)
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TickTraderError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !(value > 0.0) || !value.is_finite() {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_failure_probability(config: &dyn ConfigPort) -> Result<(), TickTraderError> {
    let value = config.get_double("backtest", "failure_probability", DEFAULT_FAILURE_PROBABILITY);
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "failure_probability",
            "failure_probability must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_seed(config: &dyn ConfigPort) -> Result<(), TickTraderError> {
    if config.get_int("backtest", "seed", DEFAULT_SEED) < 0 {
        return Err(invalid("backtest", "seed", "seed must be non-negative"));
    }
    Ok(())
}

fn validate_alert_notional(config: &dyn ConfigPort) -> Result<(), TickTraderError> {
    let value = config.get_double("backtest", "alert_notional", DEFAULT_ALERT_NOTIONAL);
    if !(value >= 0.0) {
        return Err(invalid("backtest", "alert_notional", "alert_notional must be non-negative"));
    }
    Ok(())
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<usize, TickTraderError> {
    let value = config.get_int(section, key, default);
    if value < 1 {
        return Err(invalid(section, key, &format!("{key} must be at least 1")));
    }
    Ok(value as usize)
}

fn positive_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TickTraderError> {
    let value = config.get_double(section, key, default);
    if !(value > 0.0) || !value.is_finite() {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(value)
}

fn invalid(section: &str, key: &str, reason: &str) -> TickTraderError {
    TickTraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
