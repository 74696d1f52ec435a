//! Backtest engine and tick loop.
//!
//! Per tick: record the price, collect signals from every strategy, then for
//! each signal publish it to the bus, validate it, attempt the fill, and
//! apply fills through the command invoker. Rejections are logged and the
//! loop moves on. Equity is appended once the tick's signals are done.

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;

use super::command::{CommandInvoker, FillCommand};
use super::error::{ExecutionFailure, TickTraderError};
use super::execution::{ExecutionSimulator, DEFAULT_FAILURE_PROBABILITY};
use super::observation::{sort_observations, MarketObservation};
use super::order::{Order, OrderStatus};
use super::portfolio::{EquityPoint, ExecutionContext};
use super::signal::{Action, Signal};
use super::signal_bus::SignalBus;
use super::strategy::{Strategy, StrategyConfig};
use super::validation::OrderValidator;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub failure_probability: f64,
    pub seed: u64,
    pub alert_notional: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            failure_probability: DEFAULT_FAILURE_PROBABILITY,
            seed: 42,
            alert_notional: 10_000.0,
        }
    }
}

/// A signal that did not become a fill, with everything needed to trace it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub timestamp: NaiveDateTime,
    pub strategy: String,
    pub symbol: String,
    pub action: Action,
    pub quantity: f64,
    pub price: f64,
    pub status: OrderStatus,
    pub reason: String,
}

impl Rejection {
    fn from_signal(signal: &Signal, status: OrderStatus, reason: String) -> Self {
        Rejection {
            timestamp: signal.timestamp,
            strategy: signal.strategy_name.clone(),
            symbol: signal.symbol.clone(),
            action: signal.action,
            quantity: signal.quantity,
            price: signal.price,
            status,
            reason,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {} {} {} @ {}: {}",
            self.status,
            self.timestamp,
            self.strategy,
            self.action,
            self.quantity,
            self.symbol,
            self.price,
            self.reason
        )
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub context: ExecutionContext,
    pub equity_curve: Vec<EquityPoint>,
    /// FILLED and FAILED orders in processing order.
    pub orders: Vec<Order>,
    pub error_log: Vec<Rejection>,
    pub signals_published: usize,
}

impl BacktestResult {
    pub fn fill_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|o| o.status() == OrderStatus::Filled)
            .count()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.equity)
    }
}

pub struct Backtest<R> {
    strategies: Vec<Box<dyn Strategy>>,
    validator: OrderValidator,
    simulator: ExecutionSimulator<R>,
    invoker: CommandInvoker,
    bus: SignalBus,
    context: ExecutionContext,
    last_prices: HashMap<String, f64>,
    equity_curve: Vec<EquityPoint>,
    orders: Vec<Order>,
    error_log: Vec<Rejection>,
    signals_published: usize,
}

impl<R: RngCore> Backtest<R> {
    pub fn new(
        config: &BacktestConfig,
        strategies: Vec<Box<dyn Strategy>>,
        bus: SignalBus,
        rng: R,
    ) -> Result<Self, TickTraderError> {
        Ok(Backtest {
            strategies,
            validator: OrderValidator::new(),
            simulator: ExecutionSimulator::new(config.failure_probability, rng)?,
            invoker: CommandInvoker::new(),
            bus,
            context: ExecutionContext::new(config.initial_capital),
            last_prices: HashMap::new(),
            equity_curve: Vec::new(),
            orders: Vec::new(),
            error_log: Vec::new(),
            signals_published: 0,
        })
    }

    /// Sort (stable, by timestamp) and process every observation.
    pub fn run(&mut self, mut observations: Vec<MarketObservation>) {
        sort_observations(&mut observations);
        for tick in &observations {
            self.process_tick(tick);
        }
    }

    /// Callers feeding ticks one by one must keep them chronological.
    pub fn process_tick(&mut self, tick: &MarketObservation) {
        self.last_prices.insert(tick.symbol.clone(), tick.price);

        let signals: Vec<Signal> = self
            .strategies
            .iter_mut()
            .flat_map(|s| s.generate_signals(tick))
            .collect();

        for signal in &signals {
            self.handle_signal(signal);
        }

        let equity = self.context.equity(&self.last_prices);
        self.equity_curve.push(EquityPoint {
            timestamp: tick.timestamp,
            equity,
        });
    }

    fn handle_signal(&mut self, signal: &Signal) {
        self.bus.notify(signal);
        self.signals_published += 1;

        let order = match self.validator.validate(signal) {
            Ok(order) => order,
            Err(e) => {
                self.reject(Rejection::from_signal(
                    signal,
                    OrderStatus::Invalid,
                    e.to_string(),
                ));
                return;
            }
        };

        match self.simulator.attempt(order) {
            Ok(filled) => {
                tracing::debug!(
                    strategy = %signal.strategy_name,
                    symbol = %filled.symbol,
                    quantity = filled.signed_quantity,
                    price = filled.price,
                    "fill"
                );
                self.orders.push(filled.clone());
                let cmd = FillCommand::new(filled, signal.timestamp, signal.strategy_name.clone());
                self.invoker.execute(Box::new(cmd), &mut self.context);
            }
            Err(failure) => {
                let reason = failure.to_string();
                if let ExecutionFailure::Simulated { order } = failure {
                    self.orders.push(order);
                }
                self.reject(Rejection::from_signal(signal, OrderStatus::Failed, reason));
            }
        }
    }

    fn reject(&mut self, rejection: Rejection) {
        tracing::warn!(
            status = %rejection.status,
            strategy = %rejection.strategy,
            symbol = %rejection.symbol,
            action = %rejection.action,
            quantity = rejection.quantity,
            price = rejection.price,
            reason = %rejection.reason,
            "signal rejected"
        );
        self.error_log.push(rejection);
    }

    /// Roll back the most recent fill. False when there is none.
    ///
    /// The equity curve is history and is not rewritten.
    pub fn undo_last(&mut self) -> bool {
        self.invoker.undo(&mut self.context).is_some()
    }

    pub fn redo_last(&mut self) -> bool {
        self.invoker.redo(&mut self.context).is_some()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn error_log(&self) -> &[Rejection] {
        &self.error_log
    }

    pub fn bus_mut(&mut self) -> &mut SignalBus {
        &mut self.bus
    }

    pub fn finish(self) -> BacktestResult {
        BacktestResult {
            context: self.context,
            equity_curve: self.equity_curve,
            orders: self.orders,
            error_log: self.error_log,
            signals_published: self.signals_published,
        }
    }
}

/// Run `strategies` together on one ledger with a seeded RNG and no observers.
pub fn run_backtest(
    config: &BacktestConfig,
    strategies: Vec<Box<dyn Strategy>>,
    observations: Vec<MarketObservation>,
) -> Result<BacktestResult, TickTraderError> {
    let rng = StdRng::seed_from_u64(config.seed);
    let mut bt = Backtest::new(config, strategies, SignalBus::new(), rng)?;
    bt.run(observations);
    Ok(bt.finish())
}

#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub name: String,
    pub result: BacktestResult,
}

/// Run each strategy alone over the same ticks, in parallel.
///
/// Every run owns its ledger, bus and RNG (seeded with `seed + index`), so
/// runs cannot see each other. `make_bus(index, config)` builds the bus for
/// each run. Results come back in input order.
pub fn run_independent<F>(
    config: &BacktestConfig,
    strategies: &[StrategyConfig],
    observations: &[MarketObservation],
    make_bus: F,
) -> Result<Vec<StrategyRun>, TickTraderError>
where
    F: Fn(usize, &StrategyConfig) -> SignalBus + Sync,
{
    let mut sorted = observations.to_vec();
    sort_observations(&mut sorted);

    strategies
        .par_iter()
        .enumerate()
        .map(|(i, cfg)| {
            let rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
            let mut bt = Backtest::new(config, vec![cfg.build()], make_bus(i, cfg), rng)?;
            for tick in &sorted {
                bt.process_tick(tick);
            }
            Ok(StrategyRun {
                name: cfg.name().to_string(),
                result: bt.finish(),
            })
        })
        .collect()
}
