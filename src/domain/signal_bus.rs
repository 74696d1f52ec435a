//! Synchronous publish/subscribe fan-out of signals.
//!
//! Observers run on the caller's thread in attachment order. A failing
//! observer is logged and skipped; delivery continues with the next one.

use std::sync::{Arc, Mutex};

use super::error::ObserverError;
use super::signal::Signal;

/// Shared sink observers write their lines to.
pub type SharedLog = Arc<Mutex<Vec<String>>>;

pub fn shared_log() -> SharedLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn push_line(sink: &SharedLog, observer: &str, line: String) -> Result<(), ObserverError> {
    sink.lock()
        .map_err(|_| ObserverError {
            observer: observer.to_string(),
            reason: "log sink poisoned".into(),
        })?
        .push(line);
    Ok(())
}

pub trait SignalObserver: Send {
    fn name(&self) -> &str;
    fn on_signal(&mut self, signal: &Signal) -> Result<(), ObserverError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub struct SignalBus {
    observers: Vec<(ObserverId, Box<dyn SignalObserver>)>,
    next_id: u64,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, observer: Box<dyn SignalObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer, handing it back. None if it was not attached.
    pub fn detach(&mut self, id: ObserverId) -> Option<Box<dyn SignalObserver>> {
        let idx = self.observers.iter().position(|(oid, _)| *oid == id)?;
        Some(self.observers.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver to every attached observer. Returns how many failed.
    pub fn notify(&mut self, signal: &Signal) -> usize {
        let mut failures = 0;
        for (_, observer) in self.observers.iter_mut() {
            if let Err(e) = observer.on_signal(signal) {
                failures += 1;
                tracing::warn!(
                    observer = observer.name(),
                    symbol = %signal.symbol,
                    strategy = %signal.strategy_name,
                    error = %e,
                    "signal observer failed"
                );
            }
        }
        failures
    }
}

/// Records every signal.
pub struct LoggingObserver {
    sink: SharedLog,
}

impl LoggingObserver {
    pub fn new(sink: SharedLog) -> Self {
        LoggingObserver { sink }
    }
}

impl SignalObserver for LoggingObserver {
    fn name(&self) -> &str {
        "logger"
    }

    fn on_signal(&mut self, signal: &Signal) -> Result<(), ObserverError> {
        tracing::info!(
            strategy = %signal.strategy_name,
            action = %signal.action,
            symbol = %signal.symbol,
            quantity = signal.quantity,
            price = signal.price,
            reason = %signal.reason,
            "signal"
        );
        push_line(&self.sink, self.name(), format!("[LOG] {signal}"))
    }
}

/// Fires when a signal's notional reaches `threshold`.
pub struct AlertObserver {
    threshold: f64,
    sink: SharedLog,
}

impl AlertObserver {
    pub fn new(threshold: f64, sink: SharedLog) -> Self {
        AlertObserver { threshold, sink }
    }
}

impl SignalObserver for AlertObserver {
    fn name(&self) -> &str {
        "alerter"
    }

    fn on_signal(&mut self, signal: &Signal) -> Result<(), ObserverError> {
        let notional = signal.notional();
        if notional >= self.threshold {
            tracing::warn!(
                strategy = %signal.strategy_name,
                symbol = %signal.symbol,
                notional,
                threshold = self.threshold,
                "large trade signal"
            );
            push_line(
                &self.sink,
                self.name(),
                format!("[ALERT] Large trade: ${notional:.2} | {signal}"),
            )?;
        }
        Ok(())
    }
}
