#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use ticktrader::domain::backtest::BacktestConfig;
use ticktrader::domain::error::TickTraderError;
use ticktrader::domain::observation::MarketObservation;
use ticktrader::ports::data_port::MarketDataPort;

pub struct MockDataPort {
    pub ticks: Vec<MarketObservation>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            ticks: Vec::new(),
            error: None,
        }
    }

    pub fn with_series(mut self, symbol: &str, prices: &[f64]) -> Self {
        self.ticks.extend(series(symbol, prices));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn load_observations(&self) -> Result<Vec<MarketObservation>, TickTraderError> {
        if let Some(reason) = &self.error {
            return Err(TickTraderError::DataLoad {
                reason: reason.clone(),
            });
        }
        Ok(self.ticks.clone())
    }
}

/// Minute `i` after the 2024-01-02 open.
pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
        + chrono::Duration::minutes(i as i64)
}

pub fn series(symbol: &str, prices: &[f64]) -> Vec<MarketObservation> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| MarketObservation::new(ts(i), symbol, p))
        .collect()
}

/// Two symbols whose ticks alternate minute by minute.
pub fn interleaved(a: (&str, &[f64]), b: (&str, &[f64])) -> Vec<MarketObservation> {
    let mut out = Vec::new();
    for i in 0..a.1.len().max(b.1.len()) {
        if let Some(&p) = a.1.get(i) {
            out.push(MarketObservation::new(ts(2 * i), a.0, p));
        }
        if let Some(&p) = b.1.get(i) {
            out.push(MarketObservation::new(ts(2 * i + 1), b.0, p));
        }
    }
    out
}

/// Deterministic oscillating walk that keeps prices positive.
pub fn wave(n: usize, base: f64) -> Vec<f64> {
    (0..n)
        .map(|i| base + 5.0 * ((i as f64) * 0.7).sin() + ((i * 13) % 7) as f64 * 0.3)
        .collect()
}

pub fn never_fail_config() -> BacktestConfig {
    BacktestConfig {
        failure_probability: 0.0,
        ..BacktestConfig::default()
    }
}

pub fn ticks_csv(ticks: &[MarketObservation]) -> String {
    let mut out = String::from("timestamp,symbol,price\n");
    for t in ticks {
        out.push_str(&format!(
            "{},{},{}\n",
            t.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            t.symbol,
            t.price
        ));
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
