//! CSV report adapter.
//!
//! Writes the equity series to the requested path and the audit trail to a
//! sibling `<stem>.trades.csv`.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TickTraderError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Serialize)]
struct EquityRow {
    timestamp: String,
    equity: f64,
}

#[derive(Serialize)]
struct TradeRow<'a> {
    event: String,
    timestamp: String,
    strategy: &'a str,
    symbol: &'a str,
    signed_quantity: f64,
    price: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    pub fn trades_path(output_path: &Path) -> PathBuf {
        output_path.with_extension("trades.csv")
    }
}

fn report_err(path: &Path, e: impl std::fmt::Display) -> TickTraderError {
    TickTraderError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), TickTraderError> {
        let mut equity = csv::Writer::from_path(output_path).map_err(|e| report_err(output_path, e))?;
        for point in &result.equity_curve {
            equity
                .serialize(EquityRow {
                    timestamp: point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    equity: point.equity,
                })
                .map_err(|e| report_err(output_path, e))?;
        }
        equity.flush().map_err(|e| report_err(output_path, e))?;

        let trades_path = Self::trades_path(output_path);
        let mut trades =
            csv::Writer::from_path(&trades_path).map_err(|e| report_err(&trades_path, e))?;
        for entry in result.context.trade_log() {
            trades
                .serialize(TradeRow {
                    event: entry.event.to_string(),
                    timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    strategy: &entry.strategy,
                    symbol: &entry.symbol,
                    signed_quantity: entry.signed_quantity,
                    price: entry.price,
                })
                .map_err(|e| report_err(&trades_path, e))?;
        }
        trades.flush().map_err(|e| report_err(&trades_path, e))?;

        tracing::info!(
            equity = %output_path.display(),
            trades = %trades_path.display(),
            "report written"
        );
        Ok(())
    }
}
