//! CSV tick file adapter.
//!
//! Expects a header row naming `timestamp`, `symbol` and `price` columns, with
//! an optional `volume` column. Column order is free.

use crate::domain::error::TickTraderError;
use crate::domain::observation::MarketObservation;
use crate::ports::data_port::MarketDataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub struct CsvTickAdapter {
    path: PathBuf,
}

impl CsvTickAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MarketDataPort for CsvTickAdapter {
    fn load_observations(&self) -> Result<Vec<MarketObservation>, TickTraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TickTraderError::DataLoad {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        parse_ticks(&content)
    }
}

struct Columns {
    timestamp: usize,
    symbol: usize,
    price: usize,
    volume: Option<usize>,
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, TickTraderError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let require = |name: &str| {
        find(name).ok_or_else(|| TickTraderError::DataLoad {
            reason: format!("missing {name} column"),
        })
    };
    Ok(Columns {
        timestamp: require("timestamp")?,
        symbol: require("symbol")?,
        price: require("price")?,
        volume: find("volume"),
    })
}

pub fn parse_ticks(content: &str) -> Result<Vec<MarketObservation>, TickTraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = rdr.headers().map_err(|e| TickTraderError::DataLoad {
        reason: format!("CSV header error: {e}"),
    })?;
    let cols = locate_columns(headers)?;

    let mut ticks = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| TickTraderError::DataLoad {
            reason: format!("CSV parse error: {e}"),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let bad = |reason: String| TickTraderError::DataLoad {
            reason: format!("line {line}: {reason}"),
        };

        let timestamp = parse_timestamp(record.get(cols.timestamp).unwrap_or(""))
            .ok_or_else(|| bad("invalid timestamp".into()))?;

        let symbol = record.get(cols.symbol).unwrap_or("");
        if symbol.is_empty() {
            return Err(bad("empty symbol".into()));
        }

        let price: f64 = record
            .get(cols.price)
            .unwrap_or("")
            .parse()
            .map_err(|e| bad(format!("invalid price value: {e}")))?;
        if !(price > 0.0) || !price.is_finite() {
            return Err(bad(format!("price must be positive, got {price}")));
        }

        let volume = match cols.volume.and_then(|i| record.get(i)) {
            None | Some("") => None,
            Some(v) => Some(
                v.parse::<f64>()
                    .map_err(|e| bad(format!("invalid volume value: {e}")))?,
            ),
        };

        ticks.push(MarketObservation {
            timestamp,
            symbol: symbol.to_string(),
            price,
            volume,
        });
    }

    Ok(ticks)
}

/// Accepts ISO date-times with `T` or a space, or a bare date at midnight.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
