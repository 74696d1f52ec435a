//! Market price observation (one tick).

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketObservation {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub price: f64,
    pub volume: Option<f64>,
}

impl MarketObservation {
    pub fn new(timestamp: NaiveDateTime, symbol: impl Into<String>, price: f64) -> Self {
        MarketObservation {
            timestamp,
            symbol: symbol.into(),
            price,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Order ticks by timestamp. Stable, so ties keep their input order.
pub fn sort_observations(observations: &mut [MarketObservation]) {
    observations.sort_by_key(|o| o.timestamp);
}

/// True when timestamps never decrease.
pub fn is_chronological(observations: &[MarketObservation]) -> bool {
    observations
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp)
}
