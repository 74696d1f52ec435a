//! Market data port trait.

use crate::domain::error::TickTraderError;
use crate::domain::observation::MarketObservation;

pub trait MarketDataPort {
    /// Every observation the source holds, in source order.
    fn load_observations(&self) -> Result<Vec<MarketObservation>, TickTraderError>;
}
