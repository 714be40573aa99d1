//! Market data port trait.

use crate::domain::error::SectraderError;
use crate::domain::market::{MarketRow, Timerange};

pub trait MarketDataPort {
    /// Rows ordered by timestamp without duplicates. Fails with
    /// `DataUnavailable` if the range cannot be supplied.
    fn load(
        &self,
        pair: &str,
        timeframe: &str,
        timerange: &Timerange,
    ) -> Result<Vec<MarketRow>, SectraderError>;
}
