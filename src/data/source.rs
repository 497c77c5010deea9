//! Market-data provider seam.

use crate::core::{Candle, Ticker};
use crate::error::ChartResult;

/// Opaque provider of candle history for a ticker.
///
/// Implementations may block (network, disk). Failures should be reported as
/// `ChartError::DataUnavailable`; any other error kind is converted by the
/// store. Candles do not need to be sorted or deduplicated.
pub trait MarketDataSource {
    fn fetch(&self, ticker: &Ticker) -> ChartResult<Vec<Candle>>;
}

impl<F> MarketDataSource for F
where
    F: Fn(&Ticker) -> ChartResult<Vec<Candle>>,
{
    fn fetch(&self, ticker: &Ticker) -> ChartResult<Vec<Candle>> {
        self(ticker)
    }
}
