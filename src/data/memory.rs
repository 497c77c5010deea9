use indexmap::IndexMap;

use crate::core::{Candle, Ticker};
use crate::data::MarketDataSource;
use crate::error::{ChartError, ChartResult};

/// Provider backed by candles the host already holds in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    series: IndexMap<Ticker, Vec<Candle>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_series(mut self, ticker: Ticker, candles: Vec<Candle>) -> Self {
        self.insert(ticker, candles);
        self
    }

    pub fn insert(&mut self, ticker: Ticker, candles: Vec<Candle>) {
        self.series.insert(ticker, candles);
    }

    #[must_use]
    pub fn tickers(&self) -> Vec<&Ticker> {
        self.series.keys().collect()
    }
}

impl MarketDataSource for MemorySource {
    fn fetch(&self, ticker: &Ticker) -> ChartResult<Vec<Candle>> {
        self.series
            .get(ticker)
            .cloned()
            .ok_or_else(|| ChartError::data_unavailable(ticker.as_str(), "unknown ticker"))
    }
}
