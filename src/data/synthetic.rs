use chrono::{DateTime, Duration, TimeZone, Utc};
use indexmap::IndexSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{Candle, Ticker};
use crate::data::MarketDataSource;
use crate::error::{ChartError, ChartResult};

/// Deterministic random-walk candles for a fixed ticker universe.
///
/// The same ticker, seed and length always produce the same series, which
/// makes this source suitable for demos, benchmarks and tests. Tickers outside
/// the universe fail with `DataUnavailable`.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    universe: IndexSet<Ticker>,
    candle_count: usize,
    seed: u64,
    start: DateTime<Utc>,
    interval: Duration,
    volatility: f64,
}

impl SyntheticSource {
    pub fn new<I, T>(tickers: I) -> ChartResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let universe = tickers
            .into_iter()
            .map(|symbol| Ticker::new(symbol.as_ref()))
            .collect::<ChartResult<IndexSet<_>>>()?;
        Ok(Self {
            universe,
            candle_count: 250,
            seed: 0x5eed,
            start: Utc
                .with_ymd_and_hms(2022, 12, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            interval: Duration::days(1),
            volatility: 0.02,
        })
    }

    #[must_use]
    pub fn with_candle_count(mut self, candle_count: usize) -> Self {
        self.candle_count = candle_count;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_start(mut self, start: DateTime<Utc>, interval: Duration) -> Self {
        self.start = start;
        self.interval = interval;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> ChartResult<Self> {
        if !volatility.is_finite() || !(0.0..0.5).contains(&volatility) {
            return Err(ChartError::InvalidData(
                "synthetic volatility must be in [0, 0.5)".to_owned(),
            ));
        }
        self.volatility = volatility;
        Ok(self)
    }

    #[must_use]
    pub fn universe(&self) -> &IndexSet<Ticker> {
        &self.universe
    }

    fn ticker_seed(&self, ticker: &Ticker) -> u64 {
        // FNV-1a keeps seeds stable across toolchains, unlike `DefaultHasher`.
        ticker
            .as_str()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            })
            ^ self.seed
    }
}

impl MarketDataSource for SyntheticSource {
    fn fetch(&self, ticker: &Ticker) -> ChartResult<Vec<Candle>> {
        if !self.universe.contains(ticker) {
            return Err(ChartError::data_unavailable(
                ticker.as_str(),
                "ticker is not part of the synthetic universe",
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.ticker_seed(ticker));
        let mut close: f64 = rng.gen_range(20.0..500.0);
        let mut candles = Vec::with_capacity(self.candle_count);
        for index in 0..self.candle_count {
            let open = close;
            close = (open * (1.0 + rng.gen_range(-1.0..1.0) * self.volatility)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..1.0) * self.volatility / 2.0);
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..1.0) * self.volatility / 2.0);
            let volume = rng.gen_range(1_000.0..100_000.0_f64).round();
            let time = self.start + self.interval * index as i32;
            candles.push(Candle::new(time, open, high, low, close, volume)?);
        }
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_ticker_yields_identical_series() {
        let source = SyntheticSource::new(["GAZP", "SBER"]).expect("source");
        let ticker = Ticker::new("GAZP").expect("ticker");
        assert_eq!(
            source.fetch(&ticker).expect("first"),
            source.fetch(&ticker).expect("second")
        );
    }

    #[test]
    fn different_tickers_diverge() {
        let source = SyntheticSource::new(["GAZP", "SBER"]).expect("source");
        let a = source.fetch(&Ticker::new("GAZP").expect("ticker")).expect("a");
        let b = source.fetch(&Ticker::new("SBER").expect("ticker")).expect("b");
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_ticker_is_unavailable() {
        let source = SyntheticSource::new(["GAZP"]).expect("source");
        let err = source
            .fetch(&Ticker::new("UNKNOWN").expect("ticker"))
            .expect_err("unknown ticker");
        assert!(matches!(err, ChartError::DataUnavailable { .. }));
    }

    #[test]
    fn generated_candles_are_valid_and_ordered() {
        let source = SyntheticSource::new(["LKOH"])
            .expect("source")
            .with_candle_count(120);
        let candles = source.fetch(&Ticker::new("LKOH").expect("ticker")).expect("candles");
        assert_eq!(candles.len(), 120);
        assert!(candles.iter().all(Candle::is_valid));
        assert!(candles.windows(2).all(|pair| pair[0].time < pair[1].time));
    }
}
