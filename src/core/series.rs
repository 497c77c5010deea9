use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use tracing::warn;

use crate::core::{Candle, IndexWindow, Ticker};
use crate::error::{ChartError, ChartResult};

/// Time-ordered candles for one instrument. Immutable once built.
///
/// Live appends are not supported; a streaming feed would build a new series
/// or extend this type with an append that preserves the ordering invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: Ticker,
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Builds a series from candles that are already strictly ordered by time.
    pub fn new(ticker: Ticker, candles: Vec<Candle>) -> ChartResult<Self> {
        for (index, candle) in candles.iter().enumerate() {
            candle.validate().map_err(|err| {
                ChartError::InvalidData(format!("{ticker} candle #{index}: {err}"))
            })?;
        }
        if let Some(index) = candles
            .windows(2)
            .position(|pair| pair[0].time >= pair[1].time)
        {
            return Err(ChartError::InvalidData(format!(
                "{ticker} candles must be strictly ordered by time (violation at #{})",
                index + 1
            )));
        }
        Ok(Self { ticker, candles })
    }

    /// Builds a series from provider output: drops invalid candles, sorts by
    /// time and keeps the last candle of each duplicated timestamp.
    #[must_use]
    pub fn canonicalize(ticker: Ticker, mut candles: Vec<Candle>) -> Self {
        let original_len = candles.len();
        candles.retain(Candle::is_valid);
        candles.sort_by(|a, b| a.time.cmp(&b.time));

        let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
        let mut duplicate_count = 0_usize;
        for candle in candles {
            if let Some(last) = deduped.last_mut() {
                if candle.time.cmp(&last.time) == Ordering::Equal {
                    *last = candle;
                    duplicate_count += 1;
                    continue;
                }
            }
            deduped.push(candle);
        }

        let filtered_count = original_len.saturating_sub(deduped.len() + duplicate_count);
        if filtered_count > 0 || duplicate_count > 0 {
            warn!(
                ticker = %ticker,
                filtered_count,
                duplicate_count,
                canonical_count = deduped.len(),
                "canonicalized provider candles"
            );
        }
        Self {
            ticker,
            candles: deduped,
        }
    }

    #[must_use]
    pub fn empty(ticker: Ticker) -> Self {
        Self {
            ticker,
            candles: Vec::new(),
        }
    }

    #[must_use]
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    #[must_use]
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Candles covered by `window`, truncated to the series length.
    #[must_use]
    pub fn window(&self, window: IndexWindow) -> &[Candle] {
        let right = window.right().min(self.candles.len());
        let left = window.left().min(right);
        &self.candles[left..right]
    }

    /// Lowest low and highest high inside `window`.
    #[must_use]
    pub fn price_extent(&self, window: IndexWindow) -> Option<(f64, f64)> {
        let slice = self.window(window);
        let low = slice.iter().map(|c| OrderedFloat(c.low)).min()?;
        let high = slice.iter().map(|c| OrderedFloat(c.high)).max()?;
        Some((low.into_inner(), high.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle(day: i64, low: f64, high: f64) -> Candle {
        let time = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(day);
        Candle::new(time, low, high, low, high, 10.0).expect("valid candle")
    }

    fn ticker() -> Ticker {
        Ticker::new("GAZP").expect("ticker")
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let result = PriceSeries::new(ticker(), vec![candle(0, 1.0, 2.0), candle(0, 1.0, 3.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_descending_timestamps() {
        let result = PriceSeries::new(ticker(), vec![candle(1, 1.0, 2.0), candle(0, 1.0, 3.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn canonicalize_sorts_and_keeps_last_duplicate() {
        let mut broken = candle(3, 5.0, 6.0);
        broken.high = 1.0;
        let series = PriceSeries::canonicalize(
            ticker(),
            vec![
                candle(2, 1.0, 2.0),
                candle(1, 1.0, 2.0),
                broken,
                candle(2, 7.0, 9.0),
            ],
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series.candles()[1].high, 9.0);
        assert!(series.candles()[0].time < series.candles()[1].time);
    }

    #[test]
    fn price_extent_covers_window_only() {
        let series = PriceSeries::new(
            ticker(),
            vec![candle(0, 1.0, 50.0), candle(1, 10.0, 20.0), candle(2, 12.0, 18.0)],
        )
        .expect("series");
        let window = IndexWindow::new(1, 3).expect("window");
        assert_eq!(series.price_extent(window), Some((10.0, 20.0)));
    }
}
