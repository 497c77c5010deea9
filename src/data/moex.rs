//! Daily share history from the Moscow Exchange ISS API.
//!
//! `parse_history` is always available so recorded responses can be replayed;
//! the HTTP client lives behind the `moex-source` feature.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::core::Candle;
use crate::error::{ChartError, ChartResult};

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: HistoryBlock,
}

#[derive(Debug, Deserialize)]
struct HistoryBlock {
    columns: Vec<String>,
    data: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnLayout {
    fn locate(columns: &[String]) -> Result<Self, String> {
        let find = |name: &str| {
            columns
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| format!("history response has no `{name}` column"))
        };
        Ok(Self {
            date: find("TRADEDATE")?,
            open: find("OPEN")?,
            high: find("HIGH")?,
            low: find("LOW")?,
            close: find("CLOSE")?,
            volume: find("VOLUME")?,
        })
    }
}

/// Parses one ISS `history` page into candles.
///
/// Rows with missing prices (non-trading days report `null`) or prices that
/// break the OHLC invariant are skipped.
pub fn parse_history(ticker: &str, body: &str) -> ChartResult<Vec<Candle>> {
    parse_history_page(ticker, body).map(|page| page.candles)
}

/// Candles of one page plus the raw row count, which drives `start=` paging.
#[derive(Debug)]
pub(crate) struct HistoryPage {
    pub(crate) candles: Vec<Candle>,
    #[cfg_attr(not(feature = "moex-source"), allow(dead_code))]
    pub(crate) rows: usize,
}

pub(crate) fn parse_history_page(ticker: &str, body: &str) -> ChartResult<HistoryPage> {
    let response: HistoryResponse = serde_json::from_str(body).map_err(|err| {
        ChartError::data_unavailable(ticker, format!("malformed history response: {err}"))
    })?;
    let layout = ColumnLayout::locate(&response.history.columns)
        .map_err(|reason| ChartError::data_unavailable(ticker, reason))?;

    let rows = response.history.data.len();
    let mut candles = Vec::with_capacity(rows);
    let mut skipped = 0_usize;
    for row in &response.history.data {
        match parse_row(row, layout) {
            Some(candle) => candles.push(candle),
            None => skipped += 1,
        }
    }
    trace!(ticker, parsed = candles.len(), skipped, "parsed history page");
    Ok(HistoryPage { candles, rows })
}

fn parse_row(row: &[Value], layout: ColumnLayout) -> Option<Candle> {
    let time = parse_trade_date(row.get(layout.date)?)?;
    Candle::new(
        time,
        number(row.get(layout.open)?)?,
        number(row.get(layout.high)?)?,
        number(row.get(layout.low)?)?,
        number(row.get(layout.close)?)?,
        number(row.get(layout.volume)?)?,
    )
    .ok()
}

fn parse_trade_date(value: &Value) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.as_str()?, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64()
}

#[cfg(feature = "moex-source")]
pub use client::MoexSource;

#[cfg(feature = "moex-source")]
mod client {
    use std::time::Duration;

    use chrono::NaiveDate;
    use tracing::debug;

    use super::parse_history_page;
    use crate::core::{Candle, Ticker};
    use crate::data::MarketDataSource;
    use crate::error::{ChartError, ChartResult};

    const ISS_BASE_URL: &str =
        "https://iss.moex.com/iss/history/engines/stock/markets/shares/boards/tqbr/securities";
    const MAX_PAGES: usize = 50;

    /// Blocking MOEX ISS provider for TQBR board shares.
    #[derive(Debug, Clone)]
    pub struct MoexSource {
        client: reqwest::blocking::Client,
        from: NaiveDate,
    }

    impl MoexSource {
        pub fn new(from: NaiveDate) -> ChartResult<Self> {
            Self::with_timeout(from, Duration::from_secs(12))
        }

        pub fn with_timeout(from: NaiveDate, timeout: Duration) -> ChartResult<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| ChartError::InvalidData(format!("http client error: {err}")))?;
            Ok(Self { client, from })
        }

        fn fetch_page(&self, ticker: &Ticker, start: usize) -> ChartResult<String> {
            let url = format!(
                "{ISS_BASE_URL}/{ticker}.json?from={}&start={start}",
                self.from.format("%Y-%m-%d")
            );
            self.client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.text())
                .map_err(|err| {
                    ChartError::data_unavailable(ticker.as_str(), format!("iss request error: {err}"))
                })
        }
    }

    impl MarketDataSource for MoexSource {
        fn fetch(&self, ticker: &Ticker) -> ChartResult<Vec<Candle>> {
            let mut candles = Vec::new();
            let mut start = 0_usize;
            for _ in 0..MAX_PAGES {
                let body = self.fetch_page(ticker, start)?;
                let page = parse_history_page(ticker.as_str(), &body)?;
                if page.rows == 0 {
                    break;
                }
                start += page.rows;
                candles.extend(page.candles);
            }
            debug!(ticker = %ticker, candles = candles.len(), "fetched iss history");
            if candles.is_empty() {
                return Err(ChartError::data_unavailable(
                    ticker.as_str(),
                    "iss returned no trading history",
                ));
            }
            Ok(candles)
        }
    }
}
