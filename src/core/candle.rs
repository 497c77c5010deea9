use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// One fixed-duration OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Builds a validated candle.
    ///
    /// Invariants:
    /// - all prices and the volume are finite
    /// - `volume >= 0`
    /// - `low <= min(open, close) <= max(open, close) <= high`
    pub fn new(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> ChartResult<Self> {
        let candle = Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Converts decimal quotes (as delivered by most exchanges) into a validated candle.
    pub fn from_decimal(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> ChartResult<Self> {
        Self::new(
            time,
            decimal_field(open, "open")?,
            decimal_field(high, "high")?,
            decimal_field(low, "low")?,
            decimal_field(close, "close")?,
            decimal_field(volume, "volume")?,
        )
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.open.is_finite()
            || !self.high.is_finite()
            || !self.low.is_finite()
            || !self.close.is_finite()
            || !self.volume.is_finite()
        {
            return Err(ChartError::InvalidData(
                "candle values must be finite".to_owned(),
            ));
        }
        if self.volume < 0.0 {
            return Err(ChartError::InvalidData(
                "candle volume must be >= 0".to_owned(),
            ));
        }
        if self.low > self.body_low() || self.body_high() > self.high {
            return Err(ChartError::InvalidData(
                "candle open/close must be within low/high range".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns `true` when close price is greater than or equal to open price.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    #[must_use]
    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    #[must_use]
    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }
}

fn decimal_field(value: Decimal, field: &str) -> ChartResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| ChartError::InvalidData(format!("candle {field} {value} overflows f64")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 12, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn rejects_open_above_high() {
        assert!(Candle::new(at(1), 120.0, 110.0, 90.0, 100.0, 1.0).is_err());
    }

    #[test]
    fn rejects_close_below_low() {
        assert!(Candle::new(at(1), 100.0, 110.0, 90.0, 80.0, 1.0).is_err());
    }

    #[test]
    fn rejects_negative_volume_and_nan() {
        assert!(Candle::new(at(1), 100.0, 110.0, 90.0, 100.0, -1.0).is_err());
        assert!(Candle::new(at(1), f64::NAN, 110.0, 90.0, 100.0, 1.0).is_err());
    }

    #[test]
    fn flat_candle_is_valid_and_bullish() {
        let candle = Candle::new(at(2), 100.0, 100.0, 100.0, 100.0, 0.0).expect("flat candle");
        assert!(candle.is_bullish());
        assert_eq!(candle.body_low(), candle.body_high());
    }

    #[test]
    fn decimal_input_is_converted() {
        let candle = Candle::from_decimal(
            at(3),
            Decimal::new(16_150, 2),
            Decimal::new(16_300, 2),
            Decimal::new(15_990, 2),
            Decimal::new(16_010, 2),
            Decimal::new(1_000, 0),
        )
        .expect("decimal candle");
        assert_eq!(candle.open, 161.5);
        assert!(!candle.is_bullish());
    }
}
