use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

const MAX_TICKER_LEN: usize = 32;

/// Pixel dimensions of the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceSurface {
    pub width: u32,
    pub height: u32,
}

impl DeviceSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn validate(self) -> ChartResult<Self> {
        if !self.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// Instrument identity: a short ticker symbol such as `GAZP` or `BTC-USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> ChartResult<Self> {
        let symbol = symbol.into();
        if symbol.is_empty() || symbol.len() > MAX_TICKER_LEN {
            return Err(ChartError::InvalidData(format!(
                "ticker must be 1..={MAX_TICKER_LEN} bytes, got {}",
                symbol.len()
            )));
        }
        if let Some(bad) = symbol
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_')))
        {
            return Err(ChartError::InvalidData(format!(
                "ticker `{symbol}` contains unsupported character `{bad}`"
            )));
        }
        Ok(Self(symbol))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = ChartError;

    fn try_from(value: String) -> ChartResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ChartError;

    fn try_from(value: &str) -> ChartResult<Self> {
        Self::new(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}
