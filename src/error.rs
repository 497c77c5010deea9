use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    /// The platform could not provide a graphics context. Fatal at construction.
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),

    /// The data source could not produce a series for the ticker.
    #[error("data unavailable for `{ticker}`: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    /// Uploading or drawing one frame failed; the previous frame stays visible.
    #[error("render failure: {0}")]
    RenderFailure(String),

    #[error("invalid surface size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl ChartError {
    pub(crate) fn data_unavailable(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures the engine recovers from without tearing down.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ContextUnavailable(_))
    }
}
