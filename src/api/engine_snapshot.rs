use serde::{Deserialize, Serialize};

use crate::core::{CandleGeometry, DeviceSurface, IndexWindow, PriceRange};
use crate::data::MarketDataSource;
use crate::error::{ChartError, ChartResult};
use crate::render::Renderer;

use super::{ChartEngine, FrameStats};

/// Serializable deterministic state snapshot used by regression tests and
/// debugging tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub ticker: Option<String>,
    pub surface: DeviceSurface,
    pub series_len: usize,
    pub window: Option<IndexWindow>,
    pub price_range: Option<PriceRange>,
    pub auto_fit: bool,
    pub candle_geometry: Vec<CandleGeometry>,
    pub cached_tickers: Vec<String>,
    pub frame_stats: FrameStats,
}

impl EngineSnapshot {
    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize snapshot: {e}")))
    }
}

impl<R: Renderer, S: MarketDataSource> ChartEngine<R, S> {
    /// Captures the current logical state and the geometry of the next frame.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            ticker: self.ticker().map(ToString::to_string),
            surface: self.surface,
            series_len: self.active.as_ref().map_or(0, |series| series.len()),
            window: self.viewport.window(),
            price_range: self.viewport.price_range(),
            auto_fit: self.viewport.auto_fit(),
            candle_geometry: self.build_frame().candles,
            cached_tickers: self.store.tickers().map(ToString::to_string).collect(),
            frame_stats: self.stats,
        }
    }
}
