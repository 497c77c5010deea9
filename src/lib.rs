//! tradechart: GPU-driven candlestick chart engine.
//!
//! The host constructs a [`ChartEngine`] once, tells it which instrument to
//! display, forwards pan gestures and forwards resize/redraw requests. Series
//! are loaded through a [`data::MarketDataSource`] and cached per ticker;
//! frames are built as deterministic vertex/index buffers and submitted to a
//! [`render::Renderer`].

pub mod api;
pub mod core;
pub mod data;
pub mod error;
pub mod render;
pub mod telemetry;

pub use api::{
    ChartEngine, ChartEngineConfig, ChartState, EngineSnapshot, FrameStats, SeriesStatus,
    SharedChartEngine,
};
pub use core::{Candle, DeviceSurface, PriceSeries, ShiftDirection, Ticker};
pub use error::{ChartError, ChartResult};
