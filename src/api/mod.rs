mod engine;
mod engine_accessors;
mod engine_config;
mod engine_init;
mod engine_navigation;
mod engine_snapshot;
mod shared;

pub use engine::{ChartEngine, ChartState, FrameStats, SeriesStatus};
pub use engine_config::ChartEngineConfig;
pub use engine_snapshot::EngineSnapshot;
pub use shared::SharedChartEngine;
