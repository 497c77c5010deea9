use tracing::debug;

use crate::core::Viewport;
use crate::data::{CapacityLimit, MarketDataSource, SeriesStore};
use crate::error::ChartResult;
use crate::render::{GeometryBuilder, Renderer};

use super::{ChartEngine, ChartEngineConfig, ChartState, FrameStats};

impl<R: Renderer, S: MarketDataSource> ChartEngine<R, S> {
    /// Validates `config` and initializes the renderer against its surface.
    ///
    /// A renderer that cannot obtain a graphics context fails construction
    /// with `ContextUnavailable`. No frame is drawn until `display`.
    pub fn new(mut renderer: R, source: S, config: ChartEngineConfig) -> ChartResult<Self> {
        let config = config.validate()?;
        let builder = GeometryBuilder::new(config.style)?;
        renderer.init(config.surface)?;

        let store = match config.cache_capacity {
            Some(capacity) => {
                SeriesStore::with_policy(source, Box::new(CapacityLimit::new(capacity)))
            }
            None => SeriesStore::new(source),
        };
        debug!(
            width = config.surface.width,
            height = config.surface.height,
            cache_capacity = ?config.cache_capacity,
            "chart engine ready"
        );

        Ok(Self {
            renderer,
            store,
            viewport: Viewport::new(config.viewport),
            builder,
            surface: config.surface,
            active: None,
            state: ChartState::Ready { ticker: None },
            stats: FrameStats::default(),
        })
    }
}
