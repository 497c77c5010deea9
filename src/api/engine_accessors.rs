use crate::core::{DeviceSurface, PriceSeries, Ticker, Viewport};
use crate::data::{MarketDataSource, SeriesStore};
use crate::render::Renderer;

use super::{ChartEngine, ChartState, FrameStats};

impl<R: Renderer, S: MarketDataSource> ChartEngine<R, S> {
    #[must_use]
    pub fn state(&self) -> &ChartState {
        &self.state
    }

    /// Instrument last passed to `display`.
    #[must_use]
    pub fn ticker(&self) -> Option<&Ticker> {
        let ChartState::Ready { ticker } = &self.state;
        ticker.as_ref()
    }

    /// Series on screen; `None` before `display` or when it was unavailable.
    #[must_use]
    pub fn active_series(&self) -> Option<&PriceSeries> {
        self.active.as_deref()
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Surface size last recorded by `set_surface`.
    #[must_use]
    pub fn surface(&self) -> DeviceSurface {
        self.surface
    }

    #[must_use]
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    #[must_use]
    pub fn store(&self) -> &SeriesStore<S> {
        &self.store
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
