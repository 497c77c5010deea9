use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::core::{DeviceSurface, ShiftDirection, Ticker};
use crate::data::MarketDataSource;
use crate::error::ChartResult;
use crate::render::Renderer;

use super::{ChartEngine, EngineSnapshot, SeriesStatus};

/// Cloneable handle serializing every entry point behind one lock.
///
/// Hosts whose resize and pan events arrive from different threads share
/// this handle instead of the engine itself.
pub struct SharedChartEngine<R: Renderer, S: MarketDataSource> {
    inner: Arc<Mutex<ChartEngine<R, S>>>,
}

impl<R: Renderer, S: MarketDataSource> Clone for SharedChartEngine<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Renderer, S: MarketDataSource> SharedChartEngine<R, S> {
    #[must_use]
    pub fn new(engine: ChartEngine<R, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn display(&self, ticker: Ticker) -> ChartResult<SeriesStatus> {
        self.lock().display(ticker)
    }

    pub fn shift(&self, direction: ShiftDirection) -> ChartResult<bool> {
        self.lock().shift(direction)
    }

    /// Records the new size and redraws under one lock acquisition.
    pub fn resize_and_draw(&self, surface: DeviceSurface) -> ChartResult<()> {
        let mut engine = self.lock();
        engine.set_surface(surface)?;
        engine.draw()
    }

    pub fn draw(&self) -> ChartResult<()> {
        self.lock().draw()
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.lock().snapshot()
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut ChartEngine<R, S>) -> T) -> T {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, ChartEngine<R, S>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("chart engine lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
