use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{DeviceSurface, PriceSeries, ShiftDirection, Ticker, Viewport};
use crate::data::{MarketDataSource, SeriesStore};
use crate::error::ChartResult;
use crate::render::{GeometryBuffers, GeometryBuilder, Renderer};

/// Lifecycle state of a constructed engine.
///
/// An engine value only exists once its renderer is initialized, so there
/// is no uninitialized variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartState {
    /// `ticker` is the instrument last passed to `display`, if any.
    Ready { ticker: Option<Ticker> },
}

/// Outcome of [`ChartEngine::display`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesStatus {
    Loaded { len: usize },
    /// The instrument could not be loaded; the chart shows an empty window.
    Unavailable { reason: String },
}

/// Counters over every frame the engine has submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameStats {
    pub frames_submitted: u64,
    pub render_failures: u64,
    pub resizes: u64,
    pub last_body_count: usize,
    pub last_grid_line_count: usize,
}

/// Main orchestration facade consumed by host applications.
///
/// `ChartEngine` coordinates the series cache, the viewport and renderer
/// calls. Every public operation runs to completion before returning.
pub struct ChartEngine<R: Renderer, S: MarketDataSource> {
    pub(super) renderer: R,
    pub(super) store: SeriesStore<S>,
    pub(super) viewport: Viewport,
    pub(super) builder: GeometryBuilder,
    pub(super) surface: DeviceSurface,
    pub(super) active: Option<Arc<PriceSeries>>,
    pub(super) state: ChartState,
    pub(super) stats: FrameStats,
}

impl<R: Renderer, S: MarketDataSource> ChartEngine<R, S> {
    /// Switches to `ticker`, resets the viewport to its trailing window and
    /// draws one frame.
    ///
    /// A series that cannot be loaded is not an error: the chart moves to the
    /// empty window and the reason is reported in the returned status. Only
    /// render failures are returned as errors.
    pub fn display(&mut self, ticker: Ticker) -> ChartResult<SeriesStatus> {
        let status = match self.store.load(&ticker) {
            Ok(series) => {
                self.viewport.reset_for(&series);
                let len = series.len();
                self.active = Some(series);
                SeriesStatus::Loaded { len }
            }
            Err(err) => {
                warn!(ticker = %ticker, error = %err, "series unavailable, showing empty window");
                self.viewport.clear();
                self.active = None;
                SeriesStatus::Unavailable {
                    reason: err.to_string(),
                }
            }
        };
        debug!(
            ticker = %ticker,
            status = ?status,
            window = ?self.viewport.window(),
            "display"
        );
        self.state = ChartState::Ready {
            ticker: Some(ticker),
        };
        self.redraw()?;
        Ok(status)
    }

    /// Pans one step and redraws. Returns whether the window moved; at either
    /// edge of the data the window stays put and the frame is still redrawn.
    pub fn shift(&mut self, direction: ShiftDirection) -> ChartResult<bool> {
        let moved = match &self.active {
            Some(series) => self.viewport.shift(direction, series),
            None => false,
        };
        trace!(?direction, moved, window = ?self.viewport.window(), "shift");
        self.redraw()?;
        Ok(moved)
    }

    /// Records the drawable's current pixel size. The renderer is resized
    /// before the next frame is built, whichever operation builds it.
    pub fn set_surface(&mut self, surface: DeviceSurface) -> ChartResult<()> {
        self.surface = surface.validate()?;
        Ok(())
    }

    /// Resizes the renderer if the surface changed, then redraws.
    ///
    /// The visible window is never changed here; only the pixel mapping is
    /// recomputed.
    pub fn draw(&mut self) -> ChartResult<()> {
        self.redraw()
    }

    /// Applies a pending surface change, builds geometry for the current
    /// viewport and submits it.
    pub(super) fn redraw(&mut self) -> ChartResult<()> {
        self.sync_surface()?;
        let buffers = self.build_frame();
        match self.renderer.submit(&buffers) {
            Ok(()) => {
                self.stats.frames_submitted += 1;
                self.stats.last_body_count = buffers.body_count;
                self.stats.last_grid_line_count = buffers.grid_line_count;
                trace!(
                    bodies = buffers.body_count,
                    grid_lines = buffers.grid_line_count,
                    "frame submitted"
                );
                Ok(())
            }
            Err(err) => {
                self.stats.render_failures += 1;
                warn!(error = %err, "frame submission failed, previous frame kept");
                Err(err)
            }
        }
    }

    fn sync_surface(&mut self) -> ChartResult<()> {
        if self.renderer.surface() == Some(self.surface) {
            return Ok(());
        }
        if let Err(err) = self.renderer.resize(self.surface) {
            self.stats.render_failures += 1;
            warn!(
                error = %err,
                width = self.surface.width,
                height = self.surface.height,
                "renderer resize failed"
            );
            return Err(err);
        }
        self.stats.resizes += 1;
        debug!(width = self.surface.width, height = self.surface.height, "surface resized");
        Ok(())
    }

    pub(super) fn build_frame(&self) -> GeometryBuffers {
        match &self.active {
            Some(series) => self.builder.build(series, &self.viewport, self.surface),
            None => GeometryBuffers::empty(self.surface, self.builder.style().background_color),
        }
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
