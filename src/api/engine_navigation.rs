use tracing::debug;

use crate::core::PriceRange;
use crate::data::MarketDataSource;
use crate::error::ChartResult;
use crate::render::Renderer;

use super::ChartEngine;

impl<R: Renderer, S: MarketDataSource> ChartEngine<R, S> {
    /// Zooms to `width` candles anchored at the right edge and redraws.
    ///
    /// Returns `false` when the width did not change (already at the clamp
    /// or no series shown).
    pub fn set_window_width(&mut self, width: usize) -> ChartResult<bool> {
        let changed = match &self.active {
            Some(series) => self.viewport.set_window_width(width, series),
            None => false,
        };
        debug!(width, changed, window = ?self.viewport.window(), "set window width");
        self.redraw()?;
        Ok(changed)
    }

    /// Pins the vertical range, disabling auto-fit until re-enabled.
    pub fn set_price_range(&mut self, range: PriceRange) -> ChartResult<()> {
        self.viewport.set_price_range(range);
        debug!(min = range.min(), max = range.max(), "price range pinned");
        self.redraw()
    }

    /// Re-enables auto-fit and refits to the visible candles.
    pub fn enable_auto_fit(&mut self) -> ChartResult<()> {
        if let Some(series) = &self.active {
            self.viewport.enable_auto_fit(series);
        }
        self.redraw()
    }
}
