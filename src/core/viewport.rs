use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::core::{DeviceSurface, IndexWindow, LinearScale, PriceRange, PriceSeries};
use crate::error::{ChartError, ChartResult};

/// Pan direction requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftDirection {
    /// Towards older candles.
    Back,
    /// Towards newer candles.
    Forward,
}

impl From<bool> for ShiftDirection {
    /// `true` means forward, matching a "next"/"previous" button pair.
    fn from(forward: bool) -> Self {
        if forward { Self::Forward } else { Self::Back }
    }
}

/// Size of one pan step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ShiftStep {
    /// A fixed number of candles.
    Candles(usize),
    /// A fraction of the current window width, at least one candle.
    WindowFraction(f64),
}

impl ShiftStep {
    #[must_use]
    pub fn resolve(self, window_width: usize) -> usize {
        match self {
            Self::Candles(count) => count.max(1),
            Self::WindowFraction(fraction) => {
                ((fraction * window_width as f64).round() as usize).max(1)
            }
        }
    }
}

/// Window sizing and auto-fit tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_window_candles")]
    pub default_window_candles: usize,
    #[serde(default = "default_shift_step")]
    pub shift_step: ShiftStep,
    #[serde(default = "default_auto_fit")]
    pub auto_fit: bool,
    #[serde(default = "default_auto_fit_margin_ratio")]
    pub auto_fit_margin_ratio: f64,
    #[serde(default = "default_min_price_span")]
    pub min_price_span: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            default_window_candles: default_window_candles(),
            shift_step: default_shift_step(),
            auto_fit: default_auto_fit(),
            auto_fit_margin_ratio: default_auto_fit_margin_ratio(),
            min_price_span: default_min_price_span(),
        }
    }
}

impl ViewportConfig {
    pub fn validate(self) -> ChartResult<Self> {
        if self.default_window_candles == 0 {
            return Err(ChartError::InvalidData(
                "default window must cover at least one candle".to_owned(),
            ));
        }
        match self.shift_step {
            ShiftStep::Candles(0) => {
                return Err(ChartError::InvalidData(
                    "shift step must be at least one candle".to_owned(),
                ));
            }
            ShiftStep::WindowFraction(fraction) if !fraction.is_finite() || fraction <= 0.0 => {
                return Err(ChartError::InvalidData(
                    "shift window fraction must be finite and > 0".to_owned(),
                ));
            }
            _ => {}
        }
        if !self.auto_fit_margin_ratio.is_finite() || self.auto_fit_margin_ratio < 0.0 {
            return Err(ChartError::InvalidData(
                "auto-fit margin ratio must be finite and >= 0".to_owned(),
            ));
        }
        if !self.min_price_span.is_finite() || self.min_price_span <= 0.0 {
            return Err(ChartError::InvalidData(
                "minimum price span must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

fn default_window_candles() -> usize {
    50
}

fn default_shift_step() -> ShiftStep {
    ShiftStep::Candles(1)
}

fn default_auto_fit() -> bool {
    true
}

fn default_auto_fit_margin_ratio() -> f64 {
    0.05
}

fn default_min_price_span() -> f64 {
    1e-6
}

/// Time→x and price→y mappings for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub time: LinearScale,
    pub price: LinearScale,
}

impl ViewTransform {
    /// Maps a (fractional) candle index to x.
    #[must_use]
    pub fn time_to_x(&self, index: f64) -> f64 {
        self.time.to_pixel(index)
    }

    #[must_use]
    pub fn price_to_y(&self, price: f64) -> f64 {
        self.price.to_pixel(price)
    }

    /// Width of one candle slot in pixels.
    #[must_use]
    pub fn slot_width_px(&self) -> f64 {
        self.time.slope()
    }
}

/// The visible window over the active series plus its vertical price range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    config: ViewportConfig,
    window: Option<IndexWindow>,
    price_range: Option<PriceRange>,
    auto_fit: bool,
}

impl Viewport {
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            window: None,
            price_range: None,
            auto_fit: config.auto_fit,
        }
    }

    #[must_use]
    pub fn config(&self) -> ViewportConfig {
        self.config
    }

    #[must_use]
    pub fn window(&self) -> Option<IndexWindow> {
        self.window
    }

    #[must_use]
    pub fn price_range(&self) -> Option<PriceRange> {
        self.price_range
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_none()
    }

    #[must_use]
    pub fn auto_fit(&self) -> bool {
        self.auto_fit
    }

    /// Shows the trailing slice of `series` and fits its price range.
    ///
    /// An empty series yields the empty window. A user-fixed price range is
    /// discarded and auto-fit returns to its configured state.
    pub fn reset_for(&mut self, series: &PriceSeries) {
        self.auto_fit = self.config.auto_fit;
        self.window = IndexWindow::trailing(series.len(), self.config.default_window_candles);
        self.price_range = self.fitted_range(series);
        trace!(
            ticker = %series.ticker(),
            window = ?self.window,
            price_range = ?self.price_range,
            "viewport reset"
        );
    }

    /// Clears the window, used when the active instrument has no data.
    pub fn clear(&mut self) {
        self.window = None;
        self.price_range = None;
        self.auto_fit = self.config.auto_fit;
    }

    /// Pans one step. Returns `false` when already at the bound in `direction`.
    pub fn shift(&mut self, direction: ShiftDirection, series: &PriceSeries) -> bool {
        let Some(window) = self.window else {
            return false;
        };
        let len = series.len();
        let step = self.config.shift_step.resolve(window.width());
        let (left, right) = match direction {
            ShiftDirection::Back => {
                let moved = step.min(window.left());
                (window.left() - moved, window.right() - moved)
            }
            ShiftDirection::Forward => {
                let moved = step.min(len.saturating_sub(window.right()));
                (window.left() + moved, window.right() + moved)
            }
        };
        if left == window.left() {
            return false;
        }
        self.window = IndexWindow::new(left, right).ok();
        self.refit(series);
        true
    }

    /// Changes the window width, keeping the right edge anchored.
    ///
    /// Width is clamped to `[1, series.len()]`. Returns `false` when nothing changed.
    pub fn set_window_width(&mut self, width: usize, series: &PriceSeries) -> bool {
        let Some(window) = self.window else {
            return false;
        };
        let width = width.clamp(1, series.len().max(1));
        if width == window.width() {
            return false;
        }
        let right = window.right().max(width);
        self.window = IndexWindow::new(right - width, right).ok();
        self.refit(series);
        true
    }

    /// Fixes the vertical range and disables auto-fit.
    pub fn set_price_range(&mut self, range: PriceRange) {
        self.auto_fit = false;
        self.price_range = Some(range);
    }

    pub fn enable_auto_fit(&mut self, series: &PriceSeries) {
        self.auto_fit = true;
        self.refit(series);
    }

    /// Builds the pixel mappings for `surface`. `None` for the empty window.
    #[must_use]
    pub fn transform(&self, surface: DeviceSurface) -> Option<ViewTransform> {
        let window = self.window?;
        let range = self.price_range?;
        let time = LinearScale::new(
            window.left() as f64,
            window.right() as f64,
            0.0,
            f64::from(surface.width),
        )
        .ok()?;
        let price = LinearScale::new(range.min(), range.max(), f64::from(surface.height), 0.0).ok()?;
        Some(ViewTransform { time, price })
    }

    fn refit(&mut self, series: &PriceSeries) {
        if self.auto_fit {
            self.price_range = self.fitted_range(series);
        }
    }

    fn fitted_range(&self, series: &PriceSeries) -> Option<PriceRange> {
        let (low, high) = series.price_extent(self.window?)?;
        match PriceRange::fit(
            low,
            high,
            self.config.auto_fit_margin_ratio,
            self.config.min_price_span,
        ) {
            Ok(range) => Some(range),
            Err(err) => {
                warn!(
                    ticker = %series.ticker(),
                    low,
                    high,
                    error = %err,
                    "price range fit failed, keeping previous range"
                );
                self.price_range
            }
        }
    }
}
