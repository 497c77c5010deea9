use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Half-open candle index range `[left, right)`; never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexWindow {
    left: usize,
    right: usize,
}

impl IndexWindow {
    pub fn new(left: usize, right: usize) -> ChartResult<Self> {
        if left >= right {
            return Err(ChartError::InvalidData(format!(
                "index window requires left < right, got [{left}, {right})"
            )));
        }
        Ok(Self { left, right })
    }

    /// The trailing `width` indices of a series of `len` candles.
    ///
    /// Returns `None` when `len == 0`. `width` is clamped to `[1, len]`.
    #[must_use]
    pub fn trailing(len: usize, width: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let width = width.clamp(1, len);
        Some(Self {
            left: len - width,
            right: len,
        })
    }

    #[must_use]
    pub fn left(self) -> usize {
        self.left
    }

    #[must_use]
    pub fn right(self) -> usize {
        self.right
    }

    #[must_use]
    pub fn width(self) -> usize {
        self.right - self.left
    }

    #[must_use]
    pub fn contains(self, index: usize) -> bool {
        (self.left..self.right).contains(&index)
    }

    #[must_use]
    pub fn as_range(self) -> std::ops::Range<usize> {
        self.left..self.right
    }
}

/// Closed vertical price interval `[min, max]` with `min < max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> ChartResult<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ChartError::InvalidData(format!(
                "price range must be finite with min < max, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    /// Fits a range around `[low, high]`, padding each side by
    /// `margin_ratio * span` and widening degenerate spans to `min_span`.
    ///
    /// `min_span` is raised to a few ulps of the center price so a flat
    /// slice at large magnitudes still yields `min < max`.
    pub fn fit(low: f64, high: f64, margin_ratio: f64, min_span: f64) -> ChartResult<Self> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(ChartError::InvalidData(
                "price extremes must be finite with low <= high".to_owned(),
            ));
        }
        let span = high - low;
        let center = low / 2.0 + high / 2.0;
        let min_span = min_span.max(center.abs() * f64::EPSILON * 4.0);
        if span < min_span {
            let half = min_span / 2.0;
            return Self::new(center - half, center + half);
        }
        let pad = span * margin_ratio;
        Self::new(low - pad, high + pad)
    }

    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }
}
