use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel-geometry")]
use rayon::prelude::*;

use crate::core::{Candle, ViewTransform};
use crate::error::{ChartError, ChartResult};

/// Body sizing in pixels for candle projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySizing {
    /// Body width as a fraction of the candle slot.
    pub width_ratio: f64,
    pub min_width_px: f64,
    /// Dojis (open == close) still get a visible body.
    pub min_height_px: f64,
}

impl BodySizing {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.width_ratio.is_finite() || self.width_ratio <= 0.0 || self.width_ratio > 1.0 {
            return Err(ChartError::InvalidData(
                "body width ratio must be in (0, 1]".to_owned(),
            ));
        }
        if !self.min_width_px.is_finite() || self.min_width_px < 0.0 {
            return Err(ChartError::InvalidData(
                "minimum body width must be finite and >= 0".to_owned(),
            ));
        }
        if !self.min_height_px.is_finite() || self.min_height_px < 0.0 {
            return Err(ChartError::InvalidData(
                "minimum body height must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Projected candle geometry in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleGeometry {
    /// Index of the candle in its series.
    pub index: usize,
    pub center_x: f64,
    pub body_left: f64,
    pub body_right: f64,
    pub body_top: f64,
    pub body_bottom: f64,
    pub wick_top: f64,
    pub wick_bottom: f64,
    pub is_bullish: bool,
}

/// Projects candles into deterministic pixel geometry.
///
/// `first_index` is the series index of `candles[0]`; candle `i` is centered
/// in its slot at `i + 0.5`. Output order always matches input order.
#[must_use]
pub fn project_candles(
    candles: &[Candle],
    first_index: usize,
    transform: &ViewTransform,
    sizing: BodySizing,
) -> Vec<CandleGeometry> {
    #[cfg(feature = "parallel-geometry")]
    {
        candles
            .par_iter()
            .enumerate()
            .map(|(offset, candle)| {
                project_single_candle(candle, first_index + offset, transform, sizing)
            })
            .collect()
    }

    #[cfg(not(feature = "parallel-geometry"))]
    {
        candles
            .iter()
            .enumerate()
            .map(|(offset, candle)| {
                project_single_candle(candle, first_index + offset, transform, sizing)
            })
            .collect()
    }
}

fn project_single_candle(
    candle: &Candle,
    index: usize,
    transform: &ViewTransform,
    sizing: BodySizing,
) -> CandleGeometry {
    let center_x = transform.time_to_x(index as f64 + 0.5);
    let half = (transform.slot_width_px() * sizing.width_ratio).max(sizing.min_width_px) / 2.0;

    let open_y = transform.price_to_y(candle.open);
    let close_y = transform.price_to_y(candle.close);
    let mut body_top = open_y.min(close_y);
    let mut body_bottom = open_y.max(close_y);
    let body_height = body_bottom - body_top;
    if body_height < sizing.min_height_px {
        let grow = (sizing.min_height_px - body_height) / 2.0;
        body_top -= grow;
        body_bottom += grow;
    }

    CandleGeometry {
        index,
        center_x,
        body_left: center_x - half,
        body_right: center_x + half,
        body_top,
        body_bottom,
        wick_top: transform.price_to_y(candle.high),
        wick_bottom: transform.price_to_y(candle.low),
        is_bullish: candle.is_bullish(),
    }
}
