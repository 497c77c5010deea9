use serde::{Deserialize, Serialize};

use crate::core::BodySizing;
use crate::error::{ChartError, ChartResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(default = "opaque")]
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Vertex attribute layout.
    #[must_use]
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            self.red as f32,
            self.green as f32,
            self.blue as f32,
            self.alpha as f32,
        ]
    }

    pub fn validate(self) -> ChartResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChartError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

fn opaque() -> f64 {
    1.0
}

/// Candle colors and body sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleStyle {
    #[serde(default = "default_up_color")]
    pub up_color: Color,
    #[serde(default = "default_down_color")]
    pub down_color: Color,
    /// Wick color; `None` draws each wick in its body color.
    #[serde(default)]
    pub wick_color: Option<Color>,
    #[serde(default = "default_grid_color")]
    pub grid_color: Color,
    #[serde(default = "default_background_color")]
    pub background_color: Color,
    #[serde(default = "default_body_width_ratio")]
    pub body_width_ratio: f64,
    #[serde(default = "default_min_body_width_px")]
    pub min_body_width_px: f64,
    #[serde(default = "default_min_body_height_px")]
    pub min_body_height_px: f64,
    #[serde(default = "default_show_grid")]
    pub show_grid: bool,
}

impl Default for CandleStyle {
    fn default() -> Self {
        Self {
            up_color: default_up_color(),
            down_color: default_down_color(),
            wick_color: None,
            grid_color: default_grid_color(),
            background_color: default_background_color(),
            body_width_ratio: default_body_width_ratio(),
            min_body_width_px: default_min_body_width_px(),
            min_body_height_px: default_min_body_height_px(),
            show_grid: default_show_grid(),
        }
    }
}

impl CandleStyle {
    #[must_use]
    pub fn body_sizing(self) -> BodySizing {
        BodySizing {
            width_ratio: self.body_width_ratio,
            min_width_px: self.min_body_width_px,
            min_height_px: self.min_body_height_px,
        }
    }

    #[must_use]
    pub fn body_color(self, is_bullish: bool) -> Color {
        if is_bullish {
            self.up_color
        } else {
            self.down_color
        }
    }

    #[must_use]
    pub fn wick_color_for(self, is_bullish: bool) -> Color {
        self.wick_color.unwrap_or_else(|| self.body_color(is_bullish))
    }

    pub fn validate(self) -> ChartResult<Self> {
        self.up_color.validate()?;
        self.down_color.validate()?;
        if let Some(wick) = self.wick_color {
            wick.validate()?;
        }
        self.grid_color.validate()?;
        self.background_color.validate()?;
        self.body_sizing().validate()?;
        Ok(self)
    }
}

fn default_up_color() -> Color {
    Color::rgb(0.1, 0.6, 0.1)
}

fn default_down_color() -> Color {
    Color::rgb(0.9, 0.1, 0.1)
}

fn default_grid_color() -> Color {
    Color::rgb(0.99, 0.99, 0.99)
}

fn default_background_color() -> Color {
    Color::rgb(0.9, 0.9, 0.9)
}

fn default_body_width_ratio() -> f64 {
    0.7
}

fn default_min_body_width_px() -> f64 {
    1.0
}

fn default_min_body_height_px() -> f64 {
    1.0
}

fn default_show_grid() -> bool {
    true
}
