use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::core::{DeviceSurface, ShiftStep, ViewportConfig};
use crate::error::{ChartError, ChartResult};
use crate::render::CandleStyle;

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load chart setup
/// without inventing their own ad-hoc format. Every field has a default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartEngineConfig {
    /// Initial drawable size handed to `Renderer::init`.
    #[serde(default = "default_surface")]
    pub surface: DeviceSurface,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub style: CandleStyle,
    /// Maximum cached instruments; `None` keeps every loaded series.
    #[serde(default)]
    pub cache_capacity: Option<NonZeroUsize>,
}

impl Default for ChartEngineConfig {
    fn default() -> Self {
        Self::new(default_surface())
    }
}

impl ChartEngineConfig {
    #[must_use]
    pub fn new(surface: DeviceSurface) -> Self {
        Self {
            surface,
            viewport: ViewportConfig::default(),
            style: CandleStyle::default(),
            cache_capacity: None,
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }

    /// Sets how many trailing candles `display` shows.
    #[must_use]
    pub fn with_default_window_candles(mut self, candles: usize) -> Self {
        self.viewport.default_window_candles = candles;
        self
    }

    #[must_use]
    pub fn with_shift_step(mut self, step: ShiftStep) -> Self {
        self.viewport.shift_step = step;
        self
    }

    #[must_use]
    pub fn with_auto_fit(mut self, enabled: bool) -> Self {
        self.viewport.auto_fit = enabled;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: CandleStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    pub fn validate(self) -> ChartResult<Self> {
        self.surface.validate()?;
        self.viewport.validate()?;
        self.style.validate()?;
        Ok(self)
    }

    /// Serializes config to pretty JSON for debug/config files.
    pub fn to_json_pretty(self) -> ChartResult<String> {
        serde_json::to_string_pretty(&self)
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Deserializes config from JSON.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ChartError::InvalidData(format!("failed to parse config: {e}")))
    }
}

fn default_surface() -> DeviceSurface {
    DeviceSurface::new(800, 600)
}
