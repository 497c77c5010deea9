pub mod candle;
pub mod candlestick;
pub mod price_grid;
pub mod scale;
pub mod series;
pub mod types;
pub mod viewport;
pub mod window;

pub use candle::Candle;
pub use candlestick::{BodySizing, CandleGeometry, project_candles};
pub use price_grid::{nice_grid_step, price_grid_levels};
pub use scale::LinearScale;
pub use series::PriceSeries;
pub use types::{DeviceSurface, Ticker};
pub use viewport::{ShiftDirection, ShiftStep, ViewTransform, Viewport, ViewportConfig};
pub use window::{IndexWindow, PriceRange};
