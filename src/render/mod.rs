mod geometry;
mod null_renderer;
mod style;

pub use geometry::{GeometryBuffers, GeometryBuilder, Vertex};
pub use null_renderer::{FrameRecord, NullRenderer};
pub use style::{CandleStyle, Color};

use crate::core::DeviceSurface;
use crate::error::ChartResult;

/// Contract implemented by any rendering backend.
///
/// Backends receive fully built, deterministic [`GeometryBuffers`] so drawing
/// code stays isolated from series and viewport logic. The backend owns its
/// graphics context for its whole lifetime.
pub trait Renderer {
    /// Acquires the graphics context. Failure is `ContextUnavailable`.
    fn init(&mut self, surface: DeviceSurface) -> ChartResult<()>;

    /// Adapts the target to a new pixel size; a no-op for unchanged sizes.
    fn resize(&mut self, surface: DeviceSurface) -> ChartResult<()>;

    /// Clears to `buffers.clear_color` and draws one frame.
    ///
    /// On `RenderFailure` the previously presented frame stays on screen.
    fn submit(&mut self, buffers: &GeometryBuffers) -> ChartResult<()>;

    /// Current target size, `None` before `init`.
    fn surface(&self) -> Option<DeviceSurface>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn init(&mut self, surface: DeviceSurface) -> ChartResult<()> {
        (**self).init(surface)
    }

    fn resize(&mut self, surface: DeviceSurface) -> ChartResult<()> {
        (**self).resize(surface)
    }

    fn submit(&mut self, buffers: &GeometryBuffers) -> ChartResult<()> {
        (**self).submit(buffers)
    }

    fn surface(&self) -> Option<DeviceSurface> {
        (**self).surface()
    }
}

#[cfg(feature = "wgpu-backend")]
mod wgpu_backend;
#[cfg(feature = "wgpu-backend")]
pub use wgpu_backend::{WgpuRenderStats, WgpuRenderer};
