use crate::core::DeviceSurface;
use crate::error::{ChartError, ChartResult};
use crate::render::{Color, GeometryBuffers, Renderer};

/// Summary of one frame accepted by [`NullRenderer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRecord {
    pub surface: DeviceSurface,
    pub clear_color: Color,
    pub body_count: usize,
    pub wick_count: usize,
    pub grid_line_count: usize,
    pub vertex_count: usize,
    /// `true` when the vertex and index bytes matched the previous upload.
    pub reused_upload: bool,
}

/// Headless renderer used by tests and embedders without a GPU.
///
/// It still validates buffers so tests catch broken geometry before a real
/// backend sees it, and it can be told to fail to exercise recovery paths.
#[derive(Debug, Default)]
pub struct NullRenderer {
    surface: Option<DeviceSurface>,
    frames: Vec<FrameRecord>,
    last_upload: Option<GeometryBuffers>,
    resize_count: usize,
    fail_init: bool,
    pending_submit_failures: usize,
}

impl NullRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer whose `init` reports an unavailable context.
    #[must_use]
    pub fn without_context() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Makes the next `count` submissions fail with `RenderFailure`.
    pub fn fail_next_submits(&mut self, count: usize) {
        self.pending_submit_failures = count;
    }

    #[must_use]
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// The frame currently on screen.
    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Buffers of the frame currently on screen.
    #[must_use]
    pub fn last_buffers(&self) -> Option<&GeometryBuffers> {
        self.last_upload.as_ref()
    }

    #[must_use]
    pub fn resize_count(&self) -> usize {
        self.resize_count
    }
}

impl Renderer for NullRenderer {
    fn init(&mut self, surface: DeviceSurface) -> ChartResult<()> {
        if self.fail_init {
            return Err(ChartError::ContextUnavailable(
                "null renderer configured without a context".to_owned(),
            ));
        }
        self.surface = Some(surface.validate()?);
        Ok(())
    }

    fn resize(&mut self, surface: DeviceSurface) -> ChartResult<()> {
        if self.surface == Some(surface) {
            return Ok(());
        }
        self.surface = Some(surface.validate()?);
        self.resize_count += 1;
        Ok(())
    }

    fn submit(&mut self, buffers: &GeometryBuffers) -> ChartResult<()> {
        if self.pending_submit_failures > 0 {
            self.pending_submit_failures -= 1;
            return Err(ChartError::RenderFailure(
                "injected submit failure".to_owned(),
            ));
        }
        if self.surface.is_none() {
            return Err(ChartError::RenderFailure(
                "submit before init".to_owned(),
            ));
        }
        buffers
            .validate()
            .map_err(|err| ChartError::RenderFailure(err.to_string()))?;

        let reused_upload = self.last_upload.as_ref().is_some_and(|previous| {
            previous.vertex_bytes() == buffers.vertex_bytes()
                && previous.triangle_index_bytes() == buffers.triangle_index_bytes()
                && previous.line_index_bytes() == buffers.line_index_bytes()
        });
        self.frames.push(FrameRecord {
            surface: buffers.surface,
            clear_color: buffers.clear_color,
            body_count: buffers.body_count,
            wick_count: buffers.wick_count,
            grid_line_count: buffers.grid_line_count,
            vertex_count: buffers.vertices.len(),
            reused_upload,
        });
        if !reused_upload {
            self.last_upload = Some(buffers.clone());
        }
        Ok(())
    }

    fn surface(&self) -> Option<DeviceSurface> {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers() -> GeometryBuffers {
        GeometryBuffers::empty(DeviceSurface::new(640, 480), Color::rgb(0.9, 0.9, 0.9))
    }

    #[test]
    fn init_failure_is_context_unavailable() {
        let mut renderer = NullRenderer::without_context();
        let err = renderer
            .init(DeviceSurface::new(640, 480))
            .expect_err("no context");
        assert!(matches!(err, ChartError::ContextUnavailable(_)));
    }

    #[test]
    fn resize_is_idempotent() {
        let mut renderer = NullRenderer::new();
        renderer.init(DeviceSurface::new(640, 480)).expect("init");
        renderer.resize(DeviceSurface::new(640, 480)).expect("same size");
        assert_eq!(renderer.resize_count(), 0);
        renderer.resize(DeviceSurface::new(800, 600)).expect("resize");
        renderer.resize(DeviceSurface::new(800, 600)).expect("same size");
        assert_eq!(renderer.resize_count(), 1);
    }

    #[test]
    fn failed_submit_keeps_previous_frame() {
        let mut renderer = NullRenderer::new();
        renderer.init(DeviceSurface::new(640, 480)).expect("init");
        renderer.submit(&buffers()).expect("first frame");
        renderer.fail_next_submits(1);

        let err = renderer.submit(&buffers()).expect_err("injected");
        assert!(matches!(err, ChartError::RenderFailure(_)));
        assert_eq!(renderer.frame_count(), 1);

        renderer.submit(&buffers()).expect("recovered");
        assert_eq!(renderer.frame_count(), 2);
        assert!(renderer.last_frame().expect("frame").reused_upload);
    }

    #[test]
    fn invalid_buffers_are_render_failures() {
        let mut renderer = NullRenderer::new();
        renderer.init(DeviceSurface::new(640, 480)).expect("init");
        let mut broken = buffers();
        broken.line_indices.push(7);
        assert!(matches!(
            renderer.submit(&broken),
            Err(ChartError::RenderFailure(_))
        ));
        assert!(renderer.last_frame().is_none());
    }
}
