//! Vertex and index buffers for one frame.
//!
//! Everything is laid out in pixel space with the origin at the top-left of
//! the surface. Grid lines come first in both the vertex and the line-index
//! streams so they are drawn underneath the candles.

use bytemuck::{Pod, Zeroable};
use tracing::trace;

use crate::core::{
    CandleGeometry, DeviceSurface, PriceSeries, ViewTransform, Viewport, price_grid_levels,
    project_candles,
};
use crate::error::{ChartError, ChartResult};
use crate::render::{CandleStyle, Color};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Pixel position, y pointing down.
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    #[must_use]
    pub fn new(x: f64, y: f64, color: Color) -> Self {
        Self {
            position: [x as f32, y as f32],
            color: color.to_f32_array(),
        }
    }
}

/// CPU-side geometry ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBuffers {
    pub surface: DeviceSurface,
    pub clear_color: Color,
    pub vertices: Vec<Vertex>,
    /// Two triangles per candle body.
    pub triangle_indices: Vec<u32>,
    /// Grid lines followed by one wick per candle.
    pub line_indices: Vec<u32>,
    pub candles: Vec<CandleGeometry>,
    pub body_count: usize,
    pub wick_count: usize,
    pub grid_line_count: usize,
}

impl GeometryBuffers {
    #[must_use]
    pub fn empty(surface: DeviceSurface, clear_color: Color) -> Self {
        Self {
            surface,
            clear_color,
            vertices: Vec::new(),
            triangle_indices: Vec::new(),
            line_indices: Vec::new(),
            candles: Vec::new(),
            body_count: 0,
            wick_count: 0,
            grid_line_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }

    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.body_count + self.wick_count + self.grid_line_count
    }

    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[must_use]
    pub fn triangle_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangle_indices)
    }

    #[must_use]
    pub fn line_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.line_indices)
    }

    /// Checks index bounds, index list shapes and vertex finiteness.
    pub fn validate(&self) -> ChartResult<()> {
        self.surface.validate()?;
        self.clear_color.validate()?;
        if self.triangle_indices.len() % 3 != 0 {
            return Err(ChartError::InvalidData(
                "triangle index count must be a multiple of 3".to_owned(),
            ));
        }
        if self.line_indices.len() % 2 != 0 {
            return Err(ChartError::InvalidData(
                "line index count must be even".to_owned(),
            ));
        }
        let vertex_count = self.vertices.len();
        if let Some(index) = self
            .triangle_indices
            .iter()
            .chain(&self.line_indices)
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(ChartError::InvalidData(format!(
                "index {index} out of bounds for {vertex_count} vertices"
            )));
        }
        if self
            .vertices
            .iter()
            .any(|vertex| vertex.position.iter().any(|value| !value.is_finite()))
        {
            return Err(ChartError::InvalidData(
                "vertex positions must be finite".to_owned(),
            ));
        }
        Ok(())
    }

    fn push_quad(&mut self, left: f64, top: f64, right: f64, bottom: f64, color: Color) {
        let base = self.next_index();
        self.vertices.extend([
            Vertex::new(left, top, color),
            Vertex::new(right, top, color),
            Vertex::new(right, bottom, color),
            Vertex::new(left, bottom, color),
        ]);
        self.triangle_indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn push_line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) {
        let base = self.next_index();
        self.vertices.extend([
            Vertex::new(from.0, from.1, color),
            Vertex::new(to.0, to.1, color),
        ]);
        self.line_indices.extend([base, base + 1]);
    }

    fn next_index(&self) -> u32 {
        u32::try_from(self.vertices.len()).unwrap_or(u32::MAX)
    }
}

/// Turns the visible slice of a series into GPU-ready buffers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryBuilder {
    style: CandleStyle,
}

impl GeometryBuilder {
    pub fn new(style: CandleStyle) -> ChartResult<Self> {
        Ok(Self {
            style: style.validate()?,
        })
    }

    #[must_use]
    pub fn style(&self) -> CandleStyle {
        self.style
    }

    /// Builds the buffers for `viewport` over `series` on `surface`.
    ///
    /// Pure: identical inputs give byte-identical buffers. The empty window or
    /// a zero-sized surface produce buffers with no primitives.
    #[must_use]
    pub fn build(
        &self,
        series: &PriceSeries,
        viewport: &Viewport,
        surface: DeviceSurface,
    ) -> GeometryBuffers {
        let mut buffers = GeometryBuffers::empty(surface, self.style.background_color);
        if !surface.is_valid() {
            return buffers;
        }
        let (Some(window), Some(transform)) = (viewport.window(), viewport.transform(surface))
        else {
            return buffers;
        };

        if self.style.show_grid {
            self.push_grid(&mut buffers, viewport, &transform, surface);
        }

        let visible = series.window(window);
        let candles = project_candles(
            visible,
            window.left(),
            &transform,
            self.style.body_sizing(),
        );
        buffers.vertices.reserve(candles.len() * 6);
        buffers.triangle_indices.reserve(candles.len() * 6);
        buffers.line_indices.reserve(candles.len() * 2);
        for candle in &candles {
            buffers.push_quad(
                candle.body_left,
                candle.body_top,
                candle.body_right,
                candle.body_bottom,
                self.style.body_color(candle.is_bullish),
            );
            buffers.push_line(
                (candle.center_x, candle.wick_top),
                (candle.center_x, candle.wick_bottom),
                self.style.wick_color_for(candle.is_bullish),
            );
        }
        buffers.body_count = candles.len();
        buffers.wick_count = candles.len();
        buffers.candles = candles;

        trace!(
            ticker = %series.ticker(),
            left = window.left(),
            right = window.right(),
            bodies = buffers.body_count,
            grid_lines = buffers.grid_line_count,
            vertices = buffers.vertices.len(),
            "built frame geometry"
        );
        buffers
    }

    fn push_grid(
        &self,
        buffers: &mut GeometryBuffers,
        viewport: &Viewport,
        transform: &ViewTransform,
        surface: DeviceSurface,
    ) {
        let Some(range) = viewport.price_range() else {
            return;
        };
        let width = f64::from(surface.width);
        for level in price_grid_levels(range) {
            let y = transform.price_to_y(level);
            buffers.push_line((0.0, y), (width, y), self.style.grid_color);
            buffers.grid_line_count += 1;
        }
    }
}
