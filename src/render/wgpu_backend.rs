//! wgpu renderer for window surfaces and offscreen textures.

use std::fmt;

use tracing::{debug, trace, warn};
use wgpu::util::DeviceExt;

use crate::core::DeviceSurface;
use crate::error::{ChartError, ChartResult};
use crate::render::{Color, GeometryBuffers, Renderer, Vertex};

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const INITIAL_BUFFER_BYTES: u64 = 16 * 1024;
const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

/// Surface size in pixels, padded to 16 bytes for uniform layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniform {
    size: [f32; 2],
    _padding: [f32; 2],
}

impl FrameUniform {
    fn new(surface: DeviceSurface) -> Self {
        Self {
            size: [surface.width as f32, surface.height as f32],
            _padding: [0.0; 2],
        }
    }
}

/// Counters for the frames this renderer has produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WgpuRenderStats {
    pub frames_presented: usize,
    pub uploads_skipped: usize,
    pub buffer_reallocations: usize,
    pub surface_reconfigurations: usize,
}

/// GPU renderer drawing into a window surface or an offscreen texture.
///
/// Construction only creates the wgpu instance (and the window surface);
/// the adapter and device are requested by [`Renderer::init`].
pub struct WgpuRenderer {
    instance: wgpu::Instance,
    window_surface: Option<wgpu::Surface<'static>>,
    gpu: Option<GpuState>,
    stats: WgpuRenderStats,
}

impl WgpuRenderer {
    /// Renderer presenting into `window`.
    pub fn for_window(window: impl Into<wgpu::SurfaceTarget<'static>>) -> ChartResult<Self> {
        let instance = create_instance();
        let surface = instance
            .create_surface(window)
            .map_err(|err| ChartError::ContextUnavailable(format!("create surface: {err}")))?;
        Ok(Self {
            instance,
            window_surface: Some(surface),
            gpu: None,
            stats: WgpuRenderStats::default(),
        })
    }

    /// Renderer drawing into an offscreen RGBA texture.
    #[must_use]
    pub fn offscreen() -> Self {
        Self {
            instance: create_instance(),
            window_surface: None,
            gpu: None,
            stats: WgpuRenderStats::default(),
        }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "wgpu"
    }

    #[must_use]
    pub fn stats(&self) -> WgpuRenderStats {
        self.stats
    }

    /// Offscreen target, once initialized. `None` for window renderers.
    #[must_use]
    pub fn offscreen_texture(&self) -> Option<&wgpu::Texture> {
        match &self.gpu.as_ref()?.target {
            RenderTarget::Offscreen { texture } => Some(texture),
            RenderTarget::Window { .. } => None,
        }
    }

    async fn request_device(
        &self,
        size: DeviceSurface,
    ) -> ChartResult<(wgpu::Device, wgpu::Queue, wgpu::TextureFormat)> {
        let adapter = self
            .instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: self.window_surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                ChartError::ContextUnavailable("no suitable GPU adapter".to_owned())
            })?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("tradechart device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|err| ChartError::ContextUnavailable(format!("request device: {err}")))?;

        debug!(
            adapter = ?adapter.get_info().name,
            backend = ?adapter.get_info().backend,
            width = size.width,
            height = size.height,
            "gpu context ready"
        );

        let format = match &self.window_surface {
            Some(surface) => {
                let caps = surface.get_capabilities(&adapter);
                // Colors are authored in display space, so prefer a non-sRGB view.
                caps.formats
                    .iter()
                    .find(|format| !format.is_srgb())
                    .or_else(|| caps.formats.first())
                    .copied()
                    .ok_or_else(|| {
                        ChartError::ContextUnavailable(
                            "surface is incompatible with the adapter".to_owned(),
                        )
                    })?
            }
            None => OFFSCREEN_FORMAT,
        };

        Ok((device, queue, format))
    }
}

impl fmt::Debug for WgpuRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuRenderer")
            .field("window", &self.window_surface.is_some())
            .field("surface", &self.surface())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Renderer for WgpuRenderer {
    fn init(&mut self, surface: DeviceSurface) -> ChartResult<()> {
        let surface = surface.validate()?;
        let (device, queue, format) = pollster::block_on(self.request_device(surface))?;
        let target = match self.window_surface.take() {
            Some(window) => {
                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width: surface.width,
                    height: surface.height,
                    present_mode: wgpu::PresentMode::AutoVsync,
                    alpha_mode: wgpu::CompositeAlphaMode::Auto,
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                window.configure(&device, &config);
                RenderTarget::Window {
                    surface: window,
                    config,
                }
            }
            None => RenderTarget::Offscreen {
                texture: create_offscreen_texture(&device, surface),
            },
        };
        self.gpu = Some(GpuState::new(device, queue, format, target, surface));
        Ok(())
    }

    fn resize(&mut self, surface: DeviceSurface) -> ChartResult<()> {
        let gpu = self
            .gpu
            .as_mut()
            .ok_or_else(|| ChartError::RenderFailure("resize before init".to_owned()))?;
        if gpu.size == surface {
            return Ok(());
        }
        let surface = surface.validate()?;
        gpu.size = surface;
        match &mut gpu.target {
            RenderTarget::Window {
                surface: window,
                config,
            } => {
                config.width = surface.width;
                config.height = surface.height;
                window.configure(&gpu.device, config);
            }
            RenderTarget::Offscreen { texture } => {
                *texture = create_offscreen_texture(&gpu.device, surface);
            }
        }
        gpu.queue.write_buffer(
            &gpu.uniform_buffer,
            0,
            bytemuck::bytes_of(&FrameUniform::new(surface)),
        );
        self.stats.surface_reconfigurations += 1;
        trace!(width = surface.width, height = surface.height, "gpu surface resized");
        Ok(())
    }

    fn submit(&mut self, buffers: &GeometryBuffers) -> ChartResult<()> {
        let gpu = self
            .gpu
            .as_mut()
            .ok_or_else(|| ChartError::RenderFailure("submit before init".to_owned()))?;
        buffers
            .validate()
            .map_err(|err| ChartError::RenderFailure(err.to_string()))?;

        let before = gpu.reallocations();
        let uploaded = gpu
            .capture_errors("upload", |gpu| gpu.upload(buffers))
            .and_then(|result| result);
        self.stats.buffer_reallocations += gpu.reallocations() - before;
        let uploaded = uploaded.inspect_err(|_| gpu.forget_uploads())?;
        if !uploaded {
            self.stats.uploads_skipped += 1;
        }

        let frame = gpu.acquire(&mut self.stats)?;
        gpu.capture_errors("draw", |gpu| gpu.encode_and_submit(frame.view(), buffers))
            .inspect_err(|_| gpu.forget_uploads())?;
        if let AcquiredFrame::Window { texture, .. } = frame {
            texture.present();
        }
        self.stats.frames_presented += 1;
        Ok(())
    }

    fn surface(&self) -> Option<DeviceSurface> {
        self.gpu.as_ref().map(|gpu| gpu.size)
    }
}

enum RenderTarget {
    Window {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
    },
}

enum AcquiredFrame {
    Window {
        texture: wgpu::SurfaceTexture,
        view: wgpu::TextureView,
    },
    Offscreen {
        view: wgpu::TextureView,
    },
}

impl AcquiredFrame {
    fn view(&self) -> &wgpu::TextureView {
        match self {
            Self::Window { view, .. } | Self::Offscreen { view } => view,
        }
    }
}

struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: RenderTarget,
    size: DeviceSurface,
    triangle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertices: GrowableBuffer,
    triangle_indices: GrowableBuffer,
    line_indices: GrowableBuffer,
}

impl GpuState {
    fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        target: RenderTarget,
        size: DeviceSurface,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chart Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/chart.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Uniform Buffer"),
            contents: bytemuck::bytes_of(&FrameUniform::new(size)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chart Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let triangle_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let line_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::LineList,
        );

        let vertices = GrowableBuffer::new(&device, "Vertex Buffer", wgpu::BufferUsages::VERTEX);
        let triangle_indices =
            GrowableBuffer::new(&device, "Triangle Index Buffer", wgpu::BufferUsages::INDEX);
        let line_indices =
            GrowableBuffer::new(&device, "Line Index Buffer", wgpu::BufferUsages::INDEX);

        Self {
            device,
            queue,
            target,
            size,
            triangle_pipeline,
            line_pipeline,
            uniform_buffer,
            bind_group,
            vertices,
            triangle_indices,
            line_indices,
        }
    }

    /// Returns `false` when every buffer already held identical bytes.
    fn upload(&mut self, buffers: &GeometryBuffers) -> ChartResult<bool> {
        let vertices = self
            .vertices
            .upload(&self.device, &self.queue, buffers.vertex_bytes())?;
        let triangles =
            self.triangle_indices
                .upload(&self.device, &self.queue, buffers.triangle_index_bytes())?;
        let lines = self
            .line_indices
            .upload(&self.device, &self.queue, buffers.line_index_bytes())?;
        Ok(vertices || triangles || lines)
    }

    /// Runs `work` inside validation and out-of-memory error scopes.
    ///
    /// Device errors raised by `work` are returned as `RenderFailure` instead
    /// of reaching the uncaptured-error handler.
    fn capture_errors<T>(
        &mut self,
        stage: &'static str,
        work: impl FnOnce(&mut Self) -> T,
    ) -> ChartResult<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let output = work(self);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            None => Ok(output),
            Some(err) => {
                warn!(stage, error = %err, "gpu error captured, frame dropped");
                Err(ChartError::RenderFailure(format!("gpu {stage}: {err}")))
            }
        }
    }

    /// Drops the cached upload contents so the next frame uploads in full.
    fn forget_uploads(&mut self) {
        self.vertices.contents.clear();
        self.triangle_indices.contents.clear();
        self.line_indices.contents.clear();
    }

    fn reallocations(&self) -> usize {
        self.vertices.reallocations
            + self.triangle_indices.reallocations
            + self.line_indices.reallocations
    }

    fn acquire(&mut self, stats: &mut WgpuRenderStats) -> ChartResult<AcquiredFrame> {
        match &self.target {
            RenderTarget::Offscreen { texture } => Ok(AcquiredFrame::Offscreen {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            }),
            RenderTarget::Window { surface, config } => {
                let texture = match surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        warn!("gpu surface lost or outdated, reconfiguring");
                        surface.configure(&self.device, config);
                        stats.surface_reconfigurations += 1;
                        surface.get_current_texture().map_err(|err| {
                            ChartError::RenderFailure(format!("acquire frame: {err}"))
                        })?
                    }
                    Err(err) => {
                        return Err(ChartError::RenderFailure(format!("acquire frame: {err}")));
                    }
                };
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(AcquiredFrame::Window { texture, view })
            }
        }
    }

    fn encode_and_submit(&self, view: &wgpu::TextureView, buffers: &GeometryBuffers) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Chart Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Chart Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_wgpu_color(buffers.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if !buffers.vertices.is_empty() {
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertices.buffer.slice(..));

                let grid_end = index_count(buffers.grid_line_count * 2);
                let line_end = index_count(buffers.line_indices.len());
                let triangle_end = index_count(buffers.triangle_indices.len());

                // Grid lines go underneath the candles.
                pass.set_pipeline(&self.line_pipeline);
                pass.set_index_buffer(
                    self.line_indices.buffer.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                if grid_end > 0 {
                    pass.draw_indexed(0..grid_end, 0, 0..1);
                }
                if line_end > grid_end {
                    pass.draw_indexed(grid_end..line_end, 0, 0..1);
                }

                if triangle_end > 0 {
                    pass.set_pipeline(&self.triangle_pipeline);
                    pass.set_index_buffer(
                        self.triangle_indices.buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    pass.draw_indexed(0..triangle_end, 0, 0..1);
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Device buffer that doubles its capacity on demand and skips identical uploads.
struct GrowableBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
    contents: Vec<u8>,
    reallocations: usize,
}

impl GrowableBuffer {
    fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            label,
            usage,
            buffer: create_buffer(device, label, usage, INITIAL_BUFFER_BYTES),
            capacity: INITIAL_BUFFER_BYTES,
            contents: Vec::new(),
            reallocations: 0,
        }
    }

    fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
    ) -> ChartResult<bool> {
        if self.contents == bytes {
            return Ok(false);
        }
        let needed = bytes.len() as u64;
        let grown = grown_capacity(
            self.label,
            needed,
            self.capacity,
            device.limits().max_buffer_size,
        )?;
        if let Some(capacity) = grown {
            self.capacity = capacity;
            self.buffer = create_buffer(device, self.label, self.usage, self.capacity);
            self.reallocations += 1;
            trace!(label = self.label, capacity = self.capacity, "grew gpu buffer");
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.contents.clear();
        self.contents.extend_from_slice(bytes);
        Ok(true)
    }
}

/// Capacity to reallocate to for `needed` bytes, or `None` when the current
/// buffer fits. Growth doubles and is capped at the device limit.
fn grown_capacity(label: &str, needed: u64, capacity: u64, max: u64) -> ChartResult<Option<u64>> {
    if needed <= capacity {
        return Ok(None);
    }
    if needed > max {
        return Err(ChartError::RenderFailure(format!(
            "{label} needs {needed} bytes, device limit is {max}"
        )));
    }
    Ok(Some(needed.next_power_of_two().min(max)))
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

fn create_buffer(
    device: &wgpu::Device,
    label: &str,
    usage: wgpu::BufferUsages,
    size: u64,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

fn create_offscreen_texture(device: &wgpu::Device, surface: DeviceSurface) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Chart Target"),
        size: wgpu::Extent3d {
            width: surface.width.max(1),
            height: surface.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let label = match topology {
        wgpu::PrimitiveTopology::LineList => "Chart Line Pipeline",
        _ => "Chart Triangle Pipeline",
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.red,
        g: color.green,
        b: color.blue,
        a: color.alpha,
    }
}

fn index_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_growth_doubles_within_the_device_limit() {
        assert_eq!(grown_capacity("vertices", 100, 16_384, 1 << 28).expect("fits"), None);
        assert_eq!(
            grown_capacity("vertices", 20_000, 16_384, 1 << 28).expect("grow"),
            Some(32_768)
        );
        assert_eq!(
            grown_capacity("vertices", 40_000, 16_384, 48_000).expect("capped"),
            Some(48_000)
        );
    }

    #[test]
    fn buffer_beyond_the_device_limit_is_a_render_failure() {
        let err = grown_capacity("line indices", 1 << 29, 16_384, 1 << 28)
            .expect_err("too large");
        assert!(matches!(err, ChartError::RenderFailure(_)));
        assert!(err.is_recoverable());
    }
}
