//! Hardware realization of the field renderer.
//!
//! Owns a wgpu swapchain over the caller's window handles and a single
//! render pipeline whose fragment stage carries the baked network weights.
//! All per-frame state flows through one small uniform block.

use bytemuck::{Pod, Zeroable};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::backend::{FrameOutcome, FrameState};
use crate::error::InitError;

/// CPU mirror of the `FieldUniforms` block in the generated WGSL.
///
/// WGSL packs the block as a vec2 resolution at offset 0 and time at
/// offset 8; the trailing pad keeps the struct at the 16-byte uniform
/// stride. `tests::uniform_block_matches_wgsl_layout` pins this down.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FieldUniforms {
    resolution: [f32; 2],
    time: f32,
    _pad: f32,
}

impl FieldUniforms {
    fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            time: 0.0,
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Two counter-clockwise triangles covering clip space.
const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [-1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
];

/// GPU pipeline evaluating the reference network per fragment.
pub struct GpuBackend {
    // The surface was created from raw handles through this instance, so
    // the instance must stay alive as long as the surface does.
    _instance: wgpu::Instance,
    limits: wgpu::Limits,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: FieldUniforms,
    muted: bool,
}

impl GpuBackend {
    /// Creates a swapchain and pipeline over the target's raw handles.
    ///
    /// The caller must keep `target` alive for the lifetime of the backend;
    /// [`crate::mount`] guarantees this by holding the target alongside it.
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        shader_source: &str,
    ) -> Result<Self, InitError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::default();
        let window_handle = target.window_handle()?;
        let display_handle = target.display_handle()?;
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| InitError::HardwareUnavailable(err.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| InitError::HardwareUnavailable(err.to_string()))?;

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "using hardware adapter");

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let width = initial_size.width.max(1);
        let height = initial_size.height.max(1);
        if width > max_dimension || height > max_dimension {
            return Err(InitError::HardwareUnavailable(format!(
                "surface {width}x{height} exceeds max texture dimension {max_dimension}"
            )));
        }

        let surface_caps = surface.get_capabilities(&adapter);
        // The software path writes raw channel bytes with no transfer
        // function, so prefer a non-sRGB swapchain to keep both backends
        // producing the same pixels.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("field device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        };
        let (device, queue) = pollster::block_on(adapter.request_device(&device_descriptor))
            .map_err(|err| InitError::HardwareUnavailable(err.to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("field shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(InitError::ShaderCompile(error.to_string()));
        }

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("field uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("field pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("field pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(cppn::wgsl::VERTEX_ENTRY),
                buffers: &[QuadVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(cppn::wgsl::FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(InitError::ProgramLink(error.to_string()));
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("field quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniforms = FieldUniforms::new(width, height);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("field uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("field uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        tracing::info!(width, height, format = ?surface_format, "hardware backend ready");

        Ok(Self {
            _instance: instance,
            limits,
            surface,
            device,
            queue,
            config,
            pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            muted: false,
        })
    }

    /// Reconfigures the swapchain to match the new size.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width == self.config.width && height == self.config.height {
            return;
        }
        let max_dimension = self.limits.max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            tracing::warn!(
                width,
                height,
                max_dimension,
                "resize exceeds max texture dimension; keeping previous size"
            );
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.uniforms.resolution = [width as f32, height as f32];
    }

    /// Records and submits one frame of the animated field.
    pub(crate) fn render_frame(&mut self, frame: &FrameState) -> FrameOutcome {
        if self.muted {
            return FrameOutcome::Skipped;
        }

        self.uniforms.time = frame.elapsed_seconds as f32;
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let surface_frame = match self.surface.get_current_texture() {
            Ok(surface_frame) => surface_frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("swapchain lost; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return FrameOutcome::Skipped;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory; hardware output muted");
                self.muted = true;
                return FrameOutcome::Skipped;
            }
            Err(err) => {
                tracing::warn!(error = %err, "dropping frame");
                return FrameOutcome::Skipped;
            }
        };

        let view = surface_frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("field encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("field pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_frame.present();
        tracing::trace!(frame = frame.frame_index, "presented hardware frame");
        FrameOutcome::Presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        let uniforms = FieldUniforms::new(800, 600);
        let base = &uniforms as *const FieldUniforms as usize;
        let resolution = &uniforms.resolution as *const [f32; 2] as usize;
        let time = &uniforms.time as *const f32 as usize;
        assert_eq!(std::mem::size_of::<FieldUniforms>(), 16);
        assert_eq!(resolution - base, 0);
        assert_eq!(time - base, 8);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 16);
    }

    #[test]
    fn quad_covers_clip_space_corners() {
        assert_eq!(QUAD_VERTICES.len(), 6);
        for corner in [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]] {
            assert!(
                QUAD_VERTICES
                    .iter()
                    .any(|vertex| vertex.position == corner),
                "corner {corner:?} missing from quad"
            );
        }
    }

    #[test]
    fn quad_triangles_wind_counter_clockwise() {
        // Back-face culling is on, so a clockwise triangle would vanish.
        for triangle in QUAD_VERTICES.chunks(3) {
            let [a, b, c] = [
                triangle[0].position,
                triangle[1].position,
                triangle[2].position,
            ];
            let signed_area = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(signed_area > 0.0, "triangle {triangle:?} winds clockwise");
        }
    }

    #[test]
    fn vertex_layout_is_a_single_vec2() {
        let layout = QuadVertex::layout();
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[0].shader_location, 0);
    }
}
