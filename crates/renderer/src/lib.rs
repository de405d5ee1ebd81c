//! Renderer: wgpu device/surface setup, mesh upload and execution of a
//! [`FramePlan`].
//! wgpu = 26.x, winit = 0.30.x

pub mod frame;

use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;

use asset::{MeshAsset, MeshData, MeshVertex, TextureData, TextureLoader};
use bytemuck::{Pod, Zeroable};
use corelib::camera::Camera;
use corelib::{CoreError, CoreResult};
use wgpu::{
    util::DeviceExt,
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, Sampler,
    SamplerBindingType, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, TextureDescriptor, TextureDimension, TextureFormat,
    TextureSampleType, TextureUsages, TextureView, TextureViewDescriptor, TextureViewDimension,
    VertexBufferLayout, VertexState, VertexStepMode,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use frame::{
    Binding, DrawCommand, DrawTarget, FramePlan, MaterialBindings, OverlayMode, OverlayTextures,
    SceneLayout, plan_frame,
};

/// Vertex: position + normal + uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

impl From<&MeshVertex> for Vertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            pos: v.position,
            normal: v.normal,
            uv: v.uv,
        }
    }
}

/// Per-draw UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    mvp: [[f32; 4]; 4],
    tint: [f32; 4],
}

/// Index into the renderer's texture table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const WHITE_TEXTURE: TextureId = TextureId(0);

struct GpuMesh {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
}

struct GpuTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    bind_group: BindGroup,
}

struct DrawSlot {
    buf: Buffer,
    bind_group: BindGroup,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline
    pipeline: RenderPipeline,
    draw_bgl: BindGroupLayout,
    texture_bgl: BindGroupLayout,
    sampler: Sampler,

    // Geometry: one mesh per material group, plus the overlay quad
    group_meshes: Vec<GpuMesh>,
    overlay_mesh: GpuMesh,

    // Per-draw uniforms, grown on demand
    draw_slots: Vec<DrawSlot>,
    textures: Vec<GpuTexture>,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an `Arc<Window>` and upload the asset's
    /// geometry. Any adapter/device/surface failure is a presentation error.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        asset: &MeshAsset,
        overlay_size: f32,
    ) -> CoreResult<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .map_err(|e| CoreError::Presentation(format!("create_surface failed: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| CoreError::Presentation(format!("no suitable GPU adapter: {e}")))?;
        log::info!("Adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("AppleDance Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| CoreError::Presentation(format!("request_device failed: {e}")))?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| CoreError::Presentation("surface reports no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Mesh WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        // ==== Bind group layouts ====
        let draw_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Draw BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
                },
                count: None,
            }],
        });
        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Diffuse sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[&draw_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    // Face PNGs carry transparency.
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // OBJ winding is not reliable and the overlay is single-sided.
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ==== Geometry ====
        let group_meshes = asset
            .groups
            .iter()
            .map(|group| {
                upload_mesh(&device, &group.material, &asset.group_mesh_data(group))
            })
            .collect();
        let overlay_mesh = upload_mesh(&device, "Overlay", &MeshData::quad_xz(overlay_size));

        let mut state = Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            draw_bgl,
            texture_bgl,
            sampler,
            group_meshes,
            overlay_mesh,
            draw_slots: Vec::new(),
            textures: Vec::new(),
            depth_view,
            width,
            height,
        };

        let white = state.upload_texture(&TextureData::solid_rgba8([255, 255, 255, 255]), "White");
        debug_assert_eq!(white, WHITE_TEXTURE);

        Ok(state)
    }

    /// Upload decoded RGBA8 data and return its id.
    pub fn upload_texture(&mut self, data: &TextureData, label: &str) -> TextureId {
        let size = Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.bytes_per_row()),
                rows_per_image: Some(data.height),
            },
            size,
        );
        let view = texture.create_view(&TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let id = TextureId(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            texture,
            bind_group,
        });
        id
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Render one frame: write per-draw uniforms, clear, draw the plan, present.
    pub fn render(&mut self, plan: &FramePlan<TextureId>, camera: &Camera) -> Result<(), SurfaceError> {
        self.ensure_draw_slots(plan.draws.len());

        let proj_view = camera.with_aspect(self.aspect()).proj_view();
        for (slot, draw) in self.draw_slots.iter().zip(&plan.draws) {
            let uniform = DrawUniform {
                mvp: (proj_view * draw.model).to_cols_array_2d(),
                tint: draw.binding.tint(),
            };
            self.queue
                .write_buffer(&slot.buf, 0, bytemuck::bytes_of(&uniform));
        }

        // --- frame & pass
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color::BLACK),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            for (slot, draw) in self.draw_slots.iter().zip(&plan.draws) {
                let mesh = match draw.target {
                    DrawTarget::Group(i) => match self.group_meshes.get(i) {
                        Some(mesh) => mesh,
                        None => {
                            log::warn!("Draw references unknown mesh group {i}");
                            continue;
                        }
                    },
                    DrawTarget::Overlay => &self.overlay_mesh,
                };
                let texture = match &draw.binding {
                    Binding::Texture(id) => *id,
                    Binding::FlatColor(_) => WHITE_TEXTURE,
                };
                let Some(texture) = self.textures.get(texture.0 as usize) else {
                    log::warn!("Draw references unknown texture {texture:?}");
                    continue;
                };

                rpass.set_bind_group(0, &slot.bind_group, &[]);
                rpass.set_bind_group(1, &texture.bind_group, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                rpass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }

    fn ensure_draw_slots(&mut self, count: usize) {
        while self.draw_slots.len() < count {
            let label = format!("Draw UBO {}", self.draw_slots.len());
            let buf = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&label),
                size: std::mem::size_of::<DrawUniform>() as u64,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&label),
                layout: &self.draw_bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buf.as_entire_binding(),
                }],
            });
            self.draw_slots.push(DrawSlot { buf, bind_group });
        }
    }
}

impl TextureLoader for GpuState {
    type Handle = TextureId;

    /// Decode (flipped bottom-up) and upload.
    fn load(&mut self, path: &Path) -> CoreResult<TextureId> {
        let data = TextureData::load(path)?;
        Ok(self.upload_texture(&data, &path.display().to_string()))
    }
}

fn upload_mesh(device: &Device, label: &str, data: &MeshData) -> GpuMesh {
    let vertices: Vec<Vertex> = data.vertices.iter().map(Vertex::from).collect();
    let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} VB")),
        contents: bytemuck::cast_slice(&vertices),
        usage: BufferUsages::VERTEX,
    });
    let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} IB")),
        contents: bytemuck::cast_slice(&data.indices),
        usage: BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buf,
        index_buf,
        index_count: data.indices.len() as u32,
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
