use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use scs_common::{Light, Mesh, MeshId};
use scs_render::{
    BlendMode, Capabilities, ClearValues, DeviceError, DrawItem, FrameParams, GraphicsDevice,
    MeshMaterial, PipelineState, QuadMaterial, StencilState, Surface, SurfaceImage, TargetDesc,
    TargetId,
};
use wgpu::util::DeviceExt;

use crate::convert;
use crate::shaders::{self, MAX_LIGHTS};

const FRAMEBUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
const STENCIL_BITS: u32 = 8;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    1 => Float32x4,
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuLight {
    params: [f32; 4],
    color: [f32; 4],
    vector: [f32; 4],
}

impl GpuLight {
    fn from_light(light: &Light) -> Self {
        let (kind, color, intensity, vector) = match *light {
            Light::Ambient { color, intensity } => (0.0, color, intensity, [0.0; 4]),
            Light::Directional {
                direction,
                color,
                intensity,
            } => (1.0, color, intensity, direction.extend(0.0).to_array()),
            Light::Point {
                position,
                color,
                intensity,
            } => (2.0, color, intensity, position.extend(1.0).to_array()),
        };
        Self {
            params: [kind, intensity, 0.0, 0.0],
            color: color.extend(1.0).to_array(),
            vector,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    lights: [GpuLight; MAX_LIGHTS],
    light_count: [u32; 4],
}

impl FrameUniforms {
    fn new(frame: &FrameParams<'_>) -> Self {
        let mut lights = [GpuLight::zeroed(); MAX_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(frame.lights) {
            *slot = GpuLight::from_light(light);
        }
        if frame.lights.len() > MAX_LIGHTS {
            tracing::debug!(
                lights = frame.lights.len(),
                used = MAX_LIGHTS,
                "extra lights ignored"
            );
        }
        Self {
            view_proj: frame.view_projection.to_cols_array_2d(),
            lights,
            light_count: [frame.lights.len().min(MAX_LIGHTS) as u32, 0, 0, 0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    id: [f32; 4],
}

impl InstanceData {
    fn from_item(item: &DrawItem<'_>) -> Self {
        Self {
            model: item.model.to_cols_array_2d(),
            color: item.color,
            id: item.id.to_rgba(),
        }
    }
}

/// Shader entry-point pair of a device call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
    DepthToAlpha,
    Lit,
    IdColor,
    IdMerge,
    DepthMerge,
    ResetToFar,
    NearestWins,
    VisualizeDepth,
}

impl From<MeshMaterial> for Program {
    fn from(material: MeshMaterial) -> Self {
        match material {
            MeshMaterial::DepthToAlpha => Program::DepthToAlpha,
            MeshMaterial::Lit => Program::Lit,
            MeshMaterial::IdColor => Program::IdColor,
            MeshMaterial::IdMerge { .. } => Program::IdMerge,
            MeshMaterial::DepthMerge { .. } => Program::DepthMerge,
        }
    }
}

impl From<QuadMaterial> for Program {
    fn from(material: QuadMaterial) -> Self {
        match material {
            QuadMaterial::ResetToFar => Program::ResetToFar,
            QuadMaterial::NearestWins { .. } => Program::NearestWins,
            QuadMaterial::VisualizeDepth { .. } => Program::VisualizeDepth,
        }
    }
}

impl Program {
    fn entry_points(self) -> (&'static str, &'static str) {
        match self {
            Program::DepthToAlpha => ("vs_mesh", "fs_depth_alpha"),
            Program::Lit => ("vs_mesh", "fs_lit"),
            Program::IdColor => ("vs_mesh", "fs_id"),
            Program::IdMerge => ("vs_mesh", "fs_id_merge"),
            Program::DepthMerge => ("vs_mesh", "fs_merge_objects"),
            Program::ResetToFar => ("vs_quad", "fs_clip"),
            Program::NearestWins => ("vs_quad", "fs_merge_buffers"),
            Program::VisualizeDepth => ("vs_quad", "fs_depth_view"),
        }
    }

    fn is_quad(self) -> bool {
        self.entry_points().0 == "vs_quad"
    }
}

/// Everything a render pipeline depends on. The stencil reference is left
/// out: it is set per draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: Program,
    state: PipelineState,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
}

impl PipelineKey {
    fn new(
        program: Program,
        state: &PipelineState,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let mut state = *state;
        state.stencil = state
            .stencil
            .map(|s| StencilState { reference: 0, ..s });
        Self {
            program,
            state,
            color_format,
            depth_format,
        }
    }
}

/// Color texture plus optional depth/stencil texture of one surface.
struct GpuSurface {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_format: Option<wgpu::TextureFormat>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl GpuSurface {
    fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&Default::default());
        let depth = depth_format.map(|depth_format| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: depth_format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let view = texture.create_view(&Default::default());
            (texture, view)
        });
        Self {
            width,
            height,
            format,
            color,
            color_view,
            depth_format,
            depth,
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

fn backend(err: impl std::fmt::Display) -> DeviceError {
    DeviceError::Backend(err.to_string())
}

/// Copy rows must start on a 256-byte boundary.
fn padded_bytes_per_row(width: u32, bytes_per_texel: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * bytes_per_texel).div_ceil(align) * align
}

/// wgpu implementation of [`GraphicsDevice`].
///
/// The framebuffer is `Rgba8Unorm`; render targets are `Rgba32Float` so the
/// synthetic depth in alpha keeps full precision. Native depth is read back
/// only with `Depth32FloatStencil8`; on adapters without it the device falls
/// back to `Depth24PlusStencil8` and reports no depth in [`SurfaceImage`].
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth_format: wgpu::TextureFormat,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    texture_layout: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    placeholder: wgpu::TextureView,
    framebuffer: GpuSurface,
    targets: BTreeMap<TargetId, GpuSurface>,
    next_target: u32,
    meshes: HashMap<MeshId, GpuMesh>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl WgpuDevice {
    /// Create a device on the first available adapter, without a window.
    pub fn new_headless(width: u32, height: u32) -> Result<Self, DeviceError> {
        pollster::block_on(Self::request(width, height))
    }

    async fn request(width: u32, height: u32) -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| DeviceError::Backend("no graphics adapter found".into()))?;

        let (depth_format, required_features) =
            if adapter.features().contains(wgpu::Features::DEPTH32FLOAT_STENCIL8) {
                (
                    wgpu::TextureFormat::Depth32FloatStencil8,
                    wgpu::Features::DEPTH32FLOAT_STENCIL8,
                )
            } else {
                (
                    wgpu::TextureFormat::Depth24PlusStencil8,
                    wgpu::Features::empty(),
                )
            };
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("scs_device"),
                    required_features,
                    required_limits: adapter.limits(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(backend)?;

        let info = adapter.get_info();
        tracing::info!(
            adapter = %info.name,
            backend = ?info.backend,
            ?depth_format,
            "wgpu device ready"
        );
        Self::from_device(device, queue, depth_format, width, height)
    }

    /// Wrap an existing device. `depth_format` must carry a stencil aspect.
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        depth_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, DeviceError> {
        if !depth_format.has_stencil_aspect() {
            return Err(DeviceError::Backend(format!(
                "{depth_format:?} has no stencil aspect"
            )));
        }
        check_size(&device, width, height)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("csg_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CSG_SHADER.into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let sampled_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sampled_targets_layout"),
            entries: &[sampled_entry(0), sampled_entry(1)],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("csg_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let placeholder = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("unsampled_placeholder"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
            .create_view(&Default::default());

        let framebuffer = GpuSurface::new(
            &device,
            "framebuffer",
            width,
            height,
            FRAMEBUFFER_FORMAT,
            Some(depth_format),
        );

        Ok(Self {
            device,
            queue,
            depth_format,
            shader,
            pipeline_layout,
            texture_layout,
            frame_buffer,
            frame_bind_group,
            placeholder,
            framebuffer,
            targets: BTreeMap::new(),
            next_target: 1,
            meshes: HashMap::new(),
            pipelines: HashMap::new(),
        })
    }

    /// True when [`GraphicsDevice::read_surface`] returns native depth.
    pub fn reads_depth(&self) -> bool {
        self.depth_format == wgpu::TextureFormat::Depth32FloatStencil8
    }

    /// Number of render pipelines created so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn surface(&self, surface: Surface) -> Result<&GpuSurface, DeviceError> {
        match surface {
            Surface::Framebuffer => Ok(&self.framebuffer),
            Surface::Target(id) => self.targets.get(&id).ok_or(DeviceError::UnknownTarget(id)),
        }
    }

    fn check_attachments(&self, surface: Surface, state: &PipelineState) -> Result<(), DeviceError> {
        let target = self.surface(surface)?;
        if target.depth.is_none() {
            let attachment = if state.stencil.is_some() {
                "stencil"
            } else if state.uses_depth() {
                "depth"
            } else {
                return Ok(());
            };
            return Err(DeviceError::MissingAttachment {
                surface,
                attachment,
            });
        }
        if state.blend == BlendMode::Alpha && target.format == TARGET_FORMAT {
            return Err(DeviceError::Backend(
                "alpha blending into float targets is not supported".into(),
            ));
        }
        Ok(())
    }

    /// Bind the sampled targets, rejecting hazards and size mismatches.
    fn sampled_bind_group(
        &self,
        surface: Surface,
        sampled: &[TargetId],
    ) -> Result<wgpu::BindGroup, DeviceError> {
        let dst = self.surface(surface)?.size();
        let mut views = [&self.placeholder; 2];
        for (slot, &id) in views.iter_mut().zip(sampled) {
            if surface == Surface::Target(id) {
                return Err(DeviceError::ReadWriteHazard(surface));
            }
            let src = self.targets.get(&id).ok_or(DeviceError::UnknownTarget(id))?;
            if src.size() != dst {
                return Err(DeviceError::SizeMismatch {
                    surface: Surface::Target(id),
                    expected: dst,
                    actual: src.size(),
                });
            }
            *slot = &src.color_view;
        }
        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sampled_targets"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(views[1]),
                },
            ],
        }))
    }

    fn upload_mesh(&mut self, mesh: &Mesh) {
        if self.meshes.contains_key(&mesh.id()) {
            return;
        }
        let positions: Vec<[f32; 3]> = mesh.positions().iter().map(|p| p.to_array()).collect();
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(&positions),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(mesh.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });
        tracing::trace!(mesh = ?mesh.id(), triangles = mesh.triangle_count(), "mesh uploaded");
        self.meshes.insert(
            mesh.id(),
            GpuMesh {
                vertices,
                indices,
                index_count: (mesh.triangle_count() * 3) as u32,
            },
        );
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        tracing::debug!(
            program = ?key.program,
            cached = self.pipelines.len(),
            "creating render pipeline"
        );
        let pipeline = self.create_pipeline(&key);
        self.pipelines.insert(key, pipeline);
    }

    fn create_pipeline(&self, key: &PipelineKey) -> wgpu::RenderPipeline {
        let (vs, fs) = key.program.entry_points();
        let mesh_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &INSTANCE_ATTRIBUTES,
            },
        ];
        let buffers: &[wgpu::VertexBufferLayout<'_>] = if key.program.is_quad() {
            &[]
        } else {
            &mesh_buffers
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(fs),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some(vs),
                    compilation_options: Default::default(),
                    buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some(fs),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.color_format,
                        blend: convert::blend(key.state.blend),
                        write_mask: convert::color_writes(key.state.color_mask),
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: convert::cull(key.state.cull),
                    ..Default::default()
                },
                depth_stencil: convert::depth_stencil(&key.state, key.depth_format),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
    }

    /// Encode one render pass on `target` and submit it.
    fn encode_pass(
        &self,
        target: &GpuSurface,
        clear: ClearValues,
        label: &str,
        record: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let color_load = match clear.color {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                }),
                None => wgpu::LoadOp::Load,
            };
            let depth_stencil_attachment =
                target
                    .depth
                    .as_ref()
                    .map(|(_, view)| wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: clear
                                .depth
                                .map(|d| d.clamp(0.0, 1.0))
                                .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: Some(wgpu::Operations {
                            load: clear
                                .stencil
                                .map(|s| s.min(u8::MAX as u32))
                                .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                            store: wgpu::StoreOp::Store,
                        }),
                    });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                ..Default::default()
            });
            record(&mut pass);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copy one aspect of a texture to the host, rows unpadded.
    fn read_texture(
        &self,
        texture: &wgpu::Texture,
        aspect: wgpu::TextureAspect,
        bytes_per_texel: u32,
        (width, height): (u32, u32),
    ) -> Result<Vec<u8>, DeviceError> {
        let row = width * bytes_per_texel;
        let padded = padded_bytes_per_row(width, bytes_per_texel);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(backend)?.map_err(backend)?;

        let mut out = Vec::with_capacity(row as usize * height as usize);
        {
            let data = slice.get_mapped_range();
            for line in data.chunks(padded as usize) {
                out.extend_from_slice(&line[..row as usize]);
            }
        }
        buffer.unmap();
        Ok(out)
    }
}

fn check_size(device: &wgpu::Device, width: u32, height: u32) -> Result<(), DeviceError> {
    if width == 0 || height == 0 {
        return Err(DeviceError::ZeroSize { width, height });
    }
    let max = device.limits().max_texture_dimension_2d;
    if width > max || height > max {
        return Err(DeviceError::Backend(format!(
            "{width}x{height} exceeds the maximum surface size {max}"
        )));
    }
    Ok(())
}

fn decode_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect()
}

impl GraphicsDevice for WgpuDevice {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            stencil_bits: STENCIL_BITS,
            float_color_targets: true,
            max_target_size: self.device.limits().max_texture_dimension_2d,
        }
    }

    fn size(&self) -> (u32, u32) {
        self.framebuffer.size()
    }

    fn resize_framebuffer(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        check_size(&self.device, width, height)?;
        self.framebuffer = GpuSurface::new(
            &self.device,
            "framebuffer",
            width,
            height,
            FRAMEBUFFER_FORMAT,
            Some(self.depth_format),
        );
        Ok(())
    }

    fn create_target(&mut self, desc: TargetDesc) -> Result<TargetId, DeviceError> {
        check_size(&self.device, desc.width, desc.height)?;
        let id = TargetId(self.next_target);
        self.next_target += 1;
        let depth = desc.depth_stencil.then_some(self.depth_format);
        let target = GpuSurface::new(
            &self.device,
            "render_target",
            desc.width,
            desc.height,
            TARGET_FORMAT,
            depth,
        );
        self.targets.insert(id, target);
        tracing::trace!(?id, width = desc.width, height = desc.height, "target created");
        Ok(id)
    }

    fn release_target(&mut self, id: TargetId) {
        if let Some(target) = self.targets.remove(&id) {
            target.color.destroy();
            if let Some((depth, _)) = target.depth {
                depth.destroy();
            }
        }
    }

    fn clear(&mut self, surface: Surface, values: ClearValues) -> Result<(), DeviceError> {
        let target = self.surface(surface)?;
        if target.depth.is_none() {
            let attachment = if values.depth.is_some() {
                Some("depth")
            } else if values.stencil.is_some() {
                Some("stencil")
            } else {
                None
            };
            if let Some(attachment) = attachment {
                return Err(DeviceError::MissingAttachment {
                    surface,
                    attachment,
                });
            }
        }
        self.encode_pass(target, values, "clear", |_| {});
        Ok(())
    }

    fn draw_meshes(
        &mut self,
        surface: Surface,
        frame: &FrameParams<'_>,
        state: &PipelineState,
        material: MeshMaterial,
        items: &[DrawItem<'_>],
    ) -> Result<(), DeviceError> {
        self.check_attachments(surface, state)?;
        let textures = self.sampled_bind_group(surface, material.sampled().as_slice())?;
        if items.is_empty() {
            return Ok(());
        }
        for item in items {
            self.upload_mesh(item.mesh);
        }
        let (color_format, depth_format) = {
            let target = self.surface(surface)?;
            (target.format, target.depth_format)
        };
        let key = PipelineKey::new(material.into(), state, color_format, depth_format);
        self.ensure_pipeline(key);

        self.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(frame)),
        );
        let instances: Vec<InstanceData> = items.iter().map(InstanceData::from_item).collect();
        let instance_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("instances"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let meshes = items
            .iter()
            .map(|item| {
                self.meshes
                    .get(&item.mesh.id())
                    .ok_or_else(|| DeviceError::Backend("mesh was not uploaded".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pipeline = self
            .pipelines
            .get(&key)
            .ok_or_else(|| DeviceError::Backend("pipeline cache miss".into()))?;
        let reference = state.stencil.map_or(0, |s| s.reference & 0xff);
        let target = self.surface(surface)?;

        self.encode_pass(target, ClearValues::default(), "draw_meshes", |pass| {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(1, &textures, &[]);
            pass.set_stencil_reference(reference);
            pass.set_vertex_buffer(1, instance_buffer.slice(..));
            for (i, mesh) in meshes.iter().enumerate() {
                let instance = i as u32;
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
            }
        });
        Ok(())
    }

    fn draw_quad(
        &mut self,
        surface: Surface,
        state: &PipelineState,
        material: QuadMaterial,
    ) -> Result<(), DeviceError> {
        self.check_attachments(surface, state)?;
        let textures = self.sampled_bind_group(surface, &material.sampled())?;
        let (color_format, depth_format) = {
            let target = self.surface(surface)?;
            (target.format, target.depth_format)
        };
        let key = PipelineKey::new(material.into(), state, color_format, depth_format);
        self.ensure_pipeline(key);

        let pipeline = self
            .pipelines
            .get(&key)
            .ok_or_else(|| DeviceError::Backend("pipeline cache miss".into()))?;
        let reference = state.stencil.map_or(0, |s| s.reference & 0xff);
        let target = self.surface(surface)?;

        self.encode_pass(target, ClearValues::default(), "draw_quad", |pass| {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(1, &textures, &[]);
            pass.set_stencil_reference(reference);
            pass.draw(0..3, 0..1);
        });
        Ok(())
    }

    fn read_surface(&mut self, surface: Surface) -> Result<SurfaceImage, DeviceError> {
        let target = self.surface(surface)?;
        let size = target.size();

        let color = if target.format == TARGET_FORMAT {
            let floats = decode_f32(&self.read_texture(
                &target.color,
                wgpu::TextureAspect::All,
                16,
                size,
            )?);
            floats
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect()
        } else {
            let unorm = |v: u8| v as f32 / 255.0;
            self.read_texture(&target.color, wgpu::TextureAspect::All, 4, size)?
                .chunks_exact(4)
                .map(|c| [unorm(c[0]), unorm(c[1]), unorm(c[2]), unorm(c[3])])
                .collect()
        };

        let (depth, stencil) = match &target.depth {
            Some((texture, _)) => {
                let depth = if self.reads_depth() {
                    Some(decode_f32(&self.read_texture(
                        texture,
                        wgpu::TextureAspect::DepthOnly,
                        4,
                        size,
                    )?))
                } else {
                    None
                };
                let stencil =
                    self.read_texture(texture, wgpu::TextureAspect::StencilOnly, 1, size)?;
                (depth, Some(stencil))
            }
            None => (None, None),
        };

        Ok(SurfaceImage {
            width: size.0,
            height: size.1,
            color,
            depth,
            stencil,
        })
    }
}
