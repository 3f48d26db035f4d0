//! Forward renderer for the scene graph

use crate::GpuContext;
use bytemuck::{Pod, Zeroable};
use modelview_core::{Color, Light, Mesh, NodeId, Point3f, Result, Scene};
use nalgebra::Matrix4;
use std::collections::HashMap;
use std::sync::Arc;
use winit::window::Window;

/// Directional lights beyond this count are ignored
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex data for mesh rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }

    /// Interleave positions with the mesh's normals, computing them when absent
    pub fn from_mesh(mesh: &Mesh) -> Vec<MeshVertex> {
        let geometry = &mesh.geometry;
        let computed;
        let normals = match &geometry.normals {
            Some(n) => n,
            None => {
                computed = geometry.compute_vertex_normals();
                &computed
            }
        };
        geometry
            .vertices
            .iter()
            .zip(normals)
            .map(|(p, n)| MeshVertex {
                position: [p.x, p.y, p.z],
                normal: [n.x, n.y, n.z],
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view_pos: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
struct DirectionalLightRaw {
    direction: [f32; 4],
    color: [f32; 4],
}

/// Scene lights packed for the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct LightingUniform {
    ambient: [f32; 4],
    directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    count: [u32; 4],
}

impl LightingUniform {
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut out = Self::default();
        let mut count = 0usize;
        for light in lights {
            match *light {
                Light::Ambient { color, intensity } => {
                    let c = srgb_to_linear(color);
                    for i in 0..3 {
                        out.ambient[i] += c[i] * intensity;
                    }
                }
                Light::Directional { color, intensity, position, .. } => {
                    if count == MAX_DIRECTIONAL_LIGHTS {
                        tracing::debug!("Ignoring directional light beyond {}", MAX_DIRECTIONAL_LIGHTS);
                        continue;
                    }
                    let dir = position.coords.try_normalize(f32::EPSILON).unwrap_or_else(nalgebra::Vector3::y);
                    let c = srgb_to_linear(color);
                    out.directional[count] = DirectionalLightRaw {
                        direction: [dir.x, dir.y, dir.z, 0.0],
                        color: [c[0] * intensity, c[1] * intensity, c[2] * intensity, 1.0],
                    };
                    count += 1;
                }
            }
        }
        out.count[0] = count as u32;
        out
    }

    pub fn directional_count(&self) -> u32 {
        self.count[0]
    }

    pub fn ambient(&self) -> [f32; 3] {
        [self.ambient[0], self.ambient[1], self.ambient[2]]
    }
}

/// Per-mesh transform and material
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

impl ModelUniform {
    pub fn new(world: &Matrix4<f32>, mesh: &Mesh) -> Self {
        let normal = world
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix4::identity);
        let c = srgb_to_linear(mesh.material.color);
        Self {
            model: (*world).into(),
            normal: normal.into(),
            color: [c[0], c[1], c[2], 1.0],
            params: [mesh.material.roughness, mesh.material.metalness, 0.0, 0.0],
        }
    }
}

/// Convert an sRGB-encoded color to linear components
pub fn srgb_to_linear(color: Color) -> [f32; 3] {
    color.to_linear()
}

/// Scene rendering configuration
#[derive(Debug, Clone)]
pub struct SceneRenderConfig {
    pub enable_depth_test: bool,
    pub enable_backface_culling: bool,
    pub vsync: bool,
}

impl Default for SceneRenderConfig {
    fn default() -> Self {
        Self {
            enable_depth_test: true,
            enable_backface_culling: false,
            vsync: true,
        }
    }
}

/// An acquired swapchain image plus the encoder recording into it
pub struct Frame {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    /// Recorded elsewhere (overlay callbacks) and submitted ahead of `encoder`
    pub command_buffers: Vec<wgpu::CommandBuffer>,
}

/// Order in which a frame's command buffers reach the queue
fn submission_order<T>(extra: Vec<T>, main: T) -> impl Iterator<Item = T> {
    extra.into_iter().chain(std::iter::once(main))
}

/// Identifies a mesh node across frames: the top-level node it lives under
/// and the child-index path from there
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeshKey {
    pub node: NodeId,
    pub path: Vec<usize>,
}

/// Inputs a model uniform was last written from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformState {
    world: Matrix4<f32>,
    material_version: u64,
}

impl UniformState {
    pub fn new(world: &Matrix4<f32>, mesh: &Mesh) -> Self {
        Self {
            world: *world,
            material_version: mesh.material.version(),
        }
    }
}

struct CacheEntry<T> {
    item: T,
    state: UniformState,
}

/// Per-mesh draw resources kept between frames
///
/// Geometry is taken as fixed once a mesh is cached. Material changes are
/// picked up through [`Material::version`](modelview_core::Material::version).
pub struct MeshCache<T> {
    entries: HashMap<MeshKey, CacheEntry<T>>,
}

impl<T> Default for MeshCache<T> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<T> MeshCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for `key`, building it with `create` when missing.
    /// The flag is true when the cached uniform no longer matches `state`
    /// and has to be rewritten.
    pub fn prepare<F: FnOnce() -> T>(&mut self, key: MeshKey, state: UniformState, create: F) -> (&T, bool) {
        match self.entries.entry(key) {
            std::collections::hash_map::Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                let stale = entry.state != state;
                entry.state = state;
                (&entry.item, stale)
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                let entry = vacant.insert(CacheEntry { item: create(), state });
                (&entry.item, false)
            }
        }
    }

    pub fn get(&self, key: &MeshKey) -> Option<&T> {
        self.entries.get(key).map(|e| &e.item)
    }

    pub fn retain<F: FnMut(&MeshKey) -> bool>(&mut self, mut keep: F) {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct DrawItem {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    model_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Forward renderer drawing a [`Scene`] to a window surface
pub struct SceneRenderer {
    pub gpu_context: GpuContext,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub config: SceneRenderConfig,
    pipeline: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    draw_cache: MeshCache<DrawItem>,
}

impl SceneRenderer {
    /// Create a renderer presenting to `window`
    pub async fn new(window: Arc<Window>, config: SceneRenderConfig) -> Result<Self> {
        let size = window.inner_size();
        let (gpu_context, surface) = GpuContext::for_window(window).await?;

        let surface_caps = surface.get_capabilities(&gpu_context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| modelview_core::Error::Gpu("Surface reports no formats".to_string()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if config.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu_context.device, &surface_config);

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let frame_layout = gpu_context.create_bind_group_layout("frame_bind_group_layout", &[uniform_entry(0), uniform_entry(1)]);
        let model_layout = gpu_context.create_bind_group_layout("model_bind_group_layout", &[uniform_entry(0)]);

        let camera_buffer = gpu_context.create_buffer_init(
            "Camera Buffer",
            &[CameraUniform {
                view_proj: Matrix4::identity().into(),
                view_pos: [0.0; 4],
            }],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let lighting_buffer = gpu_context.create_buffer_init(
            "Lighting Buffer",
            &[LightingUniform::default()],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let frame_bind_group = gpu_context.create_bind_group(
            "frame_bind_group",
            &frame_layout,
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
        );

        let shader = gpu_context.create_shader_module("Scene Shader", include_str!("shaders/scene.wgsl"));
        let pipeline = Self::create_render_pipeline(
            &gpu_context.device,
            &[&frame_layout, &model_layout],
            &shader,
            surface_format,
            &config,
        );

        let depth_view = Self::create_depth_view(&gpu_context.device, surface_config.width, surface_config.height);

        Ok(Self {
            gpu_context,
            surface,
            surface_config,
            config,
            pipeline,
            frame_layout,
            model_layout,
            camera_buffer,
            lighting_buffer,
            frame_bind_group,
            depth_view,
            draw_cache: MeshCache::new(),
        })
    }

    fn create_render_pipeline(
        device: &wgpu::Device,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        config: &SceneRenderConfig,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Render Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Render Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[MeshVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: if config.enable_backface_culling {
                    Some(wgpu::Face::Back)
                } else {
                    None
                },
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            // The depth attachment always exists; disabling the test just always passes
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: config.enable_depth_test,
                depth_compare: if config.enable_depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Size of the configured backing buffer
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Reconfigure the backing buffer; zero-sized requests are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.gpu_context.device, &self.surface_config);
        self.depth_view = Self::create_depth_view(&self.gpu_context.device, width, height);
    }

    /// Acquire the next swapchain image
    pub fn begin_frame(&mut self) -> Result<Frame> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.gpu_context.device, &self.surface_config);
                self.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .gpu_context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Render Encoder"),
            });
        Ok(Frame {
            output,
            view,
            encoder,
            command_buffers: Vec::new(),
        })
    }

    /// Record a pass clearing to the scene background and drawing every
    /// visible mesh. Mesh buffers are created on first sight; a mesh's
    /// model uniform is rewritten only when its world matrix or material
    /// version changed.
    pub fn draw_scene(&mut self, frame: &mut Frame, scene: &Scene, view_proj: Matrix4<f32>, camera_pos: Point3f) {
        let ctx = &self.gpu_context;
        let model_layout = &self.model_layout;
        let cache = &mut self.draw_cache;

        ctx.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_proj: view_proj.into(),
                view_pos: [camera_pos.x, camera_pos.y, camera_pos.z, 1.0],
            }),
        );
        ctx.queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::bytes_of(&LightingUniform::from_lights(scene.lights())),
        );

        cache.retain(|key| scene.node(key.node).is_some());

        let mut visible = Vec::new();
        for (id, root) in scene.entries() {
            root.for_each_visible_path(&Matrix4::identity(), &mut |path, node, world| {
                let Some(mesh) = &node.mesh else {
                    return;
                };
                if mesh.geometry.is_empty() {
                    return;
                }
                let key = MeshKey {
                    node: id,
                    path: path.to_vec(),
                };
                let state = UniformState::new(world, mesh);
                let (item, stale) = cache.prepare(key.clone(), state, || Self::create_draw_item(ctx, model_layout, mesh, world));
                if stale {
                    ctx.queue
                        .write_buffer(&item.model_buffer, 0, bytemuck::bytes_of(&ModelUniform::new(world, mesh)));
                }
                visible.push(key);
            });
        }
        let cache = &self.draw_cache;

        let [r, g, b] = srgb_to_linear(scene.background);
        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for item in visible.iter().filter_map(|key| cache.get(key)) {
            render_pass.set_bind_group(1, &item.bind_group, &[]);
            render_pass.set_vertex_buffer(0, item.vertex_buffer.slice(..));
            render_pass.set_index_buffer(item.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..item.index_count, 0, 0..1);
        }
    }

    fn create_draw_item(
        ctx: &GpuContext,
        model_layout: &wgpu::BindGroupLayout,
        mesh: &Mesh,
        world: &Matrix4<f32>,
    ) -> DrawItem {
        let indices: Vec<u32> = mesh
            .geometry
            .faces
            .iter()
            .flat_map(|f| [f[0] as u32, f[1] as u32, f[2] as u32])
            .collect();
        let vertex_buffer = ctx.create_buffer_init("Mesh Vertex Buffer", &MeshVertex::from_mesh(mesh), wgpu::BufferUsages::VERTEX);
        let index_buffer = ctx.create_buffer_init("Mesh Index Buffer", &indices, wgpu::BufferUsages::INDEX);
        let model_buffer = ctx.create_buffer_init(
            "Model Buffer",
            &[ModelUniform::new(world, mesh)],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let bind_group = ctx.create_bind_group(
            "model_bind_group",
            model_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        );
        DrawItem {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            model_buffer,
            bind_group,
        }
    }

    /// Submit the frame's commands, extra command buffers first, and
    /// present it
    pub fn finish_frame(&self, frame: Frame) {
        let Frame {
            output,
            encoder,
            command_buffers,
            ..
        } = frame;
        self.gpu_context.queue.submit(submission_order(command_buffers, encoder.finish()));
        output.present();
    }

    /// Layout of bind group 0 (camera + lighting), for pipelines sharing it
    pub fn frame_layout(&self) -> &wgpu::BindGroupLayout {
        &self.frame_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use modelview_core::{Material, SceneNode, TriangleMesh};

    #[test]
    fn test_srgb_endpoints() {
        assert_eq!(srgb_to_linear(Color::BLACK), [0.0, 0.0, 0.0]);
        let white = srgb_to_linear(Color::WHITE);
        assert_relative_eq!(white[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lighting_packs_ambient_and_directionals() {
        let lights = [
            Light::Ambient { color: Color::WHITE, intensity: 0.5 },
            Light::Directional {
                color: Color::WHITE,
                intensity: 1.0,
                position: Point3f::new(0.0, 10.0, 0.0),
                cast_shadow: true,
            },
        ];
        let uniform = LightingUniform::from_lights(&lights);
        assert_eq!(uniform.directional_count(), 1);
        assert_relative_eq!(uniform.ambient()[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(uniform.directional[0].direction[1], 1.0);
    }

    #[test]
    fn test_lighting_caps_directional_count() {
        let light = Light::Directional {
            color: Color::WHITE,
            intensity: 1.0,
            position: Point3f::new(1.0, 1.0, 1.0),
            cast_shadow: false,
        };
        let lights = vec![light; MAX_DIRECTIONAL_LIGHTS + 2];
        assert_eq!(LightingUniform::from_lights(&lights).directional_count(), MAX_DIRECTIONAL_LIGHTS as u32);
    }

    #[test]
    fn test_vertices_get_computed_normals() {
        let mesh = Mesh::new(
            TriangleMesh::from_vertices_and_faces(
                vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.0, 0.0, -1.0)],
                vec![[0, 1, 2]],
            ),
            Material::default(),
        );
        let vertices = MeshVertex::from_mesh(&mesh);
        assert_eq!(vertices.len(), 3);
        assert_relative_eq!(vertices[0].normal[1], 1.0, epsilon = 1e-6);
    }

    fn quad_mesh() -> Mesh {
        Mesh::new(
            TriangleMesh::from_vertices_and_faces(
                vec![
                    Point3f::new(0.0, 0.0, 0.0),
                    Point3f::new(1.0, 0.0, 0.0),
                    Point3f::new(1.0, 1.0, 0.0),
                    Point3f::new(0.0, 1.0, 0.0),
                ],
                vec![[0, 1, 2], [0, 2, 3]],
            ),
            Material::default(),
        )
    }

    fn key(scene: &Scene, path: Vec<usize>) -> MeshKey {
        let (id, _) = scene.entries().next().unwrap();
        MeshKey { node: id, path }
    }

    #[test]
    fn test_cache_builds_once_and_skips_unchanged_uniforms() {
        let mut scene = Scene::new(Color::WHITE);
        scene.add(SceneNode::group("root"));
        let mesh = quad_mesh();
        let world = Matrix4::identity();
        let mut cache = MeshCache::new();
        let mut built = 0;

        for _ in 0..3 {
            let (_, stale) = cache.prepare(key(&scene, vec![0]), UniformState::new(&world, &mesh), || {
                built += 1;
                built
            });
            assert!(!stale);
        }
        assert_eq!(built, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_invalidates_on_material_version_bump() {
        let mut scene = Scene::new(Color::WHITE);
        scene.add(SceneNode::group("root"));
        let mut mesh = quad_mesh();
        let world = Matrix4::identity();
        let mut cache = MeshCache::new();
        cache.prepare(key(&scene, vec![]), UniformState::new(&world, &mesh), || ());

        mesh.material.set_color(Color::RED);
        let (_, stale) = cache.prepare(key(&scene, vec![]), UniformState::new(&world, &mesh), || ());
        assert!(stale);

        // Once rewritten, the same version is current again
        let (_, stale) = cache.prepare(key(&scene, vec![]), UniformState::new(&world, &mesh), || ());
        assert!(!stale);
    }

    #[test]
    fn test_cache_invalidates_on_world_change() {
        let mut scene = Scene::new(Color::WHITE);
        scene.add(SceneNode::group("root"));
        let mesh = quad_mesh();
        let mut cache = MeshCache::new();
        cache.prepare(key(&scene, vec![1]), UniformState::new(&Matrix4::identity(), &mesh), || ());

        let moved = Matrix4::new_translation(&nalgebra::Vector3::new(0.0, 2.0, 0.0));
        let (_, stale) = cache.prepare(key(&scene, vec![1]), UniformState::new(&moved, &mesh), || ());
        assert!(stale);
    }

    #[test]
    fn test_cache_retain_drops_removed_nodes() {
        let mut scene = Scene::new(Color::WHITE);
        let old = scene.add(SceneNode::group("old"));
        let new = scene.add(SceneNode::group("new"));
        let mesh = quad_mesh();
        let state = UniformState::new(&Matrix4::identity(), &mesh);
        let mut cache = MeshCache::new();
        cache.prepare(MeshKey { node: old, path: vec![0] }, state, || "old");
        cache.prepare(MeshKey { node: new, path: vec![0] }, state, || "new");

        scene.remove(old);
        cache.retain(|k| scene.node(k.node).is_some());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&MeshKey { node: new, path: vec![0] }), Some(&"new"));
        assert!(cache.get(&MeshKey { node: old, path: vec![0] }).is_none());
    }

    #[test]
    fn test_extra_command_buffers_submit_first() {
        let order: Vec<&str> = submission_order(vec!["overlay", "callbacks"], "scene").collect();
        assert_eq!(order, vec!["overlay", "callbacks", "scene"]);
        assert_eq!(submission_order(Vec::new(), 1).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<LightingUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ModelUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }
}
