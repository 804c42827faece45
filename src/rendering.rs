//! Rendering system: window surface, ocean surface pass and skybox pass.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::camera::{rotation_only, ViewSource};
use crate::error::{OceanError, OceanResult};
use crate::ocean::gpu::{load_shader, required_limits, scoped, FieldTexture};
use crate::ocean::{FftTarget, OceanGrid, OceanSimulation, Vertex};
use crate::params::{OceanParams, RenderConfig, SimulationConfig};
use crate::resources::ResourceLoader;
use crate::skybox::{CubemapFaces, SkyVertex, SkyboxMesh};

/// Depth buffer format
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Where the ocean patch sits in world space
const OCEAN_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 5.0);

/// Uniform buffer for the ocean shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OceanUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub light_dir: [f32; 4],
    pub choppiness: f32,
    pub wave_height: f32,
    pub resolution: u32,
    pub _padding: u32,
}

impl OceanUniforms {
    pub fn new(
        view_proj: Mat4,
        camera_pos: Vec3,
        render_config: &RenderConfig,
        params: &OceanParams,
        resolution: u32,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: Mat4::from_translation(OCEAN_OFFSET).to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
            light_dir: render_config.light_direction().extend(0.0).to_array(),
            choppiness: params.choppiness(),
            wave_height: params.wave_height(),
            resolution,
            _padding: 0,
        }
    }
}

/// Uniform buffer for the skybox shader (view without translation)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkyboxUniforms {
    pub view_proj: [[f32; 4]; 4],
}

/// Rendering system owning the device, the surface and the ocean simulation
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    simulation: OceanSimulation,
    ocean_pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    skybox_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    sky_vertex_buffer: wgpu::Buffer,
    sky_index_buffer: wgpu::Buffer,
    sky_index_count: u32,
    ocean_uniform_buffer: wgpu::Buffer,
    ocean_bind_group: wgpu::BindGroup,
    skybox_uniform_buffer: wgpu::Buffer,
    skybox_bind_group: wgpu::BindGroup,
}

impl RenderSystem {
    /// Create the device, build every pipeline and the resident simulation
    ///
    /// Any missing resource or shader that fails validation aborts
    /// construction; nothing is rendered from a partial pipeline.
    pub async fn new(
        window: Arc<winit::window::Window>,
        loader: &dyn ResourceLoader,
        sim_config: SimulationConfig,
        params: OceanParams,
        render_config: &RenderConfig,
        faces: &CubemapFaces,
    ) -> OceanResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Surface needs 'static lifetime, hence the Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(OceanError::Adapter)?;

        let wireframe_supported = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        if !wireframe_supported {
            log::warn!("Adapter lacks POLYGON_MODE_LINE; wireframe toggle will be ignored");
        }
        let required_features = if wireframe_supported {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features,
                    required_limits: required_limits(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(OceanError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        let depth_view = create_depth_view(&device, surface_config.width, surface_config.height);

        let grid = OceanGrid::new(&sim_config)?;
        let simulation = OceanSimulation::new(&device, &queue, loader, sim_config, params)?;

        let ocean_shader = load_shader(&device, loader, "shaders/ocean.wgsl")?;
        let skybox_shader = load_shader(&device, loader, "shaders/skybox.wgsl")?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Vertex Buffer"),
            contents: bytemuck::cast_slice(&grid.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Index Buffer"),
            contents: bytemuck::cast_slice(&grid.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let sky_mesh = SkyboxMesh::new();
        let sky_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Vertex Buffer"),
            contents: bytemuck::cast_slice(&sky_mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sky_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Index Buffer"),
            contents: bytemuck::cast_slice(&sky_mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let cubemap_view = create_cubemap(&device, &queue, faces);
        let sky_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Skybox Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let ocean_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Uniform Buffer"),
            contents: bytemuck::bytes_of(&OceanUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let skybox_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Uniform Buffer"),
            contents: bytemuck::bytes_of(&SkyboxUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let vertex_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let ocean_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ocean Bind Group Layout"),
            entries: &[
                uniform_layout_entry(0, vertex_fragment),
                field_layout_entry(1),
                field_layout_entry(2),
                field_layout_entry(3),
                field_layout_entry(4),
                field_layout_entry(5),
                cube_layout_entry(6),
                sampler_layout_entry(7),
            ],
        });

        let fields = simulation.fields();
        let ocean_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ocean Bind Group"),
            layout: &ocean_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ocean_uniform_buffer.as_entire_binding(),
                },
                field_entry(1, fields.output(FftTarget::Height)),
                field_entry(2, fields.output(FftTarget::DisplacementX)),
                field_entry(3, fields.output(FftTarget::DisplacementZ)),
                field_entry(4, &fields.normal_map),
                field_entry(5, &fields.noise),
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(&cubemap_view),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::Sampler(&sky_sampler),
                },
            ],
        });

        let skybox_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Bind Group Layout"),
            entries: &[
                uniform_layout_entry(0, wgpu::ShaderStages::VERTEX),
                cube_layout_entry(1),
                sampler_layout_entry(2),
            ],
        });
        let skybox_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout: &skybox_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: skybox_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cubemap_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sky_sampler),
                },
            ],
        });

        let ocean_target = SurfacePipeline {
            label: "Ocean Render Pipeline",
            module: &ocean_shader,
            vertex_layout: Vertex::layout(),
            bind_group_layout: &ocean_layout,
            color_format: surface_format,
            polygon_mode: wgpu::PolygonMode::Fill,
            depth_compare: wgpu::CompareFunction::Less,
            depth_write: true,
        };
        let ocean_pipeline = ocean_target.build(&device)?;
        let wireframe_pipeline = if wireframe_supported {
            Some(
                SurfacePipeline {
                    label: "Ocean Wireframe Pipeline",
                    polygon_mode: wgpu::PolygonMode::Line,
                    ..ocean_target
                }
                .build(&device)?,
            )
        } else {
            None
        };

        // Cube sits at depth 1.0, so LessEqual keeps it behind everything drawn
        let skybox_pipeline = SurfacePipeline {
            label: "Skybox Pipeline",
            module: &skybox_shader,
            vertex_layout: SkyVertex::layout(),
            bind_group_layout: &skybox_layout,
            color_format: surface_format,
            polygon_mode: wgpu::PolygonMode::Fill,
            depth_compare: wgpu::CompareFunction::LessEqual,
            depth_write: false,
        }
        .build(&device)?;

        log::info!(
            "Renderer ready: {}x{} surface ({:?}), {} ocean indices",
            surface_config.width,
            surface_config.height,
            surface_format,
            grid.index_count()
        );
        if render_config.wireframe && !wireframe_supported {
            log::warn!("Wireframe requested but unsupported; drawing filled");
        }

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            depth_view,
            simulation,
            ocean_pipeline,
            wireframe_pipeline,
            skybox_pipeline,
            vertex_buffer,
            index_buffer,
            index_count: grid.index_count(),
            sky_vertex_buffer,
            sky_index_buffer,
            sky_index_count: sky_mesh.index_count(),
            ocean_uniform_buffer,
            ocean_bind_group,
            skybox_uniform_buffer,
            skybox_bind_group,
        })
    }

    pub fn simulation(&self) -> &OceanSimulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut OceanSimulation {
        &mut self.simulation
    }

    pub fn supports_wireframe(&self) -> bool {
        self.wireframe_pipeline.is_some()
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Reconfigure the surface and depth buffer; simulation fields are untouched
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, width, height);
    }

    /// Simulate and draw one frame at `time_s`, then present it
    pub fn render(
        &mut self,
        time_s: f32,
        camera: &dyn ViewSource,
        render_config: &RenderConfig,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.simulation.encode_frame(&self.queue, &mut encoder, time_s);

        let projection = render_config.projection();
        let view_matrix = camera.view_matrix();
        let ocean_uniforms = OceanUniforms::new(
            projection * view_matrix,
            camera.eye_position(),
            render_config,
            self.simulation.params(),
            self.simulation.config().resolution,
        );
        self.queue.write_buffer(
            &self.ocean_uniform_buffer,
            0,
            bytemuck::bytes_of(&ocean_uniforms),
        );
        let skybox_uniforms = SkyboxUniforms {
            view_proj: (projection * rotation_only(view_matrix)).to_cols_array_2d(),
        };
        self.queue.write_buffer(
            &self.skybox_uniform_buffer,
            0,
            bytemuck::bytes_of(&skybox_uniforms),
        );

        let [r, g, b] = render_config.background_color;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Surface Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
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

            let ocean_pipeline = match (&self.wireframe_pipeline, render_config.wireframe) {
                (Some(wireframe), true) => wireframe,
                _ => &self.ocean_pipeline,
            };
            render_pass.set_pipeline(ocean_pipeline);
            render_pass.set_bind_group(0, &self.ocean_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);

            // Skybox last
            render_pass.set_pipeline(&self.skybox_pipeline);
            render_pass.set_bind_group(0, &self.skybox_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.sky_vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.sky_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..self.sky_index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Description of one surface-target render pipeline
struct SurfacePipeline<'a> {
    label: &'a str,
    module: &'a wgpu::ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    bind_group_layout: &'a wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    polygon_mode: wgpu::PolygonMode,
    depth_compare: wgpu::CompareFunction,
    depth_write: bool,
}

impl SurfacePipeline<'_> {
    fn build(&self, device: &wgpu::Device) -> OceanResult<wgpu::RenderPipeline> {
        scoped(device, self.label, || {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(self.label),
                bind_group_layouts: &[self.bind_group_layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(self.label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: self.module,
                    entry_point: Some("vs_main"),
                    buffers: &[self.vertex_layout.clone()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: self.module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: self.polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: self.depth_write,
                    depth_compare: self.depth_compare,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
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
    });
    depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Upload the six faces into one cube texture
fn create_cubemap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    faces: &CubemapFaces,
) -> wgpu::TextureView {
    let size = faces.size();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Skybox Cubemap"),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for layer in 0..6u32 {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            faces.face(layer as usize),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
    }
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Skybox Cubemap View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

fn uniform_layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Simulation field read with textureLoad (RGBA32F is not filterable)
fn field_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn cube_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::Cube,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn field_entry(binding: u32, field: &FieldTexture) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::TextureView(&field.view),
    }
}
