//! Compute stages: pipelines, bind groups and uniforms for each simulation step.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::textures::{FieldSet, FieldTexture, FIELD_FORMAT};
use crate::error::{OceanError, OceanResult};
use crate::ocean::fft::FftAxis;
use crate::ocean::schedule::FftTarget;
use crate::params::{OceanParams, SimulationConfig, WindParams};
use crate::resources::ResourceLoader;

/// Threads per workgroup side in every simulation shader
pub const WORKGROUP_SIZE: u32 = 16;

/// Workgroups needed to cover `n` texels along one axis
pub fn workgroups(n: u32) -> u32 {
    n.div_ceil(WORKGROUP_SIZE)
}

/// Run `build` inside a validation error scope
pub fn scoped<T>(device: &wgpu::Device, label: &str, build: impl FnOnce() -> T) -> OceanResult<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(OceanError::ShaderBuild {
            label: label.to_string(),
            message: err.to_string(),
        }),
        None => Ok(value),
    }
}

/// Load and compile a WGSL resource
pub fn load_shader(
    device: &wgpu::Device,
    loader: &dyn ResourceLoader,
    name: &str,
) -> OceanResult<wgpu::ShaderModule> {
    let source = loader.string_resource(name)?;
    scoped(device, name, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
}

fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    entry_point: &str,
    layout: &wgpu::BindGroupLayout,
) -> OceanResult<wgpu::ComputePipeline> {
    scoped(device, label, || {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module,
            entry_point: Some(entry_point),
            compilation_options: Default::default(),
            cache: None,
        })
    })
}

fn sampled_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: FIELD_FORMAT,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, has_dynamic_offset: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset,
            min_binding_size: None,
        },
        count: None,
    }
}

fn view_entry(binding: u32, texture: &FieldTexture) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::TextureView(&texture.view),
    }
}

fn uniform_buffer<T: Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Uniforms for spectrum synthesis
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpectrumUniforms {
    pub wind_direction: [f32; 2],
    pub wind_speed: f32,
    pub phillips_constant: f32,
    pub suppression: f32,
    pub patch_length: f32,
    pub gravity: f32,
    pub resolution: u32,
}

impl SpectrumUniforms {
    pub fn new(config: &SimulationConfig, wind: &WindParams) -> Self {
        Self {
            wind_direction: wind.direction.to_array(),
            wind_speed: wind.speed,
            phillips_constant: wind.phillips_constant,
            suppression: wind.suppression,
            patch_length: config.patch_length_m,
            gravity: config.gravity,
            resolution: config.resolution,
        }
    }
}

/// Writes `H0(k)` and `H0(-k)` from the Gaussian field
pub struct SpectrumStage {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    uniforms: wgpu::Buffer,
}

impl SpectrumStage {
    pub fn new(
        device: &wgpu::Device,
        loader: &dyn ResourceLoader,
        config: &SimulationConfig,
        fields: &FieldSet,
    ) -> OceanResult<Self> {
        let module = load_shader(device, loader, "shaders/spectrum.wgsl")?;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Spectrum Bind Group Layout"),
            entries: &[sampled_entry(0), storage_entry(1), storage_entry(2), uniform_entry(3, false)],
        });
        let pipeline = compute_pipeline(device, "Spectrum Pipeline", &module, "synthesize", &layout)?;
        let uniforms = uniform_buffer(
            device,
            "Spectrum Uniforms",
            &SpectrumUniforms::new(config, &WindParams::default()),
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Spectrum Bind Group"),
            layout: &layout,
            entries: &[
                view_entry(0, &fields.gaussian),
                view_entry(1, &fields.h0),
                view_entry(2, &fields.h0_minus),
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        });
        Ok(Self {
            pipeline,
            bind_group,
            uniforms,
        })
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, config: &SimulationConfig, wind: &WindParams) {
        queue.write_buffer(
            &self.uniforms,
            0,
            bytemuck::bytes_of(&SpectrumUniforms::new(config, wind)),
        );
    }

    pub fn record(&self, pass: &mut wgpu::ComputePass<'_>, resolution: u32) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(workgroups(resolution), workgroups(resolution), 1);
    }
}

/// Uniforms for time evolution
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct EvolveUniforms {
    pub time: f32,
    pub patch_length: f32,
    pub gravity: f32,
    pub resolution: u32,
}

/// Advances the spectrum to the current time
pub struct EvolveStage {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    uniforms: wgpu::Buffer,
}

impl EvolveStage {
    pub fn new(
        device: &wgpu::Device,
        loader: &dyn ResourceLoader,
        config: &SimulationConfig,
        fields: &FieldSet,
    ) -> OceanResult<Self> {
        let module = load_shader(device, loader, "shaders/evolve.wgsl")?;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Evolve Bind Group Layout"),
            entries: &[
                sampled_entry(0),
                sampled_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
                storage_entry(5),
                storage_entry(6),
                uniform_entry(7, false),
            ],
        });
        let pipeline = compute_pipeline(device, "Evolve Pipeline", &module, "evolve", &layout)?;
        let uniforms = uniform_buffer(device, "Evolve Uniforms", &Self::uniforms_at(config, 0.0));

        let mut entries = vec![view_entry(0, &fields.h0), view_entry(1, &fields.h0_minus)];
        for (i, target) in FftTarget::ALL.into_iter().enumerate() {
            entries.push(view_entry(2 + i as u32, fields.spectrum(target)));
        }
        entries.push(wgpu::BindGroupEntry {
            binding: 7,
            resource: uniforms.as_entire_binding(),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Evolve Bind Group"),
            layout: &layout,
            entries: &entries,
        });

        Ok(Self {
            pipeline,
            bind_group,
            uniforms,
        })
    }

    fn uniforms_at(config: &SimulationConfig, time_s: f32) -> EvolveUniforms {
        EvolveUniforms {
            time: time_s,
            patch_length: config.patch_length_m,
            gravity: config.gravity,
            resolution: config.resolution,
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, config: &SimulationConfig, time_s: f32) {
        queue.write_buffer(
            &self.uniforms,
            0,
            bytemuck::bytes_of(&Self::uniforms_at(config, time_s)),
        );
    }

    pub fn record(&self, pass: &mut wgpu::ComputePass<'_>, resolution: u32) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(workgroups(resolution), workgroups(resolution), 1);
    }
}

/// Per-pass butterfly selector, addressed by dynamic offset
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FftPassUniforms {
    pub stage: u32,
    /// 0 = horizontal, 1 = vertical
    pub direction: u32,
    pub _padding: [u32; 2],
}

/// Butterfly and finalize passes for all five transforms
pub struct FftStage {
    butterfly_pipeline: wgpu::ComputePipeline,
    finalize_pipeline: wgpu::ComputePipeline,
    pass_stride: u32,
    stages: u32,
    /// Per target: [field -> ping-pong, ping-pong -> field]
    butterfly_groups: Vec<[wgpu::BindGroup; 2]>,
    finalize_groups: Vec<wgpu::BindGroup>,
}

impl FftStage {
    pub fn new(
        device: &wgpu::Device,
        loader: &dyn ResourceLoader,
        config: &SimulationConfig,
        fields: &FieldSet,
    ) -> OceanResult<Self> {
        let module = load_shader(device, loader, "shaders/fft.wgsl")?;

        let butterfly_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Butterfly Bind Group Layout"),
            entries: &[sampled_entry(0), sampled_entry(1), storage_entry(2), uniform_entry(3, true)],
        });
        let finalize_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FFT Finalize Bind Group Layout"),
            entries: &[sampled_entry(1), storage_entry(2)],
        });
        let butterfly_pipeline = compute_pipeline(
            device,
            "Butterfly Pipeline",
            &module,
            "butterfly_pass",
            &butterfly_layout,
        )?;
        let finalize_pipeline =
            compute_pipeline(device, "FFT Finalize Pipeline", &module, "finalize", &finalize_layout)?;

        // One aligned uniform slot per (axis, stage)
        let stages = config.butterfly_stages();
        let align = device.limits().min_uniform_buffer_offset_alignment;
        let pass_stride = (std::mem::size_of::<FftPassUniforms>() as u32).div_ceil(align) * align;
        let mut slots = vec![0u8; (pass_stride * 2 * stages) as usize];
        for direction in 0..2u32 {
            for stage in 0..stages {
                let offset = ((direction * stages + stage) * pass_stride) as usize;
                let value = FftPassUniforms {
                    stage,
                    direction,
                    _padding: [0; 2],
                };
                let bytes = bytemuck::bytes_of(&value);
                slots[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
        }
        let pass_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("FFT Pass Uniforms"),
            contents: &slots,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let pass_binding = wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &pass_uniforms,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<FftPassUniforms>() as u64),
        });

        let butterfly_group = |label: &str, src: &FieldTexture, dst: &FieldTexture| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &butterfly_layout,
                entries: &[
                    view_entry(0, &fields.butterfly),
                    view_entry(1, src),
                    view_entry(2, dst),
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: pass_binding.clone(),
                    },
                ],
            })
        };

        let mut butterfly_groups = Vec::with_capacity(FftTarget::ALL.len());
        let mut finalize_groups = Vec::with_capacity(FftTarget::ALL.len());
        for target in FftTarget::ALL {
            let spectrum = fields.spectrum(target);
            butterfly_groups.push([
                butterfly_group(&format!("{target:?} Butterfly Forward"), spectrum, &fields.pingpong),
                butterfly_group(&format!("{target:?} Butterfly Back"), &fields.pingpong, spectrum),
            ]);
            finalize_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{target:?} Finalize")),
                layout: &finalize_layout,
                entries: &[view_entry(1, spectrum), view_entry(2, fields.output(target))],
            }));
        }

        Ok(Self {
            butterfly_pipeline,
            finalize_pipeline,
            pass_stride,
            stages,
            butterfly_groups,
            finalize_groups,
        })
    }

    pub fn record_butterfly(
        &self,
        pass: &mut wgpu::ComputePass<'_>,
        target: FftTarget,
        axis: FftAxis,
        stage: u32,
        from_field: bool,
        resolution: u32,
    ) {
        let direction = match axis {
            FftAxis::Horizontal => 0,
            FftAxis::Vertical => 1,
        };
        let offset = (direction * self.stages + stage) * self.pass_stride;
        let group = &self.butterfly_groups[target_slot(target)][usize::from(!from_field)];
        pass.set_pipeline(&self.butterfly_pipeline);
        pass.set_bind_group(0, group, &[offset]);
        pass.dispatch_workgroups(workgroups(resolution), workgroups(resolution), 1);
    }

    pub fn record_finalize(&self, pass: &mut wgpu::ComputePass<'_>, target: FftTarget, resolution: u32) {
        pass.set_pipeline(&self.finalize_pipeline);
        pass.set_bind_group(0, &self.finalize_groups[target_slot(target)], &[]);
        pass.dispatch_workgroups(workgroups(resolution), workgroups(resolution), 1);
    }
}

fn target_slot(target: FftTarget) -> usize {
    FftTarget::ALL
        .iter()
        .position(|t| *t == target)
        .unwrap_or_default()
}

/// Uniforms for the normal map
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct NormalMapUniforms {
    pub choppiness: f32,
    pub wave_height: f32,
    pub texel_size_m: f32,
    pub _padding: f32,
}

impl NormalMapUniforms {
    pub fn new(config: &SimulationConfig, params: &OceanParams) -> Self {
        Self {
            choppiness: params.choppiness(),
            wave_height: params.wave_height(),
            texel_size_m: config.texel_size_m(),
            _padding: 0.0,
        }
    }
}

/// Derives `(normal, foam)` from height, slopes and displacement
pub struct NormalMapStage {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    uniforms: wgpu::Buffer,
}

impl NormalMapStage {
    pub fn new(
        device: &wgpu::Device,
        loader: &dyn ResourceLoader,
        config: &SimulationConfig,
        fields: &FieldSet,
    ) -> OceanResult<Self> {
        let module = load_shader(device, loader, "shaders/normal_map.wgsl")?;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Normal Map Bind Group Layout"),
            entries: &[
                sampled_entry(0),
                sampled_entry(1),
                sampled_entry(2),
                sampled_entry(3),
                sampled_entry(4),
                storage_entry(5),
                uniform_entry(6, false),
            ],
        });
        let pipeline =
            compute_pipeline(device, "Normal Map Pipeline", &module, "derive_normals", &layout)?;
        let uniforms = uniform_buffer(
            device,
            "Normal Map Uniforms",
            &NormalMapUniforms::new(config, &OceanParams::default()),
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Normal Map Bind Group"),
            layout: &layout,
            entries: &[
                view_entry(0, fields.output(FftTarget::Height)),
                view_entry(1, fields.output(FftTarget::SlopeX)),
                view_entry(2, fields.output(FftTarget::SlopeZ)),
                view_entry(3, fields.output(FftTarget::DisplacementX)),
                view_entry(4, fields.output(FftTarget::DisplacementZ)),
                view_entry(5, &fields.normal_map),
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        });
        Ok(Self {
            pipeline,
            bind_group,
            uniforms,
        })
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, config: &SimulationConfig, params: &OceanParams) {
        queue.write_buffer(
            &self.uniforms,
            0,
            bytemuck::bytes_of(&NormalMapUniforms::new(config, params)),
        );
    }

    pub fn record(&self, pass: &mut wgpu::ComputePass<'_>, resolution: u32) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(workgroups(resolution), workgroups(resolution), 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_cover() {
        assert_eq!(workgroups(256), 16);
        assert_eq!(workgroups(4), 1);
        assert_eq!(workgroups(17), 2);
    }

    #[test]
    fn test_uniform_layouts_have_no_implicit_padding() {
        assert_eq!(std::mem::size_of::<SpectrumUniforms>(), 32);
        assert_eq!(std::mem::size_of::<EvolveUniforms>(), 16);
        assert_eq!(std::mem::size_of::<FftPassUniforms>(), 16);
        assert_eq!(std::mem::size_of::<NormalMapUniforms>(), 16);
    }
}
