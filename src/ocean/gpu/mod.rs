//! GPU-resident ocean simulation.
//!
//! [`OceanSimulation`] owns every field texture and compute stage. Each frame
//! it records the dispatches of a [`FrameSchedule`] into the caller's encoder,
//! one compute pass per barrier-free group, and never waits on the GPU.

mod stages;
mod textures;

pub use stages::{
    load_shader, scoped, workgroups, EvolveUniforms, FftPassUniforms, NormalMapUniforms,
    SpectrumUniforms, WORKGROUP_SIZE,
};
pub use textures::{FieldSet, FieldTexture, FIELD_FORMAT};

use stages::{EvolveStage, FftStage, NormalMapStage, SpectrumStage};

use super::butterfly::ButterflyTable;
use super::noise::{background_noise, GaussianField};
use super::schedule::{Fields, FrameSchedule, Stage};
use super::spectrum::SpectrumCache;
use crate::error::{OceanError, OceanResult};
use crate::params::{OceanParams, SimulationConfig};
use crate::resources::ResourceLoader;

/// Storage textures written by the evolve stage
const EVOLVE_OUTPUTS: u32 = 5;

/// Device limits the simulation needs beyond the defaults
pub fn required_limits() -> wgpu::Limits {
    wgpu::Limits {
        max_storage_textures_per_shader_stage: EVOLVE_OUTPUTS,
        ..wgpu::Limits::default()
    }
}

/// Device and queue without a surface (tests, offline tools)
pub async fn headless_device() -> OceanResult<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
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
        .ok_or(OceanError::Adapter)?;
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Headless Ocean Device"),
                required_features: wgpu::Features::empty(),
                required_limits: required_limits(),
                memory_hints: Default::default(),
            },
            None,
        )
        .await?;
    Ok((device, queue))
}

/// Owned simulation context: every field handle, stage and parameter
pub struct OceanSimulation {
    config: SimulationConfig,
    params: OceanParams,
    fields: FieldSet,
    spectrum: SpectrumStage,
    evolve: EvolveStage,
    fft: FftStage,
    normals: NormalMapStage,
    cache: SpectrumCache,
}

impl OceanSimulation {
    /// Build every stage and upload the one-time inputs
    ///
    /// The butterfly table, Gaussian field and background noise are uploaded
    /// here exactly once. The first [`encode_frame`](Self::encode_frame)
    /// synthesizes the initial spectrum.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        loader: &dyn ResourceLoader,
        config: SimulationConfig,
        params: OceanParams,
    ) -> OceanResult<Self> {
        config.validate()?;
        log::info!(
            "Creating ocean simulation: N={}, patch {} m, {} butterfly stages",
            config.resolution,
            config.patch_length_m,
            config.butterfly_stages()
        );

        let fields = FieldSet::new(device, &config);
        let spectrum = SpectrumStage::new(device, loader, &config, &fields)?;
        let evolve = EvolveStage::new(device, loader, &config, &fields)?;
        let fft = FftStage::new(device, loader, &config, &fields)?;
        let normals = NormalMapStage::new(device, loader, &config, &fields)?;

        let table = ButterflyTable::new(&config)?;
        fields.butterfly.upload(queue, table.texels());
        fields.gaussian.upload(queue, GaussianField::generate(&config).texels());
        fields.noise.upload(queue, &background_noise(&config));

        Ok(Self {
            config,
            params,
            fields,
            spectrum,
            evolve,
            fft,
            normals,
            cache: SpectrumCache::default(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn params(&self) -> &OceanParams {
        &self.params
    }

    /// Mutable parameters; wind changes are picked up on the next frame
    pub fn params_mut(&mut self) -> &mut OceanParams {
        &mut self.params
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn is_spectrum_dirty(&self) -> bool {
        self.cache.is_dirty(self.params.wind())
    }

    /// Number of spectrum syntheses recorded so far
    pub fn spectrum_generation(&self) -> u64 {
        self.cache.generation()
    }

    /// Record one simulation frame at `time_s`
    ///
    /// Returns whether the initial spectrum was regenerated.
    pub fn encode_frame(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        time_s: f32,
    ) -> bool {
        let wind = *self.params.wind();
        let synthesize = self.cache.is_dirty(&wind);
        if synthesize {
            log::info!(
                "Synthesizing spectrum: wind {:.1} m/s toward ({:.2}, {:.2}), A={:.2}, l={:.3}",
                wind.speed,
                wind.direction.x,
                wind.direction.y,
                wind.phillips_constant,
                wind.suppression
            );
            self.spectrum.write_uniforms(queue, &self.config, &wind);
        }
        self.evolve.write_uniforms(queue, &self.config, time_s);
        self.normals.write_uniforms(queue, &self.config, &self.params);

        let schedule = FrameSchedule::for_frame(self.config.butterfly_stages(), synthesize);
        let passes = schedule.passes();
        log::debug!(
            "Frame t={time_s:.3}s: {} dispatches, {} barriers, {} compute passes",
            schedule.dispatches().count(),
            schedule.barrier_count(),
            passes.len()
        );
        for dispatches in passes {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Ocean Simulation Pass"),
                timestamp_writes: None,
            });
            for dispatch in &dispatches {
                self.record(&mut pass, dispatch.stage);
            }
        }

        if synthesize {
            self.cache.mark_synthesized(wind);
        }
        synthesize
    }

    fn record(&self, pass: &mut wgpu::ComputePass<'_>, stage: Stage) {
        let n = self.config.resolution;
        match stage {
            Stage::Synthesize => self.spectrum.record(pass, n),
            Stage::Evolve => self.evolve.record(pass, n),
            Stage::Butterfly {
                target,
                axis,
                stage,
                from_field,
            } => self.fft.record_butterfly(pass, target, axis, stage, from_field, n),
            Stage::Finalize { target } => self.fft.record_finalize(pass, target, n),
            Stage::NormalMap => self.normals.record(pass, n),
        }
    }

    /// Copy one field back to the host (debug inspection; blocks)
    pub fn read_field(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        field: Fields,
    ) -> OceanResult<Vec<[f32; 4]>> {
        let texture = self
            .fields
            .get(field)
            .ok_or_else(|| OceanError::UnknownField(format!("{field:?}")))?;
        texture.read_back(device, queue)
    }
}
