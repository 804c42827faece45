//! Spectral ocean simulation.
//!
//! The host modules (`butterfly`, `spectrum`, `evolve`, `fft`, `normals`)
//! implement the same arithmetic as the compute shaders and serve as the
//! reference the GPU path is checked against. `gpu` holds the resident
//! simulation driven once per frame.

pub mod butterfly;
pub mod evolve;
pub mod fft;
pub mod field;
pub mod gpu;
pub mod mesh;
pub mod noise;
pub mod normals;
pub mod schedule;
pub mod spectrum;

pub use butterfly::ButterflyTable;
pub use evolve::{evolve, SpectralFields};
pub use fft::{FftAxis, InverseFft2d};
pub use field::{ComplexField, SpatialField};
pub use gpu::OceanSimulation;
pub use mesh::{OceanGrid, Vertex};
pub use noise::GaussianField;
pub use schedule::{Dispatch, FftTarget, Fields, FrameSchedule, Stage};
pub use spectrum::{synthesize, InitialSpectrum, SpectrumCache, SpectrumSynthesizer};

use crate::error::OceanResult;
use crate::params::{OceanParams, SimulationConfig};

/// Spatial fields of one host-simulated frame
#[derive(Debug, Clone)]
pub struct SurfaceFrame {
    pub height: SpatialField,
    pub displacement_x: SpatialField,
    pub displacement_z: SpatialField,
    pub slope_x: SpatialField,
    pub slope_z: SpatialField,
    pub normal_map: Vec<[f32; 4]>,
}

/// Host reference of the whole per-frame pipeline
pub struct CpuOcean {
    config: SimulationConfig,
    synthesizer: SpectrumSynthesizer,
    fft: InverseFft2d,
}

impl CpuOcean {
    pub fn new(config: SimulationConfig) -> OceanResult<Self> {
        let fft = InverseFft2d::new(ButterflyTable::new(&config)?);
        let gaussian = GaussianField::generate(&config);
        Ok(Self {
            synthesizer: SpectrumSynthesizer::new(config.clone(), gaussian),
            config,
            fft,
        })
    }

    pub fn synthesizer(&self) -> &SpectrumSynthesizer {
        &self.synthesizer
    }

    /// Synthesize (if dirty), evolve, transform and derive normals
    pub fn frame(&mut self, params: &OceanParams, time_s: f32) -> SurfaceFrame {
        self.synthesizer.update(params.wind());
        let spectral = evolve(&self.config, self.synthesizer.spectrum(), time_s);

        let height = self.fft.transform(&spectral.height);
        let displacement_x = self.fft.transform(&spectral.dx);
        let displacement_z = self.fft.transform(&spectral.dz);
        let slope_x = self.fft.transform(&spectral.slope_x);
        let slope_z = self.fft.transform(&spectral.slope_z);
        let normal_map = normals::derive_normal_map(
            &normals::NormalInputs {
                height: &height,
                slope_x: &slope_x,
                slope_z: &slope_z,
                displacement_x: &displacement_x,
                displacement_z: &displacement_z,
            },
            params.choppiness(),
            params.wave_height(),
            self.config.texel_size_m(),
        );

        SurfaceFrame {
            height,
            displacement_x,
            displacement_z,
            slope_x,
            slope_z,
            normal_map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calm_sea_is_flat() {
        let mut ocean = CpuOcean::new(SimulationConfig::with_resolution(16)).unwrap();
        let frame = ocean.frame(&OceanParams::calm(), 2.0);
        assert!(frame.height.max_abs() < 1e-6);
        assert!(frame.displacement_x.max_abs() < 1e-6);
        assert!(frame.normal_map.iter().all(|t| (t[1] - 1.0).abs() < 1e-6 && t[3] == 0.0));
    }

    #[test]
    fn test_windy_sea_has_waves() {
        let mut ocean = CpuOcean::new(SimulationConfig::with_resolution(16)).unwrap();
        let frame = ocean.frame(&OceanParams::default(), 0.5);
        assert!(frame.height.max_abs() > 0.0);
        assert!(frame.height.as_slice().iter().all(|h| h.is_finite()));
    }

    #[test]
    fn test_frame_normals_follow_choppiness() {
        let mut ocean = CpuOcean::new(SimulationConfig::with_resolution(32)).unwrap();
        let mut params = OceanParams::default();
        params.set_choppiness(1.0);
        let gentle = ocean.frame(&params, 1.0);
        params.set_choppiness(20.0);
        let choppy = ocean.frame(&params, 1.0);

        assert_eq!(gentle.displacement_x, choppy.displacement_x);
        let moved = gentle
            .normal_map
            .iter()
            .zip(&choppy.normal_map)
            .any(|(a, b)| (0..3).any(|c| (a[c] - b[c]).abs() > 1e-3));
        assert!(moved, "normal map ignores choppiness");
    }

    #[test]
    fn test_frames_regenerate_only_on_wind_change() {
        let mut ocean = CpuOcean::new(SimulationConfig::with_resolution(8)).unwrap();
        let mut params = OceanParams::default();
        ocean.frame(&params, 0.0);
        ocean.frame(&params, 0.1);
        assert_eq!(ocean.synthesizer().cache().generation(), 1);

        params.set_choppiness(10.0);
        ocean.frame(&params, 0.2);
        assert_eq!(ocean.synthesizer().cache().generation(), 1);

        params.set_suppression(0.5);
        ocean.frame(&params, 0.3);
        assert_eq!(ocean.synthesizer().cache().generation(), 2);
    }
}
