//! Host-generated random inputs: the Gaussian random field and background noise.
//!
//! Both are produced once at startup and uploaded; the GPU never regenerates them.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::params::SimulationConfig;

/// Fractal background noise settings
const BACKGROUND_OCTAVES: usize = 8;
const BACKGROUND_FREQUENCY: f64 = 1.0;
const BACKGROUND_LACUNARITY: f64 = 2.0;
const BACKGROUND_PERSISTENCE: f64 = 0.15;

/// Noise-space extent covered by one patch
const BACKGROUND_EXTENT: f64 = 4.0;

/// N×N independent standard-normal 4-tuples
///
/// Channels 0/1 drive `H0(k)`, channels 2/3 drive `H0(-k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianField {
    resolution: u32,
    texels: Vec<[f32; 4]>,
}

impl GaussianField {
    /// Deterministic field for the configured seed
    pub fn generate(config: &SimulationConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let texels = (0..config.texel_count())
            .map(|_| {
                let mut sample = || rng.sample::<f32, _>(StandardNormal);
                [sample(), sample(), sample(), sample()]
            })
            .collect();
        Self {
            resolution: config.resolution,
            texels,
        }
    }

    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[(y as usize) * (self.resolution as usize) + (x as usize)]
    }

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }
}

/// Fractal Perlin texture in [0, 1], replicated across RGB with alpha 1
pub fn background_noise(config: &SimulationConfig) -> Vec<[f32; 4]> {
    let fbm = Fbm::<Perlin>::new(config.seed as u32)
        .set_octaves(BACKGROUND_OCTAVES)
        .set_frequency(BACKGROUND_FREQUENCY)
        .set_lacunarity(BACKGROUND_LACUNARITY)
        .set_persistence(BACKGROUND_PERSISTENCE);

    let n = config.resolution;
    let scale = BACKGROUND_EXTENT / n as f64;
    let mut texels = Vec::with_capacity(config.texel_count());
    for y in 0..n {
        for x in 0..n {
            let v = fbm.get([x as f64 * scale, y as f64 * scale]);
            let v = (v * 0.5 + 0.5).clamp(0.0, 1.0) as f32;
            texels.push([v, v, v, 1.0]);
        }
    }
    texels
}
