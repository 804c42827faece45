//! Phillips spectrum synthesis and the wind-keyed regeneration cache.

use glam::Vec2;
use rustfft::num_complex::Complex32;

use super::field::ComplexField;
use super::noise::GaussianField;
use crate::params::{SimulationConfig, WindParams};

/// Below this wavenumber (rad/m) the spectrum is forced to zero
pub const MIN_WAVENUMBER: f32 = 1e-4;

/// Wavevector (rad/m) of texel `(x, y)`; the zero frequency sits at `(N/2, N/2)`
pub fn wavevector(config: &SimulationConfig, x: u32, y: u32) -> Vec2 {
    let half = (config.resolution / 2) as f32;
    let scale = std::f32::consts::TAU / config.patch_length_m;
    Vec2::new((x as f32 - half) * scale, (y as f32 - half) * scale)
}

/// Phillips spectrum weight for wavevector `k`
///
/// `P(k) = A exp(-1/(|k| Lw)^2) / |k|^4 (k̂·ŵ)^2 exp(-|k|^2 l^2)` with
/// `Lw = V^2 / g`.
pub fn phillips(k: Vec2, wind: &WindParams, gravity: f32) -> f32 {
    let k_len = k.length();
    if k_len < MIN_WAVENUMBER {
        return 0.0;
    }
    let largest_wave = wind.speed * wind.speed / gravity;
    if largest_wave <= 0.0 {
        return 0.0;
    }

    let k_len2 = k_len * k_len;
    let alignment = (k / k_len).dot(wind.direction);
    let kl = k_len * largest_wave;

    wind.phillips_constant * (-1.0 / (kl * kl)).exp() / (k_len2 * k_len2)
        * alignment
        * alignment
        * (-k_len2 * wind.suppression * wind.suppression).exp()
}

/// Time-independent spectrum pair `H0(k)`, `H0(-k)`
#[derive(Debug, Clone, PartialEq)]
pub struct InitialSpectrum {
    pub h0: ComplexField,
    pub h0_minus: ComplexField,
}

/// Build the initial spectrum pair from the Gaussian field and wind
pub fn synthesize(
    config: &SimulationConfig,
    wind: &WindParams,
    gaussian: &GaussianField,
) -> InitialSpectrum {
    let n = config.resolution;
    let mut h0 = ComplexField::zeros(n);
    let mut h0_minus = ComplexField::zeros(n);

    for y in 0..n {
        for x in 0..n {
            let k = wavevector(config, x, y);
            let xi = gaussian.get(x, y);
            let amp_k = (phillips(k, wind, config.gravity) / 2.0).sqrt();
            let amp_minus_k = (phillips(-k, wind, config.gravity) / 2.0).sqrt();
            h0.set(x, y, Complex32::new(xi[0], xi[1]) * amp_k);
            h0_minus.set(x, y, Complex32::new(xi[2], xi[3]) * amp_minus_k);
        }
    }

    InitialSpectrum { h0, h0_minus }
}

/// Tracks which wind parameters the current initial spectrum was built for
///
/// The spectrum is dirty until synthesized once and whenever any wind
/// parameter differs from the recorded one.
#[derive(Debug, Clone, Default)]
pub struct SpectrumCache {
    synthesized_for: Option<WindParams>,
    generation: u64,
}

impl SpectrumCache {
    pub fn is_dirty(&self, wind: &WindParams) -> bool {
        self.synthesized_for.as_ref() != Some(wind)
    }

    pub fn mark_synthesized(&mut self, wind: WindParams) {
        self.synthesized_for = Some(wind);
        self.generation += 1;
    }

    /// Number of syntheses performed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Host-side synthesizer holding the cached pair
pub struct SpectrumSynthesizer {
    config: SimulationConfig,
    gaussian: GaussianField,
    cache: SpectrumCache,
    spectrum: InitialSpectrum,
}

impl SpectrumSynthesizer {
    pub fn new(config: SimulationConfig, gaussian: GaussianField) -> Self {
        let n = config.resolution;
        Self {
            config,
            gaussian,
            cache: SpectrumCache::default(),
            spectrum: InitialSpectrum {
                h0: ComplexField::zeros(n),
                h0_minus: ComplexField::zeros(n),
            },
        }
    }

    /// Regenerate if the wind changed; returns whether work was done
    pub fn update(&mut self, wind: &WindParams) -> bool {
        if !self.cache.is_dirty(wind) {
            return false;
        }
        self.spectrum = synthesize(&self.config, wind, &self.gaussian);
        self.cache.mark_synthesized(*wind);
        true
    }

    pub fn spectrum(&self) -> &InitialSpectrum {
        &self.spectrum
    }

    pub fn cache(&self) -> &SpectrumCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig::with_resolution(16)
    }

    #[test]
    fn test_zero_wavevector_has_no_energy() {
        let config = small_config();
        let k = wavevector(&config, 8, 8);
        assert_eq!(k, Vec2::ZERO);
        assert_eq!(phillips(k, &WindParams::default(), config.gravity), 0.0);
    }

    #[test]
    fn test_zero_wind_speed_is_flat() {
        let wind = WindParams {
            speed: 0.0,
            ..Default::default()
        };
        let k = Vec2::new(0.05, 0.02);
        assert_eq!(phillips(k, &wind, 9.81), 0.0);
    }

    #[test]
    fn test_cross_wind_waves_are_suppressed() {
        let wind = WindParams {
            direction: Vec2::X,
            ..Default::default()
        };
        let along = phillips(Vec2::new(0.05, 0.0), &wind, 9.81);
        let across = phillips(Vec2::new(0.0, 0.05), &wind, 9.81);
        assert!(along > 0.0);
        assert!(across.abs() < 1e-12);
    }

    #[test]
    fn test_phillips_is_even_in_k() {
        let wind = WindParams::default();
        let k = Vec2::new(0.03, -0.07);
        assert_eq!(phillips(k, &wind, 9.81), phillips(-k, &wind, 9.81));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let config = small_config();
        let gaussian = GaussianField::generate(&config);
        let wind = WindParams::default();
        assert_eq!(
            synthesize(&config, &wind, &gaussian),
            synthesize(&config, &wind, &gaussian)
        );
    }

    #[test]
    fn test_cache_skips_unchanged_wind() {
        let config = small_config();
        let mut synth = SpectrumSynthesizer::new(config.clone(), GaussianField::generate(&config));
        let wind = WindParams::default();

        assert!(synth.update(&wind));
        let first = synth.spectrum().clone();
        assert!(!synth.update(&wind));
        assert_eq!(synth.spectrum(), &first);
        assert_eq!(synth.cache().generation(), 1);

        let stronger = WindParams {
            speed: 90.0,
            ..wind
        };
        assert!(synth.update(&stronger));
        assert_ne!(synth.spectrum(), &first);
        assert_eq!(synth.cache().generation(), 2);
    }
}
