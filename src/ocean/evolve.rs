//! Time evolution of the initial spectrum via the deep-water dispersion relation.

use rustfft::num_complex::Complex32;

use super::field::ComplexField;
use super::spectrum::{wavevector, InitialSpectrum, MIN_WAVENUMBER};
use crate::params::SimulationConfig;

/// Deep-water angular frequency `ω = sqrt(g |k|)`
pub fn dispersion(k_len: f32, gravity: f32) -> f32 {
    (gravity * k_len).sqrt()
}

/// Frequency-domain inputs of the five inverse FFTs
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFields {
    pub height: ComplexField,
    pub dx: ComplexField,
    pub dz: ComplexField,
    pub slope_x: ComplexField,
    pub slope_z: ComplexField,
}

/// Evolve `H0` to time `t` and derive displacement and slope spectra
pub fn evolve(config: &SimulationConfig, spectrum: &InitialSpectrum, time_s: f32) -> SpectralFields {
    let n = config.resolution;
    let mut out = SpectralFields {
        height: ComplexField::zeros(n),
        dx: ComplexField::zeros(n),
        dz: ComplexField::zeros(n),
        slope_x: ComplexField::zeros(n),
        slope_z: ComplexField::zeros(n),
    };
    let i = Complex32::new(0.0, 1.0);

    for y in 0..n {
        for x in 0..n {
            let k = wavevector(config, x, y);
            let k_len = k.length();
            if k_len < MIN_WAVENUMBER {
                continue;
            }

            let phase = dispersion(k_len, config.gravity) * time_s;
            let rotor = Complex32::from_polar(1.0, phase);
            let h = spectrum.h0.get(x, y) * rotor + spectrum.h0_minus.get(x, y).conj() * rotor.conj();

            out.height.set(x, y, h);
            out.dx.set(x, y, -i * (k.x / k_len) * h);
            out.dz.set(x, y, -i * (k.y / k_len) * h);
            out.slope_x.set(x, y, i * k.x * h);
            out.slope_z.set(x, y, i * k.y * h);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::noise::GaussianField;
    use crate::ocean::spectrum::synthesize;
    use crate::params::WindParams;

    #[test]
    fn test_zero_wavevector_stays_zero() {
        let config = SimulationConfig::with_resolution(8);
        let mut spectrum = InitialSpectrum {
            h0: ComplexField::zeros(8),
            h0_minus: ComplexField::zeros(8),
        };
        spectrum.h0.set(4, 4, Complex32::new(3.0, 1.0));
        let fields = evolve(&config, &spectrum, 1.5);
        assert_eq!(fields.height.get(4, 4), Complex32::new(0.0, 0.0));
        assert_eq!(fields.slope_x.get(4, 4), Complex32::new(0.0, 0.0));
    }

    #[test]
    fn test_time_zero_sums_pair() {
        let config = SimulationConfig::with_resolution(8);
        let mut spectrum = InitialSpectrum {
            h0: ComplexField::zeros(8),
            h0_minus: ComplexField::zeros(8),
        };
        spectrum.h0.set(5, 4, Complex32::new(1.0, 2.0));
        spectrum.h0_minus.set(5, 4, Complex32::new(0.5, 1.0));
        let fields = evolve(&config, &spectrum, 0.0);
        let h = fields.height.get(5, 4);
        assert!((h.re - 1.5).abs() < 1e-6 && (h.im - 1.0).abs() < 1e-6);

        // k along +X: dz vanishes, dx = -i h
        assert!(fields.dz.get(5, 4).norm() < 1e-6);
        let dx = fields.dx.get(5, 4);
        assert!((dx.re - h.im).abs() < 1e-6 && (dx.im + h.re).abs() < 1e-6);
    }

    #[test]
    fn test_phase_advances_with_dispersion() {
        let config = SimulationConfig::with_resolution(8);
        let mut spectrum = InitialSpectrum {
            h0: ComplexField::zeros(8),
            h0_minus: ComplexField::zeros(8),
        };
        spectrum.h0.set(6, 4, Complex32::new(1.0, 0.0));
        let k_len = wavevector(&config, 6, 4).length();
        let t = 0.7;
        let h = evolve(&config, &spectrum, t).height.get(6, 4);
        let expected = dispersion(k_len, config.gravity) * t;
        assert!((h.arg() - expected).abs() < 1e-5);
        assert!((h.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_synthesize_then_evolve_is_bit_identical() {
        let config = SimulationConfig::with_resolution(16);
        let gaussian = GaussianField::generate(&config);
        let wind = WindParams::default();
        let a = evolve(&config, &synthesize(&config, &wind, &gaussian), 0.0);
        let b = evolve(&config, &synthesize(&config, &wind, &gaussian), 0.0);
        assert_eq!(a, b);
    }
}
