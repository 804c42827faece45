//! Properties of the inverse FFT engine and the spectrum pipeline on the host.

use std::f32::consts::PI;

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

use swellfield::ocean::evolve::evolve;
use swellfield::ocean::{ButterflyTable, ComplexField, GaussianField, InverseFft2d, SpectrumSynthesizer};
use swellfield::params::{SimulationConfig, WindParams};

fn engine(n: u32) -> InverseFft2d {
    InverseFft2d::new(ButterflyTable::new(&SimulationConfig::with_resolution(n)).unwrap())
}

/// Small deterministic pseudo-random field (no RNG needed for these checks)
fn patterned_field(n: u32, salt: f32) -> ComplexField {
    let data = (0..n * n)
        .map(|i| {
            let t = i as f32 + salt;
            Complex32::new((t * 0.37).sin(), (t * 0.91).cos() * 0.5)
        })
        .collect();
    ComplexField::from_vec(n, data)
}

#[test]
fn test_transform_is_linear() {
    let n = 16;
    let fft = engine(n);
    let a = patterned_field(n, 0.0);
    let b = patterned_field(n, 7.5);
    let sum = ComplexField::from_vec(
        n,
        a.as_slice().iter().zip(b.as_slice()).map(|(x, y)| x + y).collect(),
    );

    let ta = fft.transform(&a);
    let tb = fft.transform(&b);
    let tsum = fft.transform(&sum);
    for i in 0..(n * n) as usize {
        let expected = ta.as_slice()[i] + tb.as_slice()[i];
        assert!(
            (tsum.as_slice()[i] - expected).abs() < 1e-5,
            "texel {i}: {} vs {expected}",
            tsum.as_slice()[i]
        );
    }
}

#[test]
fn test_minimal_grid_single_bin_is_cosine_along_x() {
    let n = 4;
    let mut input = ComplexField::zeros(n);
    input.set_wavevector(1, 0, Complex32::new(1.0, 0.0));
    let out = engine(n).transform(&input);

    let amplitude = 1.0 / (n * n) as f32;
    for y in 0..n {
        for x in 0..n {
            let expected = amplitude * (2.0 * PI * x as f32 / n as f32).cos();
            let got = out.get(x, y);
            assert!((got - expected).abs() < 1e-6, "({x},{y}): {got} vs {expected}");
            // Constant along the other axis
            assert!((got - out.get(x, 0)).abs() < 1e-7);
        }
    }
}

#[test]
fn test_single_bin_matches_phase_and_frequency() {
    let n = 32;
    let (kx, kz) = (3, -2);
    let phase = 0.7f32;
    let mut input = ComplexField::zeros(n);
    input.set_wavevector(kx, kz, Complex32::from_polar(1.0, phase));
    let out = engine(n).transform(&input);

    let amplitude = 1.0 / (n * n) as f32;
    for y in 0..n {
        for x in 0..n {
            let angle = 2.0 * PI * (kx as f32 * x as f32 + kz as f32 * y as f32) / n as f32 + phase;
            let expected = amplitude * angle.cos();
            assert!((out.get(x, y) - expected).abs() < 1e-6);
        }
    }
}

#[test]
fn test_butterfly_passes_match_reference_inverse_dft() {
    let n = 16usize;
    let input = patterned_field(n as u32, 3.0);
    let raw = engine(n as u32).butterfly_passes(&input);

    // Rows then columns with a planned inverse FFT
    let mut planner = FftPlanner::<f32>::new();
    let inverse = planner.plan_fft_inverse(n);
    let mut data = input.as_slice().to_vec();
    for row in data.chunks_mut(n) {
        inverse.process(row);
    }
    for x in 0..n {
        let mut column: Vec<Complex32> = (0..n).map(|y| data[y * n + x]).collect();
        inverse.process(&mut column);
        for (y, value) in column.into_iter().enumerate() {
            data[y * n + x] = value;
        }
    }

    for (i, (got, expected)) in raw.as_slice().iter().zip(&data).enumerate() {
        assert!((got - expected).norm() < 1e-3, "texel {i}: {got} vs {expected}");
    }
}

#[test]
fn test_synthesize_then_evolve_is_deterministic() {
    let config = SimulationConfig::with_resolution(32);
    let wind = WindParams::default();

    let run = || {
        let mut synthesizer = SpectrumSynthesizer::new(config.clone(), GaussianField::generate(&config));
        synthesizer.update(&wind);
        let fields = evolve(&config, synthesizer.spectrum(), 0.0);
        engine(config.resolution).transform(&fields.height)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_unchanged_wind_keeps_cached_spectrum() {
    let config = SimulationConfig::with_resolution(16);
    let wind = WindParams::default();
    let mut synthesizer = SpectrumSynthesizer::new(config.clone(), GaussianField::generate(&config));

    assert!(synthesizer.update(&wind));
    let first = synthesizer.spectrum().clone();
    assert!(!synthesizer.update(&wind));
    assert_eq!(synthesizer.spectrum(), &first);
}
