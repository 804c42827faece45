//! Host reference of the 2D inverse FFT engine.
//!
//! Mirrors the GPU passes exactly: `log2(N)` horizontal butterfly passes, then
//! `log2(N)` vertical passes, alternating between the field and a single
//! ping-pong buffer, then a finalize pass that divides by `N²` and applies the
//! checkerboard sign `(-1)^(x+y)` that undoes the centred wavevector layout.

use rustfft::num_complex::Complex32;

use super::butterfly::ButterflyTable;
use super::field::{ComplexField, SpatialField};

/// Pass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftAxis {
    /// Transform along X within each row
    Horizontal,
    /// Transform along Y within each column
    Vertical,
}

/// Sign undoing the half-resolution frequency shift
pub fn checkerboard_sign(x: u32, y: u32) -> f32 {
    if (x + y) % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Butterfly-pass inverse FFT over a fixed resolution
pub struct InverseFft2d {
    table: ButterflyTable,
}

impl InverseFft2d {
    pub fn new(table: ButterflyTable) -> Self {
        Self { table }
    }

    /// Total butterfly passes per 2D transform
    pub fn pass_count(&self) -> u32 {
        2 * self.table.stages()
    }

    /// One butterfly pass from `src` into `dst`
    pub fn butterfly_pass(&self, stage: u32, axis: FftAxis, src: &ComplexField, dst: &mut ComplexField) {
        let n = self.table.resolution();
        for y in 0..n {
            for x in 0..n {
                let value = match axis {
                    FftAxis::Horizontal => {
                        let e = self.table.entry(stage, x);
                        src.get(e.a, y) + e.twiddle * src.get(e.b, y)
                    }
                    FftAxis::Vertical => {
                        let e = self.table.entry(stage, y);
                        src.get(x, e.a) + e.twiddle * src.get(x, e.b)
                    }
                };
                dst.set(x, y, value);
            }
        }
    }

    /// Unnormalized inverse DFT over texel indices (no sign correction)
    pub fn butterfly_passes(&self, input: &ComplexField) -> ComplexField {
        let mut field = input.clone();
        let mut pingpong = ComplexField::zeros(input.resolution());
        let mut in_field = true;

        for axis in [FftAxis::Horizontal, FftAxis::Vertical] {
            for stage in 0..self.table.stages() {
                if in_field {
                    self.butterfly_pass(stage, axis, &field, &mut pingpong);
                } else {
                    self.butterfly_pass(stage, axis, &pingpong, &mut field);
                }
                in_field = !in_field;
            }
        }

        if in_field {
            field
        } else {
            pingpong
        }
    }

    /// Full inverse transform to a real spatial field
    pub fn transform(&self, input: &ComplexField) -> SpatialField {
        let raw = self.butterfly_passes(input);
        finalize(&raw)
    }
}

/// Divide by `N²`, apply the checkerboard sign and keep the real part
pub fn finalize(raw: &ComplexField) -> SpatialField {
    let n = raw.resolution();
    let norm = 1.0 / (n as f32 * n as f32);
    let mut out = SpatialField::zeros(n);
    for y in 0..n {
        for x in 0..n {
            let value: Complex32 = raw.get(x, y) * (checkerboard_sign(x, y) * norm);
            out.set(x, y, value.re);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SimulationConfig;

    fn engine(n: u32) -> InverseFft2d {
        InverseFft2d::new(ButterflyTable::new(&SimulationConfig::with_resolution(n)).unwrap())
    }

    #[test]
    fn test_pass_count_is_even() {
        // The result always lands back in the field buffer
        for n in [2, 4, 8, 256] {
            assert_eq!(engine(n).pass_count() % 2, 0);
        }
    }

    #[test]
    fn test_dc_bin_gives_constant() {
        let fft = engine(8);
        let mut input = ComplexField::zeros(8);
        input.set_wavevector(0, 0, Complex32::new(64.0, 0.0));
        let out = fft.transform(&input);
        for v in out.as_slice() {
            assert!((v - 1.0).abs() < 1e-5, "expected 1, got {v}");
        }
    }

    #[test]
    fn test_one_dimensional_delta_matches_direct_sum() {
        let fft = engine(4);
        let mut input = ComplexField::zeros(4);
        input.set(1, 0, Complex32::new(1.0, 0.0));
        let raw = fft.butterfly_passes(&input);
        for y in 0..4 {
            for x in 0..4 {
                let angle = std::f32::consts::TAU * x as f32 / 4.0;
                let v = raw.get(x, y);
                assert!((v.re - angle.cos()).abs() < 1e-5);
                assert!((v.im - angle.sin()).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_checkerboard_sign() {
        assert_eq!(checkerboard_sign(0, 0), 1.0);
        assert_eq!(checkerboard_sign(1, 0), -1.0);
        assert_eq!(checkerboard_sign(3, 5), 1.0);
    }
}
