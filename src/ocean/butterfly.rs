//! Butterfly factor table for the radix-2 inverse FFT.
//!
//! The table is `log2(N)` texels wide and `N` texels tall. Texel `(stage, x)`
//! holds `(w.re, w.im, a, b)`: output `x` of that stage is `in[a] + w * in[b]`.
//! Stage 0 folds the bit-reversal permutation into its source indices, so the
//! transform reads its input in natural order.

use std::f64::consts::PI;

use rustfft::num_complex::Complex32;

use crate::error::OceanResult;
use crate::params::SimulationConfig;

/// Reverse the lowest `bits` bits of `x`
pub fn bit_reverse(x: u32, bits: u32) -> u32 {
    if bits == 0 {
        return 0;
    }
    x.reverse_bits() >> (32 - bits)
}

/// One decoded butterfly instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButterflyEntry {
    pub twiddle: Complex32,
    pub a: u32,
    pub b: u32,
}

/// Precomputed twiddles and source indices for every stage
#[derive(Debug, Clone)]
pub struct ButterflyTable {
    resolution: u32,
    stages: u32,
    texels: Vec<[f32; 4]>,
}

impl ButterflyTable {
    pub fn new(config: &SimulationConfig) -> OceanResult<Self> {
        config.validate()?;
        let n = config.resolution;
        let stages = config.butterfly_stages();
        let reversed: Vec<u32> = (0..n).map(|x| bit_reverse(x, stages)).collect();

        let mut texels = vec![[0.0f32; 4]; (n * stages) as usize];
        for x in 0..n {
            for stage in 0..stages {
                let span = 1u32 << stage;
                let block = span << 1;
                let k = ((x as u64 * (n / block) as u64) % n as u64) as f64;
                let angle = 2.0 * PI * k / n as f64;
                let top_wing = x % block < span;

                let (a, b) = match (stage, top_wing) {
                    (0, true) => (reversed[x as usize], reversed[x as usize + 1]),
                    (0, false) => (reversed[x as usize - 1], reversed[x as usize]),
                    (_, true) => (x, x + span),
                    (_, false) => (x - span, x),
                };

                texels[(x * stages + stage) as usize] =
                    [angle.cos() as f32, angle.sin() as f32, a as f32, b as f32];
            }
        }

        log::debug!("Butterfly table built: {} stages x {} rows", stages, n);
        Ok(Self {
            resolution: n,
            stages,
            texels,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn stages(&self) -> u32 {
        self.stages
    }

    pub fn entry(&self, stage: u32, x: u32) -> ButterflyEntry {
        let t = self.texels[(x * self.stages + stage) as usize];
        ButterflyEntry {
            twiddle: Complex32::new(t[0], t[1]),
            a: t[2] as u32,
            b: t[3] as u32,
        }
    }

    /// Texel data, row-major with width `stages` and height `N`
    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }
}
