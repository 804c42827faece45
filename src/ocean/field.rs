//! Host-side N×N fields mirroring the GPU textures.
//!
//! Storage is row-major: texel `(x, y)` lives at `y * N + x`, with `x` along
//! the wavevector X axis and `y` along the Z axis.

use rustfft::num_complex::Complex32;

/// Complex-valued frequency (or intermediate) field
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexField {
    resolution: u32,
    data: Vec<Complex32>,
}

impl ComplexField {
    pub fn zeros(resolution: u32) -> Self {
        let n = resolution as usize;
        Self {
            resolution,
            data: vec![Complex32::new(0.0, 0.0); n * n],
        }
    }

    pub fn from_vec(resolution: u32, data: Vec<Complex32>) -> Self {
        assert_eq!(data.len(), (resolution as usize).pow(2));
        Self { resolution, data }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn get(&self, x: u32, y: u32) -> Complex32 {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Complex32) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Write the bin of centred wavevector index `(kx, kz)` in `[-N/2, N/2)`
    pub fn set_wavevector(&mut self, kx: i32, kz: i32, value: Complex32) {
        let half = (self.resolution / 2) as i32;
        let n = self.resolution as i32;
        let x = (kx + half).rem_euclid(n) as u32;
        let y = (kz + half).rem_euclid(n) as u32;
        self.set(x, y, value);
    }

    pub fn as_slice(&self) -> &[Complex32] {
        &self.data
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.resolution as usize) + (x as usize)
    }
}

/// Real-valued spatial field (height, displacement or slope)
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialField {
    resolution: u32,
    data: Vec<f32>,
}

impl SpatialField {
    pub fn zeros(resolution: u32) -> Self {
        let n = resolution as usize;
        Self {
            resolution,
            data: vec![0.0; n * n],
        }
    }

    pub fn from_vec(resolution: u32, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), (resolution as usize).pow(2));
        Self { resolution, data }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.resolution as usize) + (x as usize)]
    }

    /// Sample with periodic wrap-around (the patch tiles seamlessly)
    pub fn get_wrapped(&self, x: i64, y: i64) -> f32 {
        let n = self.resolution as i64;
        self.get(x.rem_euclid(n) as u32, y.rem_euclid(n) as u32)
    }

    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        let i = (y as usize) * (self.resolution as usize) + (x as usize);
        self.data[i] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, v| acc.max(v.abs()))
    }

    /// Real parts of `(re, _, _, _)` texels read back from the GPU
    pub fn from_texels(resolution: u32, texels: &[[f32; 4]]) -> Self {
        Self::from_vec(resolution, texels.iter().map(|t| t[0]).collect())
    }
}
