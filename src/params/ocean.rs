//! Ocean simulation parameters: fixed simulation layout and live wave controls.

use std::ops::RangeInclusive;

use glam::Vec2;

use crate::error::{OceanError, OceanResult};

/// Wind speed bounds (meters per second)
pub const WIND_SPEED_RANGE: RangeInclusive<f32> = 5.0..=100.0;

/// Phillips amplitude constant bounds (dimensionless)
pub const PHILLIPS_RANGE: RangeInclusive<f32> = 0.1..=20.0;

/// Small-wave suppression length bounds (meters)
pub const SUPPRESSION_RANGE: RangeInclusive<f32> = 0.001..=10.0;

/// Horizontal displacement scale bounds
pub const CHOPPINESS_RANGE: RangeInclusive<f32> = 1.0..=20.0;

/// Vertical displacement scale bounds
pub const WAVE_HEIGHT_RANGE: RangeInclusive<f32> = 0.5..=20.0;

fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

/// Fixed layout of one simulation instance
///
/// Every stage constructor receives this value; nothing in the pipeline
/// hardcodes the resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// FFT resolution N (texels per side, power of two)
    pub resolution: u32,

    /// Grid mesh cells per side (vertices per side = grid_size + 1)
    pub grid_size: u32,

    /// Physical side length of the simulated patch (meters)
    pub patch_length_m: f32,

    /// Gravitational acceleration (m/s²) used by the dispersion relation
    pub gravity: f32,

    /// Seed for the Gaussian random field
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            grid_size: 256,
            patch_length_m: 1000.0,
            gravity: 9.81,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Config with the given resolution and otherwise default values
    pub fn with_resolution(resolution: u32) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    /// Check the resolution is a power of two and the grid is non-empty
    pub fn validate(&self) -> OceanResult<()> {
        if self.resolution < 2 || !self.resolution.is_power_of_two() {
            return Err(OceanError::InvalidResolution(self.resolution));
        }
        if self.grid_size == 0 {
            return Err(OceanError::InvalidGridSize(self.grid_size));
        }
        Ok(())
    }

    /// Number of butterfly stages per 1D transform (log2 N)
    pub fn butterfly_stages(&self) -> u32 {
        self.resolution.trailing_zeros()
    }

    /// Texel count of one field
    pub fn texel_count(&self) -> usize {
        (self.resolution as usize) * (self.resolution as usize)
    }

    /// World-space spacing between neighbouring texels (meters)
    pub fn texel_size_m(&self) -> f32 {
        self.patch_length_m / self.resolution as f32
    }
}

/// Parameters the Phillips spectrum depends on
///
/// A change to any of these invalidates the cached initial spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindParams {
    /// Wind direction on the XZ plane (unit length)
    pub direction: Vec2,

    /// Wind speed (m/s)
    pub speed: f32,

    /// Phillips amplitude constant A
    pub phillips_constant: f32,

    /// Suppression length l for small waves (meters)
    pub suppression: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            direction: Vec2::new(1.0, 1.0).normalize(),
            speed: 80.0,
            phillips_constant: 4.0,
            suppression: 0.1,
        }
    }
}

/// Live, user-tunable wave controls
///
/// All writes go through clamping setters so the numerical stages never see
/// out-of-range values.
#[derive(Debug, Clone, PartialEq)]
pub struct OceanParams {
    wind: WindParams,
    choppiness: f32,
    wave_height: f32,
}

impl Default for OceanParams {
    fn default() -> Self {
        Self {
            wind: WindParams::default(),
            choppiness: 5.0,
            wave_height: 1.0,
        }
    }
}

impl OceanParams {
    /// Windless sea; bypasses the wind speed clamp
    pub fn calm() -> Self {
        let mut params = Self::default();
        params.wind.speed = 0.0;
        params
    }

    pub fn wind(&self) -> &WindParams {
        &self.wind
    }

    pub fn choppiness(&self) -> f32 {
        self.choppiness
    }

    pub fn wave_height(&self) -> f32 {
        self.wave_height
    }

    /// Set wind direction; zero or non-finite vectors are ignored
    pub fn set_wind_direction(&mut self, direction: Vec2) {
        if let Some(dir) = direction.try_normalize() {
            self.wind.direction = dir;
        }
    }

    pub fn set_wind_speed(&mut self, speed: f32) {
        self.wind.speed = clamp_to(speed, &WIND_SPEED_RANGE);
    }

    pub fn set_phillips_constant(&mut self, value: f32) {
        self.wind.phillips_constant = clamp_to(value, &PHILLIPS_RANGE);
    }

    pub fn set_suppression(&mut self, value: f32) {
        self.wind.suppression = clamp_to(value, &SUPPRESSION_RANGE);
    }

    pub fn set_choppiness(&mut self, value: f32) {
        self.choppiness = clamp_to(value, &CHOPPINESS_RANGE);
    }

    pub fn set_wave_height(&mut self, value: f32) {
        self.wave_height = clamp_to(value, &WAVE_HEIGHT_RANGE);
    }

    /// Rotate the wind direction by `degrees` around the vertical axis
    pub fn rotate_wind(&mut self, degrees: f32) {
        let rotation = Vec2::from_angle(degrees.to_radians());
        self.set_wind_direction(rotation.rotate(self.wind.direction));
    }
}
