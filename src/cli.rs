//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use crate::params::{OceanParams, RenderConfig, SimulationConfig};
use crate::resources::{FsResourceLoader, DEFAULT_RESOURCE_DIR};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "swellfield")]
#[command(about = "Real-time FFT ocean surface", long_about = None)]
pub struct Args {
    /// FFT resolution (texels per side, power of two)
    #[arg(long, value_name = "N", default_value_t = 256)]
    pub resolution: u32,

    /// Grid mesh cells per side
    #[arg(long, value_name = "CELLS", default_value_t = 256)]
    pub grid: u32,

    /// Physical side length of the simulated patch (meters)
    #[arg(long, value_name = "METERS", default_value_t = 1000.0)]
    pub patch_length: f32,

    /// Seed for the Gaussian random field
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Wind speed (m/s, clamped to 5..=100)
    #[arg(long, value_name = "M/S")]
    pub wind_speed: Option<f32>,

    /// Wind heading in degrees, 0 = +X
    #[arg(long, value_name = "DEGREES")]
    pub wind_direction: Option<f32>,

    /// Horizontal displacement scale (clamped to 1..=20)
    #[arg(long)]
    pub choppiness: Option<f32>,

    /// Vertical displacement scale (clamped to 0.5..=20)
    #[arg(long)]
    pub wave_height: Option<f32>,

    /// Start in wireframe mode
    #[arg(long)]
    pub wireframe: bool,

    /// Window width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Resource root holding shaders/ and the skybox faces
    #[arg(long, value_name = "DIR", default_value = DEFAULT_RESOURCE_DIR)]
    pub resources: PathBuf,

    /// Skybox directory under the resource root
    #[arg(long, value_name = "NAME", default_value = "skybox")]
    pub skybox: String,

    /// Use a generated sky gradient instead of the skybox images
    #[arg(long)]
    pub procedural_sky: bool,
}

impl Args {
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            resolution: self.resolution,
            grid_size: self.grid,
            patch_length_m: self.patch_length,
            seed: self.seed,
            ..SimulationConfig::default()
        }
    }

    /// Wave controls with any command-line overrides applied (and clamped)
    pub fn ocean_params(&self) -> OceanParams {
        let mut params = OceanParams::default();
        if let Some(speed) = self.wind_speed {
            params.set_wind_speed(speed);
        }
        if let Some(degrees) = self.wind_direction {
            params.set_wind_direction(Vec2::from_angle(degrees.to_radians()));
        }
        if let Some(choppiness) = self.choppiness {
            params.set_choppiness(choppiness);
        }
        if let Some(wave_height) = self.wave_height {
            params.set_wave_height(wave_height);
        }
        params
    }

    pub fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        config.window_width = self.width;
        config.window_height = self.height;
        config.wireframe = self.wireframe;
        config
    }

    pub fn resource_loader(&self) -> FsResourceLoader {
        FsResourceLoader::new(&self.resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parameter_defaults() {
        let args = Args::parse_from(["swellfield"]);
        assert_eq!(args.simulation_config(), SimulationConfig::default());
        assert_eq!(args.ocean_params(), OceanParams::default());
        assert!(!args.render_config().wireframe);
        assert_eq!(args.resources, PathBuf::from(DEFAULT_RESOURCE_DIR));
    }

    #[test]
    fn test_overrides_are_clamped() {
        let args = Args::parse_from([
            "swellfield",
            "--wind-speed",
            "500",
            "--choppiness",
            "0",
            "--wind-direction",
            "90",
            "--resolution",
            "128",
            "--wireframe",
        ]);
        let params = args.ocean_params();
        assert_eq!(params.wind().speed, 100.0);
        assert_eq!(params.choppiness(), 1.0);
        assert!((params.wind().direction - Vec2::Y).length() < 1e-5);
        assert_eq!(args.simulation_config().resolution, 128);
        assert!(args.render_config().wireframe);
    }

    #[test]
    fn test_window_size_reaches_render_config() {
        let args = Args::parse_from(["swellfield", "--width", "1920", "--height", "1080"]);
        let config = args.render_config();
        assert_eq!((config.window_width, config.window_height), (1920, 1080));
        assert_eq!(config.light_latitude(), RenderConfig::default().light_latitude());
    }
}
