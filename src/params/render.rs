//! Rendering configuration: viewport, projection and lighting controls.

use glam::{Mat4, Vec3};

/// Light latitude bounds (degrees)
pub const LIGHT_LATITUDE_RANGE: std::ops::RangeInclusive<f32> = -90.0..=90.0;

/// Rendering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Viewport width (pixels)
    pub window_width: u32,

    /// Viewport height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,

    /// Rasterize the ocean as lines instead of filled triangles
    pub wireframe: bool,

    /// Clear color behind the skybox
    pub background_color: [f64; 3],

    light_longitude_deg: f32,
    light_latitude_deg: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 45.0,
            near_plane_m: 0.1,
            far_plane_m: 10000.0,
            wireframe: false,
            background_color: [0.2, 0.2, 0.2],
            light_longitude_deg: 50.0,
            light_latitude_deg: 50.0,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width.max(1) as f32 / self.window_height.max(1) as f32
    }

    /// Record a new viewport size; zero-sized viewports (minimized) are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.window_width = width;
            self.window_height = height;
        }
    }

    /// Perspective projection for the current aspect ratio
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect_ratio(),
            self.near_plane_m,
            self.far_plane_m,
        )
    }

    pub fn light_longitude(&self) -> f32 {
        self.light_longitude_deg
    }

    pub fn light_latitude(&self) -> f32 {
        self.light_latitude_deg
    }

    /// Set light longitude, wrapped into [0, 360)
    pub fn set_light_longitude(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.light_longitude_deg = degrees.rem_euclid(360.0);
        }
    }

    /// Set light latitude, clamped to [-90, 90]
    pub fn set_light_latitude(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.light_latitude_deg =
                degrees.clamp(*LIGHT_LATITUDE_RANGE.start(), *LIGHT_LATITUDE_RANGE.end());
        }
    }

    /// Unit light direction from longitude/latitude (spherical angles)
    pub fn light_direction(&self) -> Vec3 {
        let lon = self.light_longitude_deg.to_radians();
        let lat = self.light_latitude_deg.to_radians();
        Vec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_changes_aspect_only() {
        let mut config = RenderConfig::default();
        config.resize(800, 600);
        assert!((config.aspect_ratio() - 800.0 / 600.0).abs() < 1e-6);

        config.resize(1920, 1080);
        assert!((config.aspect_ratio() - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(config.fov_degrees, RenderConfig::default().fov_degrees);
    }

    #[test]
    fn test_zero_size_resize_is_ignored() {
        let mut config = RenderConfig::default();
        config.resize(0, 0);
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 720);
    }

    #[test]
    fn test_light_angles_are_bounded() {
        let mut config = RenderConfig::default();
        config.set_light_longitude(370.0);
        assert!((config.light_longitude() - 10.0).abs() < 1e-4);
        config.set_light_longitude(-10.0);
        assert!((config.light_longitude() - 350.0).abs() < 1e-4);
        config.set_light_latitude(120.0);
        assert_eq!(config.light_latitude(), 90.0);
    }

    #[test]
    fn test_light_direction_is_unit() {
        let config = RenderConfig::default();
        assert!((config.light_direction().length() - 1.0).abs() < 1e-5);

        let mut overhead = RenderConfig::default();
        overhead.set_light_latitude(90.0);
        assert!((overhead.light_direction().z - 1.0).abs() < 1e-5);
    }
}
