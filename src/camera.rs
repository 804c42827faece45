//! Orbit camera driven by mouse drags, exposed read-only through [`ViewSource`].

use glam::{Mat4, Vec3};

use crate::params::OrbitCameraParams;

/// Read-only provider of the view transform
///
/// The renderer only ever reads from this; it never moves the camera.
pub trait ViewSource {
    /// World-to-view matrix
    fn view_matrix(&self) -> Mat4;

    /// Eye position in world space
    fn eye_position(&self) -> Vec3 {
        self.view_matrix().inverse().w_axis.truncate()
    }
}

/// Which mouse button is dragging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Dolly,
    Pan,
}

/// Camera orbiting the origin at a dolly distance, with screen-space pan
pub struct OrbitCamera {
    params: OrbitCameraParams,
    yaw_deg: f32,
    pitch_deg: f32,
    dolly_m: f32,
    pan_m: (f32, f32),
}

impl OrbitCamera {
    pub fn new(params: OrbitCameraParams) -> Self {
        let mut camera = Self {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            dolly_m: 0.0,
            pan_m: (0.0, 0.0),
            params,
        };
        camera.reset();
        camera
    }

    /// Back to the initial orientation, dolly and pan
    pub fn reset(&mut self) {
        self.yaw_deg = self.params.yaw_deg;
        self.pitch_deg = self.params.pitch_deg;
        self.dolly_m = self.params.dolly_m;
        self.pan_m = (0.0, 0.0);
    }

    pub fn dolly(&self) -> f32 {
        self.dolly_m
    }

    /// Apply a mouse drag of `(dx, dy)` pixels
    pub fn drag(&mut self, mode: DragMode, dx: f32, dy: f32) {
        match mode {
            DragMode::Rotate => {
                self.yaw_deg += dx * self.params.rotate_deg_per_px;
                self.pitch_deg = (self.pitch_deg + dy * self.params.rotate_deg_per_px).clamp(-89.0, 89.0);
            }
            DragMode::Dolly => self.move_dolly(-dy * self.params.dolly_m_per_px),
            DragMode::Pan => {
                self.pan_m.0 += dx * self.params.pan_m_per_px;
                self.pan_m.1 -= dy * self.params.pan_m_per_px;
            }
        }
    }

    /// Apply `lines` of scroll wheel movement (positive moves closer)
    pub fn scroll(&mut self, lines: f32) {
        self.move_dolly(-lines * self.params.dolly_m_per_line);
    }

    fn move_dolly(&mut self, delta_m: f32) {
        self.dolly_m = (self.dolly_m + delta_m).clamp(self.params.min_dolly_m, self.params.max_dolly_m);
    }
}

impl ViewSource for OrbitCamera {
    fn view_matrix(&self) -> Mat4 {
        let translation = Mat4::from_translation(Vec3::new(self.pan_m.0, self.pan_m.1, -self.dolly_m));
        let rotation = Mat4::from_rotation_x(self.pitch_deg.to_radians())
            * Mat4::from_rotation_y(self.yaw_deg.to_radians());
        translation * rotation
    }
}

/// View matrix with translation removed, for the skybox
pub fn rotation_only(view: Mat4) -> Mat4 {
    let mut rotation = view;
    rotation.w_axis = glam::Vec4::W;
    rotation
}
