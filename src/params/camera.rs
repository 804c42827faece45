//! Orbit camera configuration.

/// Orbit camera tuning (mouse sensitivity and dolly limits)
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCameraParams {
    /// Initial distance from the orbit center (meters)
    pub dolly_m: f32,

    /// Initial yaw around the vertical axis (degrees)
    pub yaw_deg: f32,

    /// Initial pitch above the horizon (degrees)
    pub pitch_deg: f32,

    /// Rotation per dragged pixel (degrees)
    pub rotate_deg_per_px: f32,

    /// Dolly change per dragged pixel (meters)
    pub dolly_m_per_px: f32,

    /// Dolly change per scroll line (meters)
    pub dolly_m_per_line: f32,

    /// Pan per dragged pixel (meters)
    pub pan_m_per_px: f32,

    /// Dolly lower bound (meters)
    pub min_dolly_m: f32,

    /// Dolly upper bound (meters)
    pub max_dolly_m: f32,
}

impl Default for OrbitCameraParams {
    fn default() -> Self {
        Self {
            dolly_m: 100.0,
            yaw_deg: 0.0,
            pitch_deg: 20.0,
            rotate_deg_per_px: 0.25,
            dolly_m_per_px: 0.5,
            dolly_m_per_line: 5.0,
            pan_m_per_px: 0.1,
            min_dolly_m: 0.0,
            max_dolly_m: 2000.0,
        }
    }
}
