//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables are collected here with:
//! - Physical units (meters, seconds, degrees)
//! - Documented ranges, enforced by clamping setters
//! - Defaults matching the reference ocean setup

mod camera;
mod ocean;
mod render;

// Re-export all types
pub use camera::OrbitCameraParams;
pub use ocean::{
    OceanParams, SimulationConfig, WindParams, CHOPPINESS_RANGE, PHILLIPS_RANGE,
    SUPPRESSION_RANGE, WAVE_HEIGHT_RANGE, WIND_SPEED_RANGE,
};
pub use render::{RenderConfig, LIGHT_LATITUDE_RANGE};
