//! Swellfield - real-time FFT ocean surface on the GPU
//!
//! A Phillips spectrum is synthesized once per wind setting, evolved every
//! frame with the deep-water dispersion relation, brought to the spatial
//! domain by a butterfly inverse FFT and shaded against a cubemap sky.

pub mod camera;
pub mod cli;
pub mod error;
pub mod fps;
pub mod ocean;
pub mod params;
pub mod rendering;
pub mod resources;
pub mod skybox;

pub use error::{OceanError, OceanResult};
