//! GPU simulation checked against the host reference.
//!
//! Skipped (with a note on stderr) when no adapter is available.

use swellfield::ocean::gpu::headless_device;
use swellfield::ocean::normals::{derive_normal_map, NormalInputs};
use swellfield::ocean::{CpuOcean, Fields, OceanSimulation, SpatialField};
use swellfield::params::{OceanParams, RenderConfig, SimulationConfig};
use swellfield::resources::{FsResourceLoader, PngImage, ResourceLoader};
use swellfield::{OceanError, OceanResult};
use tempfile::TempDir;

const N: u32 = 32;

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    match pollster::block_on(headless_device()) {
        Ok(pair) => Some(pair),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

fn run_frame(device: &wgpu::Device, queue: &wgpu::Queue, sim: &mut OceanSimulation, time_s: f32) -> bool {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Frame Encoder"),
    });
    let synthesized = sim.encode_frame(queue, &mut encoder, time_s);
    queue.submit(std::iter::once(encoder.finish()));
    synthesized
}

fn read_spatial(device: &wgpu::Device, queue: &wgpu::Queue, sim: &OceanSimulation, field: Fields) -> SpatialField {
    SpatialField::from_texels(N, &sim.read_field(device, queue, field).unwrap())
}

/// Shipped resources, except for a syntactically broken FFT shader
struct BrokenFftLoader(FsResourceLoader);

impl ResourceLoader for BrokenFftLoader {
    fn string_resource(&self, name: &str) -> OceanResult<String> {
        if name == "shaders/fft.wgsl" {
            return Ok("fn broken( {".to_string());
        }
        self.0.string_resource(name)
    }

    fn png_resource(&self, name: &str) -> OceanResult<PngImage> {
        self.0.png_resource(name)
    }
}

fn assert_close(label: &str, gpu: &SpatialField, cpu: &SpatialField) {
    let tolerance = 1e-3 * cpu.max_abs().max(1e-6);
    for (i, (g, c)) in gpu.as_slice().iter().zip(cpu.as_slice()).enumerate() {
        assert!((g - c).abs() <= tolerance, "{label} texel {i}: gpu {g} vs cpu {c}");
    }
}

#[test]
fn test_gpu_frame_matches_host_reference() {
    let Some((device, queue)) = device() else {
        return;
    };
    let config = SimulationConfig::with_resolution(N);
    let params = OceanParams::default();
    let mut sim = OceanSimulation::new(&device, &queue, &FsResourceLoader::default(), config.clone(), params.clone())
        .unwrap();
    let texel_size_m = config.texel_size_m();
    let mut host = CpuOcean::new(config).unwrap();

    let time_s = 1.5;
    assert!(run_frame(&device, &queue, &mut sim, time_s));
    let expected = host.frame(&params, time_s);

    let height = read_spatial(&device, &queue, &sim, Fields::HEIGHT);
    assert!(expected.height.max_abs() > 0.0);
    assert_close("height", &height, &expected.height);

    let dx = read_spatial(&device, &queue, &sim, Fields::DISPLACEMENT_X);
    assert_close("displacement x", &dx, &expected.displacement_x);
    let dz = read_spatial(&device, &queue, &sim, Fields::DISPLACEMENT_Z);
    let slope_x = read_spatial(&device, &queue, &sim, Fields::SLOPE_X);
    let slope_z = read_spatial(&device, &queue, &sim, Fields::SLOPE_Z);

    // The normal stage is checked against the host formula on the GPU's own inputs
    let reference = derive_normal_map(
        &NormalInputs {
            height: &height,
            slope_x: &slope_x,
            slope_z: &slope_z,
            displacement_x: &dx,
            displacement_z: &dz,
        },
        params.choppiness(),
        params.wave_height(),
        texel_size_m,
    );
    let normals = sim.read_field(&device, &queue, Fields::NORMAL_MAP).unwrap();
    for (i, (g, c)) in normals.iter().zip(&reference).enumerate() {
        assert!((0.0..=1.0).contains(&g[3]));
        for channel in 0..3 {
            assert!((g[channel] - c[channel]).abs() < 1e-3, "normal texel {i}: {g:?} vs {c:?}");
        }
    }
}

#[test]
fn test_gpu_normals_follow_choppiness() {
    let Some((device, queue)) = device() else {
        return;
    };
    let config = SimulationConfig::with_resolution(N);
    let mut sim =
        OceanSimulation::new(&device, &queue, &FsResourceLoader::default(), config, OceanParams::default()).unwrap();

    sim.params_mut().set_choppiness(1.0);
    run_frame(&device, &queue, &mut sim, 1.0);
    let gentle = sim.read_field(&device, &queue, Fields::NORMAL_MAP).unwrap();

    sim.params_mut().set_choppiness(20.0);
    run_frame(&device, &queue, &mut sim, 1.0);
    let choppy = sim.read_field(&device, &queue, Fields::NORMAL_MAP).unwrap();

    let moved = gentle
        .iter()
        .zip(&choppy)
        .any(|(a, b)| (0..3).any(|c| (a[c] - b[c]).abs() > 1e-3));
    assert!(moved, "normal map ignores choppiness");
}

#[test]
fn test_calm_sea_is_flat_on_gpu() {
    let Some((device, queue)) = device() else {
        return;
    };
    let config = SimulationConfig::with_resolution(N);
    let mut sim =
        OceanSimulation::new(&device, &queue, &FsResourceLoader::default(), config, OceanParams::calm()).unwrap();

    assert!(run_frame(&device, &queue, &mut sim, 3.0));
    let height = read_spatial(&device, &queue, &sim, Fields::HEIGHT);
    assert!(height.max_abs() < 1e-6, "calm sea max |h| = {}", height.max_abs());
    let normals = sim.read_field(&device, &queue, Fields::NORMAL_MAP).unwrap();
    assert!(normals.iter().all(|t| (t[1] - 1.0).abs() < 1e-6 && t[3] == 0.0));
}

#[test]
fn test_spectrum_is_resynthesized_only_on_wind_change() {
    let Some((device, queue)) = device() else {
        return;
    };
    let config = SimulationConfig::with_resolution(N);
    let mut sim =
        OceanSimulation::new(&device, &queue, &FsResourceLoader::default(), config, OceanParams::default()).unwrap();

    assert!(sim.is_spectrum_dirty());
    assert!(run_frame(&device, &queue, &mut sim, 0.0));
    let h0 = sim.read_field(&device, &queue, Fields::H0).unwrap();

    assert!(!run_frame(&device, &queue, &mut sim, 0.1));
    sim.params_mut().set_choppiness(12.0);
    assert!(!run_frame(&device, &queue, &mut sim, 0.2));
    assert_eq!(sim.read_field(&device, &queue, Fields::H0).unwrap(), h0);

    sim.params_mut().set_wind_speed(30.0);
    assert!(sim.is_spectrum_dirty());
    assert!(run_frame(&device, &queue, &mut sim, 0.3));
    assert_ne!(sim.read_field(&device, &queue, Fields::H0).unwrap(), h0);
    assert_eq!(sim.spectrum_generation(), 2);
}

#[test]
fn test_viewport_resize_leaves_fields_untouched() {
    let Some((device, queue)) = device() else {
        return;
    };
    let config = SimulationConfig::with_resolution(N);
    let mut sim =
        OceanSimulation::new(&device, &queue, &FsResourceLoader::default(), config, OceanParams::default()).unwrap();
    let mut render_config = RenderConfig::default();
    render_config.resize(800, 600);

    run_frame(&device, &queue, &mut sim, 2.0);
    let extents = sim.fields().extents();
    let height = sim.read_field(&device, &queue, Fields::HEIGHT).unwrap();
    let aspect = render_config.aspect_ratio();

    render_config.resize(1920, 1080);
    run_frame(&device, &queue, &mut sim, 2.0);

    assert_ne!(render_config.aspect_ratio(), aspect);
    assert_eq!(sim.fields().extents(), extents);
    assert!(extents.iter().all(|&(w, h)| w == N || h == N));
    assert_eq!(sim.read_field(&device, &queue, Fields::HEIGHT).unwrap(), height);
}

#[test]
fn test_missing_shader_fails_construction() {
    let Some((device, queue)) = device() else {
        return;
    };
    let dir = TempDir::new().unwrap();
    let loader = FsResourceLoader::new(dir.path());
    let result = OceanSimulation::new(
        &device,
        &queue,
        &loader,
        SimulationConfig::with_resolution(N),
        OceanParams::default(),
    );
    assert!(matches!(result, Err(OceanError::ResourceNotFound { .. })));
}

#[test]
fn test_invalid_shader_fails_construction() {
    let Some((device, queue)) = device() else {
        return;
    };
    let loader = BrokenFftLoader(FsResourceLoader::default());
    let result = OceanSimulation::new(
        &device,
        &queue,
        &loader,
        SimulationConfig::with_resolution(N),
        OceanParams::default(),
    );
    match result {
        Err(OceanError::ShaderBuild { label, message }) => {
            assert_eq!(label, "shaders/fft.wgsl");
            assert!(!message.is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("broken shader was accepted"),
    }
}
