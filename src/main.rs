//! Swellfield - interactive FFT ocean
//!
//! Drag with the left mouse button to orbit, right to dolly, middle to pan.
//! The wave controls are on the keyboard; see `App::handle_key`.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use swellfield::camera::{DragMode, OrbitCamera};
use swellfield::cli::Args;
use swellfield::fps::FpsTracker;
use swellfield::params::{OceanParams, OrbitCameraParams, RenderConfig, SimulationConfig};
use swellfield::rendering::RenderSystem;
use swellfield::resources::FsResourceLoader;
use swellfield::skybox::CubemapFaces;

/// Edge length of the generated sky faces
const PROCEDURAL_SKY_SIZE: u32 = 256;

const TITLE: &str = "Swellfield";

/// Main application state
struct App {
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Consumed when the window is created
    loader: FsResourceLoader,
    sim_config: SimulationConfig,
    initial_params: OceanParams,
    faces: CubemapFaces,

    camera: OrbitCamera,
    render_config: RenderConfig,
    drag: Option<DragMode>,
    cursor: Option<(f64, f64)>,

    fps: FpsTracker,
    start_time: Instant,
}

impl App {
    fn new(args: &Args, faces: CubemapFaces) -> Self {
        Self {
            window: None,
            render_system: None,
            loader: args.resource_loader(),
            sim_config: args.simulation_config(),
            initial_params: args.ocean_params(),
            faces,
            camera: OrbitCamera::new(OrbitCameraParams::default()),
            render_config: args.render_config(),
            drag: None,
            cursor: None,
            fps: FpsTracker::new(),
            start_time: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        if key == KeyCode::Escape {
            event_loop.exit();
            return;
        }
        match key {
            KeyCode::Tab => {
                self.render_config.wireframe = !self.render_config.wireframe;
                log::info!("Wireframe: {}", self.render_config.wireframe);
                if self.render_config.wireframe
                    && !self.render_system.as_ref().is_some_and(|r| r.supports_wireframe())
                {
                    log::warn!("Wireframe not supported by this adapter");
                }
                return;
            }
            KeyCode::KeyR => {
                self.camera.reset();
                return;
            }
            KeyCode::KeyJ => self.render_config.set_light_longitude(self.render_config.light_longitude() - 10.0),
            KeyCode::KeyL => self.render_config.set_light_longitude(self.render_config.light_longitude() + 10.0),
            KeyCode::KeyI => self.render_config.set_light_latitude(self.render_config.light_latitude() + 5.0),
            KeyCode::KeyK => self.render_config.set_light_latitude(self.render_config.light_latitude() - 5.0),
            _ => {
                self.adjust_params(key);
                return;
            }
        }
        log::info!(
            "Light: longitude {:.0}°, latitude {:.0}°",
            self.render_config.light_longitude(),
            self.render_config.light_latitude()
        );
    }

    fn adjust_params(&mut self, key: KeyCode) {
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };
        let params = render_system.simulation_mut().params_mut();
        let wind = *params.wind();
        match key {
            KeyCode::ArrowUp => params.set_wind_speed(wind.speed + 5.0),
            KeyCode::ArrowDown => params.set_wind_speed(wind.speed - 5.0),
            KeyCode::ArrowLeft => params.rotate_wind(15.0),
            KeyCode::ArrowRight => params.rotate_wind(-15.0),
            KeyCode::KeyA => params.set_phillips_constant(wind.phillips_constant + 0.5),
            KeyCode::KeyZ => params.set_phillips_constant(wind.phillips_constant - 0.5),
            KeyCode::KeyS => params.set_suppression(wind.suppression * 1.5),
            KeyCode::KeyX => params.set_suppression(wind.suppression / 1.5),
            KeyCode::KeyD => params.set_choppiness(params.choppiness() + 1.0),
            KeyCode::KeyC => params.set_choppiness(params.choppiness() - 1.0),
            KeyCode::KeyF => params.set_wave_height(params.wave_height() + 0.5),
            KeyCode::KeyV => params.set_wave_height(params.wave_height() - 0.5),
            _ => return,
        }
        let wind = params.wind();
        log::info!(
            "Wind {:.0} m/s toward ({:.2}, {:.2}), A={:.1}, l={:.3}, choppiness {:.0}, wave height {:.1}",
            wind.speed,
            wind.direction.x,
            wind.direction.y,
            wind.phillips_constant,
            wind.suppression,
            params.choppiness(),
            params.wave_height()
        );
    }

    fn handle_cursor(&mut self, x: f64, y: f64) {
        if let (Some(mode), Some((last_x, last_y))) = (self.drag, self.cursor) {
            self.camera.drag(mode, (x - last_x) as f32, (y - last_y) as f32);
        }
        self.cursor = Some((x, y));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.render_config.resize(width, height);
        if let Some(render_system) = self.render_system.as_mut() {
            render_system.resize(width, height);
        }
    }

    /// Simulate, draw and present a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };
        let time_s = self.start_time.elapsed().as_secs_f32();

        match render_system.render(time_s, &self.camera, &self.render_config) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => {
                let (width, height) = render_system.surface_size();
                render_system.resize(width, height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::error!("Render error: {e:?}"),
        }

        if let Some(fps) = self.fps.record_frame() {
            if let Some(window) = &self.window {
                window.set_title(&format!("{TITLE} - {fps:.1} FPS"));
            }
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.render_config.resize(size.width, size.height);

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.loader,
            self.sim_config.clone(),
            self.initial_params.clone(),
            &self.render_config,
            &self.faces,
        ));
        match render_system {
            Ok(render_system) => {
                self.render_system = Some(render_system);
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("Failed to initialize renderer: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => self.handle_key(key, event_loop),
            WindowEvent::MouseInput { state, button, .. } => {
                let mode = match button {
                    MouseButton::Left => Some(DragMode::Rotate),
                    MouseButton::Right => Some(DragMode::Dolly),
                    MouseButton::Middle => Some(DragMode::Pan),
                    _ => None,
                };
                match state {
                    ElementState::Pressed if mode.is_some() => self.drag = mode,
                    ElementState::Released if mode == self.drag => self.drag = None,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor(position.x, position.y),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / 20.0) as f32,
                };
                self.camera.scroll(lines);
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let faces = if args.procedural_sky {
        Ok(CubemapFaces::procedural_gradient(PROCEDURAL_SKY_SIZE))
    } else {
        CubemapFaces::from_loader(&args.resource_loader(), &args.skybox)
    };
    let faces = match faces {
        Ok(faces) => faces,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    let mut app = App::new(&args, faces);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
    }
}
