//! Easel demo -- window, event loop and presentation around an `easel_scene::Scene`.
//!
//! winit drives the loop through `ApplicationHandler`. Frame pacing comes from
//! the scene's scheduler: `about_to_wait` sleeps until `next_deadline()` with
//! `ControlFlow::WaitUntil`, then asks for a redraw. Each `RedrawRequested`:
//!
//!   1. hot-reloads the engine config if the file changed (frame boundary)
//!   2. runs one scene frame (steps + recorded draw list)
//!   3. paints the draw list and the debug overlay through egui, presents
//!
//! Keys: arrows/WASD move, Space sparks, P pause, N single step, F3 overlay,
//! R reload config, Escape quit.

mod demo_scene;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use easel_core::config::{load_config_from_path, load_config_or_default};
use easel_core::{ConfigWatcher, EngineConfig, InputState, Key, Vector2};
use easel_devtools::{DebugOverlay, OverlayActions, OverlayStats};
use easel_platform::PlatformConfig;
use easel_render::{GpuContext, Presenter};
use easel_scene::{FrameDecision, Scene};

const DEFAULT_CONFIG_PATH: &str = "assets/easel.json";

struct DemoState {
    window: Arc<Window>,
    gpu: GpuContext,
    presenter: Presenter,
    debug_overlay: DebugOverlay,
    scene: Scene,
    input: InputState,
    config: EngineConfig,
    config_watcher: ConfigWatcher,
}

impl DemoState {
    fn new(window: Arc<Window>, config: EngineConfig, config_path: PathBuf) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("Failed to initialise GPU: {err}"));
        let presenter = Presenter::new(&gpu.device, gpu.surface_format, &window);

        let mut scene = Scene::from_config(&config);
        if let Err(err) = demo_scene::populate(&mut scene) {
            panic!("Failed to build demo scene: {err}");
        }
        scene.start();

        Self {
            window,
            gpu,
            presenter,
            debug_overlay: DebugOverlay::new(),
            scene,
            input: InputState::new(),
            config,
            config_watcher: ConfigWatcher::new(config_path),
        }
    }

    fn reload_config(&mut self, reason: &str) {
        let path = self.config_watcher.path().to_path_buf();
        match load_config_from_path(&path) {
            Ok(config) => {
                let old_window = PlatformConfig::from(&self.config);
                let new_window = PlatformConfig::from(&config);
                if new_window.title != old_window.title {
                    self.window.set_title(&new_window.title);
                }
                if (new_window.width, new_window.height) != (old_window.width, old_window.height)
                {
                    let _ = self.window.request_inner_size(winit::dpi::LogicalSize::new(
                        new_window.width,
                        new_window.height,
                    ));
                }
                self.scene.apply_config(&config);
                self.config = config;
                log::info!("Config reloaded ({reason}): '{}'", path.display());
            }
            Err(err) => {
                log::error!("Config reload ({reason}) failed, keeping previous: {err}");
            }
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let stats = self.scene.stats();
        OverlayStats {
            entities: stats.entities,
            draw_commands: stats.draw_commands,
            faults_this_frame: stats.faults,
            total_faults: stats.total_faults,
            paused: self.scene.scheduler().is_paused(),
            config_label: format!("Config: {}", self.config_watcher.path().display()),
        }
    }

    /// Keys that drive the loop itself rather than the simulation.
    fn handle_control_key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => {
                log::info!("Escape pressed, stopping.");
                self.scene.scheduler_mut().stop();
                self.window.request_redraw();
            }
            Key::F3 => self.debug_overlay.toggle(),
            Key::P => self.scene.scheduler_mut().toggle_pause(),
            Key::N => self.scene.scheduler_mut().request_single_step(),
            Key::R => self.reload_config("manual trigger (R)"),
            _ => return false,
        }
        true
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }

        if self.config_watcher.should_reload() {
            self.reload_config("file watcher");
        }

        let decision = self.scene.frame(&self.input);
        if decision == FrameDecision::Halt {
            if self.scene.scheduler().is_stopped() {
                event_loop.exit();
            }
            return;
        }

        let stats = self.overlay_stats();
        let mut overlay_actions = OverlayActions::default();
        let surface = self.scene.surface();
        let debug_overlay = &self.debug_overlay;
        let time = self.scene.time();
        let frame = self.presenter.prepare(
            &self.window,
            surface.draw_list(),
            surface.options().scale,
            |ctx| overlay_actions = debug_overlay.show(ctx, time, &stats),
        );
        let background = surface.options().background;
        self.presenter
            .present(&self.gpu, &self.window, frame, background);

        if overlay_actions.toggle_pause {
            self.scene.scheduler_mut().toggle_pause();
        }
        if overlay_actions.single_step {
            self.scene.scheduler_mut().request_single_step();
        }

        // Only clear edge-triggered input after at least one step consumed it.
        if self.scene.stats().steps > 0 {
            self.input.end_frame();
        }
    }
}

struct App {
    config_path: PathBuf,
    state: Option<DemoState>,
}

impl App {
    fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let config = load_config_or_default(&self.config_path).unwrap_or_else(|err| {
            panic!(
                "Failed to load config '{}': {}",
                self.config_path.display(),
                err
            )
        });
        let window = easel_platform::create_window(event_loop, &PlatformConfig::from(&config))
            .unwrap_or_else(|err| panic!("Failed to create window: {err}"));
        // The scheduler has no deadline until its first frame has run.
        window.request_redraw();
        self.state = Some(DemoState::new(window, config, self.config_path.clone()));
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &self.state else {
            return;
        };
        match state.scene.scheduler().next_deadline() {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    state.window.request_redraw();
                }
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .presenter
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => {
                                if !event.repeat && state.handle_control_key(key) {
                                    return;
                                }
                                state.input.key_down(key);
                            }
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let scale = state.scene.surface().options().scale as f64
                    * state.window.scale_factor();
                state.input.mouse_position =
                    Vector2::new((position.x / scale) as f32, (position.y / scale) as f32);
            }

            WindowEvent::RedrawRequested => state.redraw(event_loop),

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyN => Some(Key::N),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Easel demo starting...");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config_path);
    event_loop.run_app(&mut app).expect("Event loop error");
}
