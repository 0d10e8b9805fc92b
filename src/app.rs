//! Visualizer builder and the windowed render loop.
//!
//! [`Visualizer`] collects settings and opens a window. Each redraw runs one
//! tick:
//!
//! 1. advance the clock
//! 2. apply key actions and pointer drags
//! 3. apply pending parameter changes and step the simulation
//! 4. move the camera and update the render state
//! 5. draw the scene offscreen, blit it to the window and present
//! 6. request the next redraw
//!
//! The non-GPU half of that tick lives in [`Session`] so it can be driven
//! without a window.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::camera::OrbitCamera;
use crate::error::{GpuError, VisualizerError};
use crate::gpu::{FrameCapture, GpuContext, OffscreenTarget, Presenter};
use crate::input::{Action, Input};
use crate::params::Theme;
use crate::presets::Preset;
use crate::scene::{FractalScene, ParticleScene, Scene};
use crate::scheduler::{scaled_viewport, FrameScheduler, FrameStats};
use crate::time::{Time, FPS_WINDOW};

/// Window and presentation settings shared by both pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub theme: Theme,
    pub auto_rotate: bool,
    /// Multiplier on the camera profile's auto-rotate rates.
    pub rotation_speed: f32,
    /// Initial inner size in logical pixels.
    pub window_size: (u32, u32),
    /// Where `S` writes PNG files.
    pub capture_dir: PathBuf,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            auto_rotate: false,
            rotation_speed: 1.0,
            window_size: (1280, 720),
            capture_dir: PathBuf::from("captures"),
        }
    }
}

// ========== Builder ==========

/// A visualizer builder.
///
/// Use method chaining to configure, then call `.run()` to open the window.
///
/// ```ignore
/// Visualizer::mandelbulb()
///     .with_preset(FractalPreset::Midnight)
///     .with_auto_rotate(true)
///     .run()?;
/// ```
pub struct Visualizer<S: Scene> {
    preset: S::Preset,
    seed: Option<u64>,
    settings: Vec<String>,
    view: ViewSettings,
}

impl Visualizer<ParticleScene> {
    /// The curl-noise galaxy.
    pub fn particles() -> Self {
        Self::new()
    }
}

impl Visualizer<FractalScene> {
    /// The ray-marched Mandelbulb.
    pub fn mandelbulb() -> Self {
        Self::new()
    }
}

impl<S: Scene> Visualizer<S> {
    /// Start from the pipeline's first preset with default view settings.
    pub fn new() -> Self {
        Self {
            preset: S::Preset::ALL[0],
            seed: None,
            settings: Vec::new(),
            view: ViewSettings::default(),
        }
    }

    pub fn with_preset(mut self, preset: S::Preset) -> Self {
        self.preset = preset;
        self
    }

    /// Seed the random generator. Without one a seed is drawn and logged.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override one field with a `name=value` assignment, applied after the preset.
    pub fn with_setting(mut self, assignment: impl Into<String>) -> Self {
        self.settings.push(assignment.into());
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.view.theme = theme;
        self
    }

    pub fn with_auto_rotate(mut self, enabled: bool) -> Self {
        self.view.auto_rotate = enabled;
        self
    }

    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.view.rotation_speed = speed.max(0.0);
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.view.window_size = (width.max(1), height.max(1));
        self
    }

    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.view.capture_dir = dir.into();
        self
    }

    /// Build the scene and its session without opening a window.
    pub fn session(&self) -> Result<Session<S>, VisualizerError> {
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut scene = S::build(self.preset, seed);
        for assignment in &self.settings {
            scene.store_mut().assign(assignment)?;
        }
        // Zero-length step: resize buffers to the assigned values
        scene.step(0.0, 0.0);
        log::info!(
            "{} pipeline, preset '{}', seed {}",
            S::NAME,
            scene.preset_label(),
            seed
        );
        Ok(Session::new(scene, &self.view))
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), VisualizerError> {
        let session = self.session()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(session, self.view);
        event_loop.run_app(&mut app)?;

        match app.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<S: Scene> Default for Visualizer<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Session ==========

/// Something the window has to do on behalf of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    SaveImage,
    Quit,
}

/// Everything a tick mutates except GPU resources.
pub struct Session<S: Scene> {
    scene: S,
    camera: OrbitCamera,
    theme: Theme,
    auto_rotate: bool,
    rotation_speed: f32,
    scheduler: FrameScheduler,
    time: Time,
    viewport: (u32, u32),
    changed: bool,
}

impl<S: Scene> Session<S> {
    pub fn new(scene: S, view: &ViewSettings) -> Self {
        Self {
            scene,
            camera: OrbitCamera::new(S::CAMERA),
            theme: view.theme,
            auto_rotate: view.auto_rotate,
            rotation_speed: view.rotation_speed,
            scheduler: FrameScheduler::new(),
            time: Time::new(),
            viewport: (1, 1),
            changed: false,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        self.changed = true;
        &mut self.scene
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut FrameScheduler {
        &mut self.scheduler
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }

    /// Size of the offscreen target in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Record a new offscreen size. A different size needs a fresh frame.
    pub fn set_viewport(&mut self, viewport: (u32, u32)) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.changed = true;
        }
    }

    /// Apply one key action. Returns what the window must do, if anything.
    pub fn apply(&mut self, action: Action) -> Option<Request> {
        match action {
            Action::ResetCamera => self.camera.begin_reset(),
            Action::SaveImage => return Some(Request::SaveImage),
            Action::ToggleAutoRotate => {
                self.auto_rotate = !self.auto_rotate;
                log::info!("Auto-rotate {}", if self.auto_rotate { "on" } else { "off" });
            }
            Action::ToggleTheme => {
                self.theme = self.theme.toggled();
                log::info!("Theme {:?}", self.theme);
            }
            Action::TogglePause => {
                self.time.toggle_pause();
                log::info!("Simulation {}", if self.time.is_paused() { "paused" } else { "resumed" });
            }
            Action::LoadPreset(index) => {
                if !self.scene.load_preset(index) {
                    return None;
                }
            }
            Action::RefineDetail => {
                if !self.scene.adjust_detail(true) {
                    return None;
                }
            }
            Action::CoarsenDetail => {
                if !self.scene.adjust_detail(false) {
                    return None;
                }
            }
            Action::Quit => return Some(Request::Quit),
        }
        self.changed = true;
        None
    }

    /// Run the CPU half of one frame from this frame's input.
    pub fn tick(&mut self, input: &Input) -> Vec<Request> {
        let (time, _) = self.time.update();
        let dt = self.time.frame_delta();

        let requests = input
            .actions()
            .into_iter()
            .filter_map(|action| self.apply(action))
            .collect();

        if let Some(drag) = input.orbit_drag() {
            self.camera.orbit(drag.x, drag.y);
            self.changed = true;
        }
        if let Some(drag) = input.pan_drag() {
            self.camera.pan(drag.x, drag.y);
            self.changed = true;
        }
        let lines = input.scroll_lines();
        if lines != 0.0 {
            self.camera.zoom(lines);
            self.changed = true;
        }

        self.update(time, dt);
        requests
    }

    /// Apply parameters, step the simulation, move the camera and update
    /// the render state for a frame at simulation `time` lasting `dt`
    /// wall-clock seconds.
    ///
    /// Pausing freezes only the simulation step. Preset blends, camera
    /// motion and the render state keep running on `dt`.
    pub fn update(&mut self, time: f32, dt: f32) {
        let step_dt = if self.time.is_paused() { 0.0 } else { dt };

        let mut changed = std::mem::take(&mut self.changed);
        changed |= self.scene.store_mut().tick(dt);
        changed |= self.scene.step(time, step_dt);

        if self.auto_rotate {
            self.camera.auto_rotate(dt, time, self.rotation_speed);
            changed = true;
        }
        changed |= self.camera.update(dt);

        if changed {
            self.scheduler.invalidate();
        }
        self.scheduler.advance(dt);
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            fps: self.time.fps(),
            item_count: self.scene.item_count(self.viewport),
            item_label: S::ITEM_LABEL,
            progress: self.scheduler.progress(),
            ready: self.scheduler.is_ready(),
        }
    }

    /// `<capture dir>/<stem>-<unix millis>.png` for the current scene.
    fn capture_path(&self, dir: &std::path::Path) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        crate::gpu::timestamped_path(dir, &self.scene.capture_stem(), millis)
    }
}

// ========== Window ==========

/// GPU resources of a running window.
struct Renderer<S: Scene> {
    gpu: GpuContext,
    target: OffscreenTarget,
    presenter: Presenter,
    pass: S::Pass,
}

impl<S: Scene> Renderer<S> {
    fn new(window: Arc<Window>, quality: f32) -> Result<Self, GpuError> {
        let gpu = pollster::block_on(GpuContext::new(window))?;
        let (width, height) = gpu.size();
        let (w, h) = scaled_viewport(width, height, quality);
        let target = OffscreenTarget::new(&gpu.device, w, h, gpu.format());
        let presenter = Presenter::new(&gpu, &target)?;
        let pass = S::create_pass(&gpu, gpu.format())?;
        Ok(Self {
            gpu,
            target,
            presenter,
            pass,
        })
    }

    /// Recreate the offscreen target if window size or quality moved it.
    fn fit_target(&mut self, quality: f32) {
        let (width, height) = self.gpu.size();
        let (w, h) = scaled_viewport(width, height, quality);
        if (w, h) == self.target.size() {
            return;
        }
        log::debug!("Offscreen target {}x{}", w, h);
        self.target = OffscreenTarget::new(&self.gpu.device, w, h, self.gpu.format());
        self.presenter.rebind(&self.gpu.device, &self.target);
    }

    fn render(&mut self, session: &Session<S>) -> Result<(), wgpu::SurfaceError> {
        let frame = self.gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        session.scene().render(
            &mut self.pass,
            &self.gpu,
            &mut encoder,
            &self.target,
            session.camera(),
            session.theme(),
            session.time().elapsed(),
        );
        self.presenter.draw(&mut encoder, &view);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

struct App<S: Scene> {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<S>>,
    session: Session<S>,
    input: Input,
    view: ViewSettings,
    title_refreshed: Instant,
    failure: Option<VisualizerError>,
}

impl<S: Scene> App<S> {
    fn new(session: Session<S>, view: ViewSettings) -> Self {
        Self {
            window: None,
            renderer: None,
            session,
            input: Input::new(),
            view,
            title_refreshed: Instant::now(),
            failure: None,
        }
    }

    /// Terminal initialization failure: keep `Loading`, show it, stop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: VisualizerError) {
        let message = error.to_string();
        self.session.scheduler_mut().fail(message.clone());
        if let Some(window) = &self.window {
            window.set_title(&format!("{} | {}", S::NAME, message));
        }
        self.failure = Some(error);
        event_loop.exit();
    }

    fn save_image(&self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let path = self.session.capture_path(&self.view.capture_dir);
        if let Err(e) = FrameCapture::save(&renderer.gpu, &renderer.target, &path) {
            log::error!("Failed to save {}: {}", path.display(), e);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        let requests = self.session.tick(&self.input);

        renderer.fit_target(self.session.scene().quality());
        self.session.set_viewport(renderer.target.size());

        match renderer.render(&self.session) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                renderer.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Skipping frame: {}", e),
        }

        for request in requests {
            match request {
                Request::SaveImage => self.save_image(),
                Request::Quit => event_loop.exit(),
            }
        }

        if self.title_refreshed.elapsed() >= FPS_WINDOW {
            self.title_refreshed = Instant::now();
            if let Some(window) = &self.window {
                window.set_title(&self.session.stats().title(S::NAME));
            }
        }

        self.input.begin_frame();
    }
}

impl<S: Scene> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.view.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(S::NAME)
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.window = Some(window.clone());

        match Renderer::new(window.clone(), self.session.scene().quality()) {
            Ok(renderer) => {
                self.session.set_viewport(renderer.target.size());
                self.renderer = Some(renderer);
                self.session.scheduler_mut().mark_ready();
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    if renderer.gpu.resize(physical_size.width, physical_size.height) {
                        renderer.fit_target(self.session.scene().quality());
                        self.session.set_viewport(renderer.target.size());
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{FractalPreset, ParticlePreset};
    use crate::scheduler::RenderState;

    fn ready<S: Scene>(visualizer: Visualizer<S>) -> Session<S> {
        let mut session = visualizer.session().unwrap();
        session.scheduler_mut().mark_ready();
        session
    }

    #[test]
    fn test_builder_applies_settings() {
        let session = Visualizer::particles()
            .with_preset(ParticlePreset::Performance)
            .with_seed(3)
            .with_setting("particleCount=1500")
            .with_theme(Theme::Light)
            .session()
            .unwrap();
        assert_eq!(session.scene().system().count(), 1500);
        assert_eq!(session.scene().preset_label(), "custom");
        assert_eq!(session.theme(), Theme::Light);
    }

    #[test]
    fn test_builder_rejects_unknown_field() {
        let result = Visualizer::mandelbulb().with_setting("zoom=2").session();
        assert!(matches!(result, Err(VisualizerError::Param(_))));
    }

    #[test]
    fn test_changes_drive_render_state() {
        let mut session = ready(Visualizer::mandelbulb());
        assert_eq!(session.scheduler().state(), RenderState::Ready);

        // The initial parameter snapshot counts as a change
        session.update(0.0, 0.016);
        assert_eq!(session.scheduler().state(), RenderState::Rendering);

        for i in 1..100 {
            session.update(i as f32 * 0.1, 0.1);
        }
        assert_eq!(session.scheduler().state(), RenderState::Idle);

        session.apply(Action::ToggleTheme);
        session.update(10.0, 0.016);
        assert_eq!(session.scheduler().state(), RenderState::Rendering);
    }

    #[test]
    fn test_auto_rotate_keeps_rendering() {
        let mut session = ready(Visualizer::mandelbulb().with_auto_rotate(true));
        let yaw = session.camera().yaw();
        let mut was_idle = false;
        for i in 0..200 {
            session.update(i as f32 * 0.016, 0.016);
            let idle = session.scheduler().state() == RenderState::Idle;
            // Completing a pass may flip to Idle, but the next tick re-enters Rendering
            assert!(!(idle && was_idle));
            was_idle = idle;
        }
        assert!(session.camera().yaw() > yaw);
    }

    #[test]
    fn test_requests_and_toggles() {
        let mut session = ready(Visualizer::mandelbulb());
        assert_eq!(session.apply(Action::SaveImage), Some(Request::SaveImage));
        assert_eq!(session.apply(Action::Quit), Some(Request::Quit));

        assert_eq!(session.apply(Action::ToggleAutoRotate), None);
        assert!(session.auto_rotate());

        session.apply(Action::TogglePause);
        assert!(session.time().is_paused());
        session.apply(Action::TogglePause);
        assert!(!session.time().is_paused());
    }

    #[test]
    fn test_pause_freezes_only_the_simulation() {
        let mut session = ready(Visualizer::mandelbulb().with_preset(FractalPreset::Default));
        session.apply(Action::TogglePause);
        session.apply(Action::LoadPreset(1));
        session.apply(Action::ResetCamera);
        assert!(session.scene().store().is_blending());

        for _ in 0..600 {
            session.update(0.0, 0.016);
        }

        assert_eq!(session.scheduler().state(), RenderState::Idle);
        assert!(!session.scene().store().is_blending());
        assert!(!session.camera().is_resetting());
        assert_eq!(
            session.scene().store().params(),
            &FractalPreset::Psychedelic.params()
        );
    }

    #[test]
    fn test_pause_holds_particles_still() {
        let mut session = ready(
            Visualizer::particles()
                .with_seed(4)
                .with_setting("particleCount=1000"),
        );
        session.update(0.0, 0.016);
        session.apply(Action::TogglePause);
        let frozen = session.scene().system().particles().to_vec();

        for _ in 0..30 {
            session.update(0.0, 0.016);
        }
        assert_eq!(session.scene().system().particles(), frozen.as_slice());
    }

    #[test]
    fn test_preset_action_blends() {
        let mut session = ready(Visualizer::mandelbulb().with_preset(FractalPreset::Default));
        session.apply(Action::LoadPreset(1));
        assert!(session.scene().store().is_blending());
        for _ in 0..10 {
            session.update(0.0, 0.1);
        }
        assert!(!session.scene().store().is_blending());
        assert_eq!(
            session.scene().store().params(),
            &FractalPreset::Psychedelic.params()
        );
    }

    #[test]
    fn test_stats_report_items() {
        let mut session = ready(Visualizer::mandelbulb());
        session.set_viewport((640, 360));
        let stats = session.stats();
        assert_eq!(stats.item_count, 230_400);
        assert_eq!(stats.item_label, "pixels");
        assert!(stats.ready);

        let particles = Visualizer::particles()
            .with_seed(1)
            .with_setting("particleCount=2000")
            .session()
            .unwrap();
        let stats = particles.stats();
        assert_eq!(stats.item_count, 2000);
        assert!(!stats.ready);
    }

    #[test]
    fn test_capture_path_uses_stem() {
        let session = Visualizer::mandelbulb().session().unwrap();
        let path = session.capture_path(std::path::Path::new("shots"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(path.starts_with("shots"));
        assert!(name.starts_with("mandelbulb-default-p8.0-"));
        assert!(name.ends_with(".png"));
    }
}
