//! Platform layer: window, event loop and the glue between the render loop
//! state machine and the GPU renderer (winit 0.30 `ApplicationHandler`).

pub mod render_loop;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use asset::{MeshAsset, TextureCache, obj::load_obj_from_path};
use corelib::animation::AnimationClip;
use renderer::{GpuState, MaterialBindings, OverlayTextures, TextureId, plan_frame};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

pub use render_loop::{FrameInput, LoopState, RenderLoop};
pub use renderer::{OverlayMode, SceneLayout};

/// Everything `run` needs; assembled by the binary from CLI flags.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub obj_path: PathBuf,
    pub face_path: PathBuf,
    pub blink_face_path: PathBuf,
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    pub show_fps: bool,
    pub clip: AnimationClip,
    pub layout: SceneLayout,
}

/// Load the model, open the window and play the clip until the window closes.
/// Asset and GPU init errors are returned; nothing is retried.
pub fn run(config: RunConfig) -> Result<()> {
    config.clip.validate().context("invalid animation clip")?;

    // Parse before any window exists so a bad OBJ never opens one.
    let asset = load_obj_from_path(&config.obj_path)
        .with_context(|| format!("failed to load model {}", config.obj_path.display()))?;
    log::info!(
        "Model: {} triangle(s) in {} group(s), {} material(s)",
        asset.triangle_count(),
        asset.groups.len(),
        asset.materials.len()
    );

    let event_loop = EventLoop::new().map_err(|e| anyhow!("event loop error: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, asset);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("event loop error: {e:?}"))?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Set up once the window and device exist.
struct Scene {
    window: Arc<Window>,
    gpu: GpuState,
    bindings: MaterialBindings<TextureId>,
    overlay: OverlayTextures<TextureId>,
    render_loop: RenderLoop,
}

struct App {
    config: RunConfig,
    asset: MeshAsset,
    textures: TextureCache<TextureId>,
    scene: Option<Scene>,
    fps: FpsCounter,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: RunConfig, asset: MeshAsset) -> Self {
        Self {
            config,
            asset,
            textures: TextureCache::new(),
            scene: None,
            fps: FpsCounter::new(Instant::now()),
            fatal: None,
        }
    }

    fn init_scene(&mut self, event_loop: &ActiveEventLoop) -> Result<Scene> {
        let attrs = Window::default_attributes()
            .with_title("Apple Dance")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| anyhow!("failed to create window: {e}"))?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let mut gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.config.backends,
            &self.asset,
            self.config.layout.overlay_size,
        ))
        .context("failed to initialize renderer")?;

        let bindings = MaterialBindings::resolve(&self.asset, &mut self.textures, &mut gpu);
        let primary = self
            .textures
            .resolve(&self.config.face_path, &mut gpu)
            .context("failed to load face texture")?;
        // Hidden blinks never sample the alternate face.
        let alternate = match self.config.layout.overlay_mode {
            OverlayMode::Swap => self
                .textures
                .resolve(&self.config.blink_face_path, &mut gpu)
                .context("failed to load blink face texture")?,
            OverlayMode::Hide => primary,
        };
        let overlay = OverlayTextures { primary, alternate };
        log::info!("{} texture(s) resident", self.textures.len());

        Ok(Scene {
            window,
            gpu,
            bindings,
            overlay,
            render_loop: RenderLoop::new(self.config.clip.clone(), Instant::now()),
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let Some(frame) = scene.render_loop.tick(Instant::now()) else {
            return;
        };

        let plan = plan_frame(
            &frame.pose,
            &self.config.layout,
            &scene.bindings,
            &scene.overlay,
        );
        let camera = self.config.layout.camera(scene.gpu.aspect(), frame.t);
        match scene.gpu.render(&plan, &camera) {
            Ok(()) => {}
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface lost/outdated. Recreating...");
                scene.gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fatal = Some(anyhow!("GPU out of memory"));
                scene.render_loop.request_close();
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Render error: {e:?}"),
        }

        if self.config.show_fps {
            if let Some(fps) = self.fps.frame(Instant::now()) {
                log::info!("FPS: {fps:.1} (frame {})", frame.frame_index);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() || self.fatal.is_some() {
            return;
        }
        match self.init_scene(event_loop) {
            Ok(scene) => {
                self.fps = FpsCounter::new(Instant::now());
                self.scene = Some(scene);
            }
            Err(e) => {
                log::error!("{e:#}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        if scene.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                scene.render_loop.request_close();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                scene.gpu.resize(new_size.width, new_size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = scene.window.inner_size();
                log::debug!(
                    "Scale factor changed: {scale_factor:.3}, inner_size={}x{}",
                    size.width,
                    size.height
                );
                scene.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(scene) = &self.scene {
            if scene.render_loop.is_running() {
                scene.window.request_redraw();
            }
        }
    }
}

/// Counts frames and reports the rate once per second.
#[derive(Debug)]
struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    fn frame(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }
        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_reports_once_per_second() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        for i in 1..60 {
            assert!(fps.frame(start + Duration::from_millis(i * 16)).is_none());
        }
        let rate = fps.frame(start + Duration::from_secs(1)).expect("report");
        assert!((rate - 60.0).abs() < 1e-6);
        assert!(fps.frame(start + Duration::from_millis(1_010)).is_none());
    }

    #[test]
    fn run_fails_fast_on_missing_model() {
        let config = RunConfig {
            obj_path: PathBuf::from("definitely/missing/apple.obj"),
            face_path: PathBuf::from("smile_1.png"),
            blink_face_path: PathBuf::from("smile_2.png"),
            backends: wgpu::Backends::all(),
            width: 800,
            height: 600,
            show_fps: false,
            clip: AnimationClip::default(),
            layout: SceneLayout::default(),
        };
        let err = run(config).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load model"));
    }
}
