//! Entry point for Apple Dance.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use corelib::animation::{AnimationClip, KeyframeSink, Pose};
use corelib::camera::CameraPan;
use platform::{OverlayMode, RunConfig, SceneLayout};

/// GPU API selection, mapped onto `wgpu::Backends`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum GpuBackend {
    #[default]
    Auto,
    #[value(alias = "vk")]
    Vulkan,
    #[value(alias = "d3d12")]
    Dx12,
    #[value(alias = "mtl")]
    Metal,
    #[value(aliases = ["opengl", "gles"])]
    Gl,
}

impl GpuBackend {
    fn backends(self) -> wgpu::Backends {
        match self {
            GpuBackend::Auto => wgpu::Backends::all(),
            GpuBackend::Vulkan => wgpu::Backends::VULKAN,
            GpuBackend::Dx12 => wgpu::Backends::DX12,
            GpuBackend::Metal => wgpu::Backends::METAL,
            GpuBackend::Gl => wgpu::Backends::GL,
        }
    }
}

/// A textured OBJ model dancing along a curved path, with a blinking face.
#[derive(Parser, Debug)]
#[command(name = "appledance", version, about)]
struct Cli {
    /// OBJ model; its `mtllib` is resolved next to it.
    #[arg(long, default_value = "models/apple.obj")]
    obj: PathBuf,

    /// Face texture shown most of the time.
    #[arg(long, default_value = "images/smile_1.png")]
    face: PathBuf,

    /// Face texture shown during blink intervals.
    #[arg(long, default_value = "images/smile_2.png")]
    blink_face: PathBuf,

    #[arg(long, default_value = "auto", value_enum)]
    gpu_backend: GpuBackend,

    /// Window size as WIDTHxHEIGHT.
    #[arg(long, default_value = "800x600", value_parser = parse_size)]
    size: (u32, u32),

    /// Seconds per animation loop.
    #[arg(long)]
    duration: Option<f64>,

    /// First frame of the timeline.
    #[arg(long)]
    start_frame: Option<u32>,

    /// Last frame of the timeline (inclusive).
    #[arg(long)]
    end_frame: Option<u32>,

    /// Hide the face during blinks instead of swapping to the blink face.
    #[arg(long)]
    hide_face: bool,

    /// Pan the camera left to right across this many units per loop.
    #[arg(long, value_name = "DISTANCE")]
    camera_pan: Option<f32>,

    /// Log frames per second once a second.
    #[arg(long)]
    show_fps: bool,

    /// Print the baked keyframe track and exit without opening a window.
    #[arg(long)]
    bake: bool,
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    Ok((w.max(1), h.max(1)))
}

fn build_clip(cli: &Cli) -> Result<AnimationClip> {
    let mut clip = AnimationClip::default();
    if let Some(secs) = cli.duration {
        clip.duration = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid --duration {secs}"))?;
    }
    if let Some(start) = cli.start_frame {
        clip.start_frame = start;
    }
    if let Some(end) = cli.end_frame {
        clip.end_frame = end;
    }
    clip.validate()?;
    Ok(clip)
}

fn build_layout(cli: &Cli) -> SceneLayout {
    SceneLayout {
        overlay_mode: if cli.hide_face {
            OverlayMode::Hide
        } else {
            OverlayMode::Swap
        },
        camera_pan: cli.camera_pan.map(CameraPan::centered),
        ..SceneLayout::default()
    }
}

/// Writes one line per keyframe to stdout.
struct PrintSink;

impl KeyframeSink for PrintSink {
    fn insert_keyframe(&mut self, frame: u32, pose: &Pose) {
        let p = pose.translation;
        let r = pose.rotation;
        println!(
            "{frame:4}  pos=({:8.3} {:8.3} {:8.3})  rot=({:7.3} {:7.3} {:7.3})  face={:?}",
            p.x, p.y, p.z, r.x, r.y, r.z, pose.expression
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let clip = build_clip(&cli)?;

    if cli.bake {
        let keys = clip.bake(&mut PrintSink);
        log::info!("Baked {keys} keyframe(s)");
        return Ok(());
    }

    let backends = cli.gpu_backend.backends();
    let (width, height) = cli.size;
    let layout = build_layout(&cli);
    log::info!(
        "Starting Apple Dance. Backend: {:?}, show_fps={}, window_size={}x{}",
        backends,
        cli.show_fps,
        width,
        height
    );

    platform::run(RunConfig {
        obj_path: cli.obj,
        face_path: cli.face,
        blink_face_path: cli.blink_face,
        backends,
        width,
        height,
        show_fps: cli.show_fps,
        clip,
        layout,
    })?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
