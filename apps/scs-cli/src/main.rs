use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use scs_common::Light;
use scs_csg::{RenderOptions, ScsRenderer, Strategy};
use scs_render::{GraphicsDevice, SoftwareDevice, Surface, SurfaceImage};
use scs_render_wgpu::WgpuDevice;
use scs_scene::{Camera, SceneDesc};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scs-cli", about = "Image-space CSG renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// CPU rasterizer, always available
    Software,
    /// GPU through wgpu, headless
    Wgpu,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Render a scene to a PNG file
    Render {
        /// Scene description (JSON); the built-in demo when omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Compositing strategy: classic, optimize-merges or id-colors
        #[arg(long, default_value = "classic")]
        strategy: Strategy,
        #[arg(short, long, value_enum, default_value = "software")]
        backend: Backend,
        #[arg(long, default_value = "640")]
        width: u32,
        #[arg(long, default_value = "480")]
        height: u32,
        /// Camera position; the camera looks at the origin
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values = ["0", "1.5", "6"], allow_negative_numbers = true)]
        eye: Vec<f32>,
        /// Skip passthrough objects
        #[arg(long)]
        no_passthrough: bool,
        /// Also write the scratch target, final accumulator and depth view
        #[arg(long)]
        debug: bool,
        /// Print the frame report as JSON
        #[arg(long)]
        report: bool,
        #[arg(short, long, default_value = "csg.png")]
        out: PathBuf,
    },
    /// Write the built-in demo scene as JSON
    Demo {
        #[arg(short, long, default_value = "demo-scene.json")]
        out: PathBuf,
    },
}

struct RenderJob {
    desc: SceneDesc,
    camera: Camera,
    options: RenderOptions,
    width: u32,
    height: u32,
    debug: bool,
    report: bool,
    out: PathBuf,
}

fn default_lights() -> Vec<Light> {
    vec![
        Light::Point {
            position: Vec3::new(4.0, 6.0, 6.0),
            color: Vec3::ONE,
            intensity: 0.6,
        },
        Light::Directional {
            direction: Vec3::new(-0.5, -1.0, -0.8),
            color: Vec3::ONE,
            intensity: 0.8,
        },
    ]
}

fn save_png(image: &SurfaceImage, path: &Path) -> anyhow::Result<()> {
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba8())
        .context("surface size does not match its pixel data")?;
    rgba.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "image written");
    Ok(())
}

fn run<D: GraphicsDevice>(device: D, job: &RenderJob) -> anyhow::Result<()> {
    let mut renderer = ScsRenderer::new(device)?;
    renderer.set_size(job.width, job.height)?;
    renderer.load(&job.desc)?;
    if renderer.lights().is_empty() {
        renderer.add_lights(default_lights());
    }
    renderer.set_debug(job.debug);

    let report = renderer.render(&job.camera, &job.options)?;
    println!(
        "Rendered {} products with {} ({} passthrough objects)",
        report.products.len(),
        report.strategy,
        report.passthrough_drawn
    );
    if job.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    let frame = renderer.device_mut().read_surface(Surface::Framebuffer)?;
    save_png(&frame, &job.out)?;

    if let Some(capture) = renderer.debug_capture() {
        save_png(
            &capture.scratch.opaque_rgb(),
            &job.out.with_extension("scratch.png"),
        )?;
        if let Some(accumulator) = &capture.accumulator {
            save_png(
                &accumulator.opaque_rgb(),
                &job.out.with_extension("accum.png"),
            )?;
        }
        save_png(&capture.depth_view, &job.out.with_extension("depth.png"))?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("scs-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", scs_common::crate_info());
            println!("scene: {}", scs_scene::crate_info());
            println!("render: {}", scs_render::crate_info());
            println!("csg: {}", scs_csg::crate_info());
            println!(
                "strategies: {}",
                Strategy::ALL.map(Strategy::name).join(", ")
            );
        }
        Commands::Render {
            scene,
            strategy,
            backend,
            width,
            height,
            eye,
            no_passthrough,
            debug,
            report,
            out,
        } => {
            let desc = match &scene {
                Some(path) => {
                    let json = std::fs::read_to_string(path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    SceneDesc::from_json(&json)?
                }
                None => SceneDesc::demo(),
            };
            let eye = Vec3::from_slice(&eye);
            let aspect = width as f32 / height.max(1) as f32;
            let job = RenderJob {
                desc,
                camera: Camera::perspective(
                    eye,
                    Vec3::ZERO,
                    45f32.to_radians(),
                    aspect,
                    0.5,
                    100.0,
                ),
                options: RenderOptions {
                    draw_passthrough: !no_passthrough,
                    ..RenderOptions::with_strategy(strategy)
                },
                width,
                height,
                debug,
                report,
                out,
            };
            tracing::info!(?backend, %strategy, width, height, "rendering");
            match backend {
                Backend::Software => run(SoftwareDevice::new(width, height)?, &job)?,
                Backend::Wgpu => run(WgpuDevice::new_headless(width, height)?, &job)?,
            }
        }
        Commands::Demo { out } => {
            std::fs::write(&out, SceneDesc::demo().to_json()?)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Demo scene written to {}", out.display());
        }
    }

    Ok(())
}
