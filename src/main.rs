use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use nalgebra::Point3;

use glimmer::util::SeededSampler;
use glimmer::{Camera, Renderer, Scene, Settings};

mod cli;

use cli::{Args, Mode};

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    if args.width == 0 || args.height == 0 {
        bail!("image size must be non-zero, got {}x{}", args.width, args.height);
    }

    let scene = Scene::default();
    let mut camera = Camera::perspective(args.fov.to_radians(), 0.1, 100.0, args.width, args.height);
    camera.look_at(Point3::new(0.0, 0.0, 6.0), Point3::origin());

    // 시드가 있으면 픽셀 순서가 고정되어야 같은 결과가 나옴
    let parallel = !args.single_threaded && args.seed.is_none();
    let settings = Settings {
        accumulate: !args.no_accumulate,
        parallel,
        ..Settings::default()
    };

    let mut renderer = match args.seed {
        Some(seed) => Renderer::with_sampler(settings, SeededSampler::new(seed)),
        None => Renderer::new(settings),
    };
    renderer.resize(args.width, args.height)?;

    if args.mode == Mode::Ssaa && args.frames > 1 {
        warn!("ssaa does not accumulate; only the last of {} frames is kept", args.frames);
    }

    let started = Instant::now();
    for _ in 0..args.frames.max(1) {
        match args.mode {
            Mode::Progressive => renderer.render(&scene, &camera)?,
            Mode::Ssaa => renderer.render_ssaa(&scene, &camera)?,
        }
    }
    let elapsed = started.elapsed();

    info!(
        "{} {:?} frame(s) at {}x{} in {:.2?} ({:.2?} per frame)",
        args.frames.max(1),
        args.mode,
        args.width,
        args.height,
        elapsed,
        elapsed / args.frames.max(1),
    );

    let image = renderer.image().context("renderer has no image")?;
    image
        .save_png(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    Ok(())
}
