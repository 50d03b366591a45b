use std::io::{self, BufWriter};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use sable_renderer::scene::{self, CameraSettings, Scene, BUILTIN_SCENES};
use sable_renderer::{render, render_parallel, save_image, write_ppm, RenderConfig};

mod cli;

use cli::Args;

/// Resolve `--scene` to a built-in scene or a JSON file.
fn load_scene(args: &Args) -> Result<Scene> {
    if BUILTIN_SCENES.contains(&args.scene.as_str()) {
        return scene::builtin(&args.scene, args.seed)
            .with_context(|| format!("Failed to build scene '{}'", args.scene));
    }

    let path = Path::new(&args.scene);
    scene::load_scene(path).with_context(|| format!("Failed to load scene {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level.into())
        .parse_default_env()
        .init();

    log::info!("Starting Sable");

    let start = Instant::now();
    let Scene { world, camera } = load_scene(&args)?;

    let overrides = CameraSettings {
        image_width: args.width,
        samples_per_pixel: args.samples,
        max_depth: args.max_depth,
        ..CameraSettings::default()
    };
    let mut camera = overrides.apply(camera);
    scene::validate_camera(&camera).context("Invalid camera overrides")?;
    log::info!("Scene '{}' built in {:?} ({} objects)", args.scene, start.elapsed(), world.len());

    let config = RenderConfig {
        seed: args.seed,
        ..RenderConfig::default()
    };
    let image = if args.single_threaded {
        render(&mut camera, &world, &config)
    } else {
        render_parallel(&mut camera, &world, &config)
    };

    if args.writes_stdout() {
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        write_ppm(&image, &mut writer).context("Failed to write image to stdout")?;
    } else {
        save_image(&image, &args.output)
            .with_context(|| format!("Failed to save {}", args.output.display()))?;
    }

    log::info!("Done in {:?}", start.elapsed());
    Ok(())
}
