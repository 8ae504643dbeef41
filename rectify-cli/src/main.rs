use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rectify::report::Report;
use rectify::scene::SceneConfig;

/// Rectify a photographed quadrilateral and recover its aspect ratio and the
/// camera's field of view
#[derive(Parser)]
#[command(name = "rectify", version)]
struct Args {
    /// Scene TOML file (defaults to the built-in reference scene)
    scene: Option<PathBuf>,

    /// Estimate in centered, width-normalized coordinates (needs image_size)
    #[arg(long, conflicts_with = "raw")]
    normalize: bool,

    /// Estimate directly in pixel coordinates
    #[arg(long)]
    raw: bool,

    /// Horizontal sensor aperture in mm, for the focal length
    #[arg(long)]
    aperture: Option<f64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Suppress non-JSON output
    #[arg(short, long)]
    quiet: bool,
}

fn load_scene(path: Option<&PathBuf>) -> Result<SceneConfig> {
    let Some(path) = path else {
        return Ok(SceneConfig::reference());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    SceneConfig::from_toml(&text).with_context(|| format!("parsing scene from {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut scene = load_scene(args.scene.as_ref())?;
    if args.normalize {
        scene.normalize = true;
    }
    if args.raw {
        scene.normalize = false;
    }
    if let Some(aperture) = args.aperture {
        scene.aperture_mm = aperture;
    }

    if !args.quiet {
        eprintln!(
            "rectifying scene '{}' ({} auxiliary points, {} coordinates)",
            scene.name,
            scene.auxiliary.len(),
            if scene.normalize { "normalized" } else { "pixel" }
        );
    }

    let report =
        Report::run(&scene).with_context(|| format!("rectification of '{}' failed", scene.name))?;

    if !args.quiet {
        if let Some(aspect) = &report.aspect {
            eprintln!(
                "  λ = {:.10} from {} right angles (discrepancy {:.2}%)",
                aspect.lambda,
                aspect.estimates.len(),
                aspect.discrepancy * 100.0
            );
        }
        if let (Some(depth), Some(camera)) = (&report.depth, &report.camera) {
            eprintln!(
                "  fov = {:.4}°, focal length = {:.3} mm, base aspect ratio = {:.6}",
                camera.fov_degrees, camera.focal_length_mm, depth.aspect_ratio
            );
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
