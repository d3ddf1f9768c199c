//! gridtrace CLI - inspect and benchmark regular-grid acceleration
//!
//! Builds grids over JSON scene descriptions, prints their statistics and
//! times ray queries against them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridtrace_grid::{AccelerationMode, GridConfig, GridConfigBuilder, RegularGrid};
use gridtrace_scene::{Scene, SceneDescription};
use std::fs;
use std::path::{Path, PathBuf};

mod bench;
mod scenegen;

#[derive(Parser)]
#[command(name = "gridtrace")]
#[command(about = "Regular-grid ray acceleration toolkit", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a grid over a scene and print its statistics
    Info {
        /// Scene description (.json)
        #[arg(short, long)]
        scene: PathBuf,
        /// Grid configuration (.toml); replaces the mode preset
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Acceleration mode preset
        #[arg(short, long, default_value = "default")]
        mode: AccelerationMode,
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Time a parallel fan of rays through a scene
    Bench {
        /// Scene description (.json); a procedural sphere field if omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Sphere count of the procedural scene
        #[arg(long, default_value_t = 10_000)]
        spheres: usize,
        /// Seed of the procedural scene
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Grid configuration (.toml); replaces the mode preset
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Acceleration mode preset ("none" tests every geometry per ray)
        #[arg(short, long, default_value = "default")]
        mode: AccelerationMode,
        /// Rays per row
        #[arg(long, default_value_t = 512)]
        width: usize,
        /// Rows of rays
        #[arg(long, default_value_t = 512)]
        height: usize,
        /// Collect every intersection instead of the closest one
        #[arg(long)]
        all: bool,
    },
    /// Write a procedural sphere-field scene
    Generate {
        /// Output scene description (.json)
        output: PathBuf,
        /// Number of spheres
        #[arg(long, default_value_t = 1_000)]
        spheres: usize,
        /// Random seed
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Add a ground plane under the spheres
        #[arg(long)]
        ground: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Info {
            scene,
            config,
            mode,
            json,
        } => {
            show_info(&scene, config.as_deref(), mode, json)?;
        }
        Commands::Bench {
            scene,
            spheres,
            seed,
            config,
            mode,
            width,
            height,
            all,
        } => {
            let scene = match scene {
                Some(path) => load_scene(&path)?,
                None => scenegen::sphere_field(spheres, seed, false).to_scene()?,
            };
            let config = load_config(config.as_deref(), mode)?;
            let query = if all {
                bench::Query::All
            } else {
                bench::Query::Closest
            };
            let fan = bench::Fan { width, height };
            let report = bench::run(&scene, mode, config, fan, query)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Generate {
            output,
            spheres,
            seed,
            ground,
        } => {
            let desc = scenegen::sphere_field(spheres, seed, ground);
            fs::write(&output, desc.to_json()?)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} shapes to {}", desc.shapes.len(), output.display());
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> Result<Scene> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let desc = SceneDescription::from_json(&json)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(desc.to_scene()?)
}

/// Grid configuration for a run; `None` when the grid is bypassed.
fn load_config(path: Option<&Path>, mode: AccelerationMode) -> Result<Option<GridConfig>> {
    if mode == AccelerationMode::None {
        return Ok(None);
    }
    match path {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            let builder: GridConfigBuilder =
                toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
            Ok(Some(builder.build()?))
        }
        None => Ok(GridConfig::for_mode(mode)),
    }
}

fn show_info(
    scene_path: &Path,
    config_path: Option<&Path>,
    mode: AccelerationMode,
    json: bool,
) -> Result<()> {
    let scene = load_scene(scene_path)?;
    let Some(config) = load_config(config_path, mode)? else {
        println!("Scene: {} ({} geometries)", scene_path.display(), scene.len());
        println!("  Acceleration: none (every geometry is tested per ray)");
        return Ok(());
    };
    let grid = RegularGrid::new(&scene, config)?;
    let stats = grid.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    let r = grid.resolution();
    let size = grid.voxel_size();
    let bounds = grid.scene_bounds();
    println!("Scene: {} ({} geometries)", scene_path.display(), scene.len());
    println!("  Mode: {}", mode);
    println!(
        "  Bounds: [{:.3}, {:.3}, {:.3}] - [{:.3}, {:.3}, {:.3}]",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    );
    println!("  Resolution: {} x {} x {}", r[0], r[1], r[2]);
    println!("  Voxel size: {:.4} x {:.4} x {:.4}", size.x, size.y, size.z);
    println!(
        "  Storage: {} (~{} KiB)",
        if stats.sparse { "sparse" } else { "dense" },
        stats.memory_bytes / 1024
    );
    println!("\nGeometry:");
    println!("  Finite: {}", stats.finite_geometries);
    println!("  Infinite: {}", stats.infinite_geometries);
    println!("\nVoxels:");
    println!("  Total cells: {}", stats.total_cells);
    println!("  Occupied: {}", stats.occupied_voxels);
    println!("  References: {}", stats.total_references);
    println!("  Max occupancy: {}", stats.max_occupancy);
    println!("  Average occupancy: {:.2}", stats.average_occupancy);
    if stats.overfull_voxels > 0 {
        println!(
            "  Overfull (> {}): {}",
            grid.config().max_objects_per_voxel(),
            stats.overfull_voxels
        );
    }

    Ok(())
}
