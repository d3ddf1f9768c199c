//! Parallel ray-fan benchmark.

use std::time::Instant;

use anyhow::Result;
use gridtrace_grid::{
    AccelerationMode, GridConfig, GridStats, RegularGrid, TraversalStats, VoxelTraverser,
};
use gridtrace_math::{Aabb3, Point3, Vec3};
use gridtrace_scene::{Ray, Scene};
use log::info;
use rayon::prelude::*;
use serde::Serialize;

/// Which query to run per ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Closest,
    All,
}

/// Orthographic ray fan over the scene's footprint.
#[derive(Debug, Clone, Copy)]
pub struct Fan {
    pub width: usize,
    pub height: usize,
}

impl Fan {
    /// Ray through pixel `(col, row)`, fired down the -Z axis with a slight
    /// tilt so rays cross cell boundaries on every axis.
    fn ray(&self, bounds: &Aabb3, col: usize, row: usize) -> Ray {
        let u = (col as f64 + 0.5) / self.width as f64;
        let v = (row as f64 + 0.5) / self.height as f64;
        let extent = bounds.extent();
        let origin = Point3::new(
            bounds.min.x + u * extent.x,
            bounds.min.y + v * extent.y,
            bounds.max.z + 1.0,
        );
        Ray::new(origin, Vec3::new(0.05, 0.03, -1.0))
    }
}

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub mode: AccelerationMode,
    pub query: Query,
    pub geometries: usize,
    pub rays: u64,
    pub rays_hit: u64,
    pub intersections: u64,
    pub build_ms: f64,
    pub trace_ms: f64,
    pub rays_per_second: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traversal: Option<TraversalStats>,
}

/// (rays that hit something, total intersections, traversal counters)
type Tally = (u64, u64, TraversalStats);

fn add(a: Tally, b: Tally) -> Tally {
    let mut stats = a.2;
    stats.merge(&b.2);
    (a.0 + b.0, a.1 + b.1, stats)
}

/// Fire the fan through the scene, through a grid unless `config` is `None`.
pub fn run(
    scene: &Scene,
    mode: AccelerationMode,
    config: Option<GridConfig>,
    fan: Fan,
    query: Query,
) -> Result<BenchReport> {
    let bounds = scene
        .bounds()
        .unwrap_or_else(|| Aabb3::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)));
    let rays = (fan.width * fan.height) as u64;

    let (grid, build_ms) = match config {
        Some(config) => {
            let config = config.to_builder().collect_metrics(true).build()?;
            let start = Instant::now();
            let grid = RegularGrid::new(scene, config)?;
            (Some(grid), start.elapsed().as_secs_f64() * 1e3)
        }
        None => (None, 0.0),
    };
    if let Some(grid) = &grid {
        let r = grid.resolution();
        info!(
            "grid {}x{}x{} ({}), {} occupied voxels",
            r[0],
            r[1],
            r[2],
            if grid.is_sparse() { "sparse" } else { "dense" },
            grid.stats().occupied_voxels
        );
    }

    let start = Instant::now();
    let (rays_hit, intersections, stats) = match &grid {
        Some(grid) => {
            let traverser = VoxelTraverser::new(grid);
            (0..fan.height)
                .into_par_iter()
                .map_init(
                    || traverser.context(),
                    |ctx, row| {
                        let mut tally: Tally = (0, 0, TraversalStats::default());
                        for col in 0..fan.width {
                            let ray = fan.ray(&bounds, col, row);
                            let found = match query {
                                Query::Closest => traverser
                                    .find_closest_intersection_with(&ray, ctx)
                                    .map_or(0, |_| 1),
                                Query::All => traverser
                                    .find_intersections_with(&ray, ctx)
                                    .map_or(0, |hits| hits.len() as u64),
                            };
                            tally.0 += u64::from(found > 0);
                            tally.1 += found;
                            if let Some(stats) = ctx.stats() {
                                tally.2 += *stats;
                            }
                        }
                        tally
                    },
                )
                .reduce(|| (0, 0, TraversalStats::default()), add)
        }
        None => (0..fan.height)
            .into_par_iter()
            .map(|row| {
                let mut tally: Tally = (0, 0, TraversalStats::default());
                for col in 0..fan.width {
                    let ray = fan.ray(&bounds, col, row);
                    let found = match query {
                        Query::Closest => scene.intersect_closest(&ray).map_or(0, |_| 1),
                        Query::All => scene.intersect_all(&ray).len() as u64,
                    };
                    tally.0 += u64::from(found > 0);
                    tally.1 += found;
                }
                tally
            })
            .reduce(|| (0, 0, TraversalStats::default()), add),
    };
    let trace_secs = start.elapsed().as_secs_f64();

    Ok(BenchReport {
        mode,
        query,
        geometries: scene.len(),
        rays,
        rays_hit,
        intersections,
        build_ms,
        trace_ms: trace_secs * 1e3,
        rays_per_second: if trace_secs > 0.0 { rays as f64 / trace_secs } else { 0.0 },
        grid: grid.as_ref().map(|g| *g.stats()),
        traversal: grid.is_some().then_some(stats),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenegen::sphere_field;

    fn scene() -> Scene {
        sphere_field(200, 3, true).to_scene().unwrap()
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let scene = scene();
        let fan = Fan { width: 24, height: 16 };
        for query in [Query::Closest, Query::All] {
            let brute = run(&scene, AccelerationMode::None, None, fan, query).unwrap();
            for mode in [
                AccelerationMode::Default,
                AccelerationMode::HighPerformance,
                AccelerationMode::MemoryEfficient,
            ] {
                let grid = run(&scene, mode, GridConfig::for_mode(mode), fan, query).unwrap();
                assert_eq!(grid.rays, 384);
                assert_eq!(grid.rays_hit, brute.rays_hit, "{mode} {query:?}");
                assert_eq!(grid.intersections, brute.intersections, "{mode} {query:?}");
                assert_eq!(grid.traversal.unwrap().rays, 384);
            }
        }
    }

    #[test]
    fn test_ground_plane_catches_every_ray() {
        let fan = Fan { width: 8, height: 8 };
        let config = Some(GridConfig::default());
        let report = run(&scene(), AccelerationMode::Default, config, fan, Query::Closest).unwrap();
        assert_eq!(report.rays_hit, 64);
        assert!(report.grid.is_some());
    }

    #[test]
    fn test_report_serializes() {
        let fan = Fan { width: 4, height: 4 };
        let report = run(&scene(), AccelerationMode::None, None, fan, Query::All).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "none");
        assert_eq!(json["query"], "all");
        assert!(json.get("grid").is_none());
    }
}
