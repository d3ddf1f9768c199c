//! Ray queries against a built grid.
//!
//! [`VoxelTraverser`] is a cheap, shareable view over a [`RegularGrid`]; all
//! per-query scratch state lives in a [`TraversalContext`] owned by the
//! caller. A rendering worker keeps one context and reuses it for every ray
//! it traces:
//!
//! ```
//! use gridtrace_grid::{GridConfig, RegularGrid, TraversalContext, VoxelTraverser};
//! use gridtrace_math::{Point3, Vec3};
//! use gridtrace_scene::{Ray, Scene, Sphere};
//!
//! let mut scene = Scene::new();
//! scene.add(Sphere::new(Point3::new(0.0, 0.0, 0.0), 1.0));
//! let grid = RegularGrid::new(&scene, GridConfig::default()).unwrap();
//!
//! let traverser = VoxelTraverser::new(&grid);
//! let mut ctx = TraversalContext::new();
//! let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
//! let hit = traverser.find_closest_intersection_with(&ray, &mut ctx).unwrap();
//! assert!((hit.t - 4.0).abs() < 1e-10);
//! ```

use std::ops::AddAssign;

use gridtrace_math::Tolerance;
use gridtrace_scene::{Geometry, GeometryId, Intersection, Ray};
use log::trace;
use serde::Serialize;

use crate::config::GridConfig;
use crate::dda::VoxelWalk;
use crate::grid::RegularGrid;
use crate::voxel::VoxelKey;

/// Counters for a single query, or a sum over many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    /// Queries accumulated into these counters.
    pub rays: u64,
    /// Lattice cells stepped through.
    pub voxels_visited: u64,
    /// Visited cells that held geometry.
    pub non_empty_voxels: u64,
    /// Finite geometry intersection routines run.
    pub geometry_tests: u64,
    /// Repeat references skipped by deduplication.
    pub duplicates_skipped: u64,
    /// Geometry rejected by the ray/box prefilter.
    pub bbox_rejections: u64,
    /// Infinite geometry intersection routines run.
    pub infinite_tests: u64,
    /// Surface hits returned by geometry routines.
    pub intersections_found: u64,
}

impl TraversalStats {
    /// Add another set of counters into this one.
    pub fn merge(&mut self, other: &TraversalStats) {
        self.rays += other.rays;
        self.voxels_visited += other.voxels_visited;
        self.non_empty_voxels += other.non_empty_voxels;
        self.geometry_tests += other.geometry_tests;
        self.duplicates_skipped += other.duplicates_skipped;
        self.bbox_rejections += other.bbox_rejections;
        self.infinite_tests += other.infinite_tests;
        self.intersections_found += other.intersections_found;
    }
}

impl AddAssign for TraversalStats {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

/// Per-query scratch state: tested-geometry set, statistics and path.
///
/// Reset at the start of every query. Queries take it by `&mut`, so a
/// context cannot be shared between threads running queries concurrently;
/// give each worker its own.
#[derive(Debug, Clone, Default)]
pub struct TraversalContext {
    /// Generation stamp per geometry id; equal to `generation` once tested.
    tested: Vec<u32>,
    generation: u32,
    stats: TraversalStats,
    collect_metrics: bool,
    path: Vec<VoxelKey>,
    record_path: bool,
}

impl TraversalContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the last query, if metrics collection is enabled.
    pub fn stats(&self) -> Option<&TraversalStats> {
        self.collect_metrics.then_some(&self.stats)
    }

    /// Cells visited by the last query, in order. Empty unless
    /// visualization is enabled.
    pub fn path(&self) -> &[VoxelKey] {
        &self.path
    }

    /// Clear per-query state ahead of a query over `geometry_count` ids.
    pub fn reset(&mut self, geometry_count: usize, config: &GridConfig) {
        if self.tested.len() != geometry_count {
            self.tested.clear();
            self.tested.resize(geometry_count, 0);
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.tested.fill(0);
            self.generation = 1;
        }
        self.stats = TraversalStats {
            rays: 1,
            ..TraversalStats::default()
        };
        self.collect_metrics = config.collect_metrics();
        self.record_path = config.visualization();
        self.path.clear();
    }

    /// Mark `id` tested, returning false if it already was this query.
    #[inline]
    fn mark_tested(&mut self, id: GeometryId) -> bool {
        match self.tested.get_mut(id.index()) {
            Some(stamp) if *stamp == self.generation => false,
            Some(stamp) => {
                *stamp = self.generation;
                true
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    All,
    Closest,
}

/// Hit accumulator for one query.
struct Hits {
    mode: Mode,
    all: Vec<Intersection>,
    closest: Option<Intersection>,
}

impl Hits {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            all: Vec::new(),
            closest: None,
        }
    }

    #[inline]
    fn best_t(&self) -> f64 {
        self.closest.map_or(f64::INFINITY, |hit| hit.t)
    }

    fn push(&mut self, hit: Intersection) {
        match self.mode {
            Mode::All => self.all.push(hit),
            Mode::Closest => {
                if hit.t < self.best_t() {
                    self.closest = Some(hit);
                }
            }
        }
    }
}

/// Answers closest-hit and all-hits queries against a [`RegularGrid`].
///
/// Holds only shared references, so one traverser may be copied into every
/// worker thread; the per-query state is the caller's [`TraversalContext`].
#[derive(Debug, Clone, Copy)]
pub struct VoxelTraverser<'g> {
    grid: &'g RegularGrid,
    config: &'g GridConfig,
}

impl<'g> VoxelTraverser<'g> {
    /// Traverse with the configuration the grid was built with.
    pub fn new(grid: &'g RegularGrid) -> Self {
        Self {
            grid,
            config: grid.config(),
        }
    }

    /// Traverse with different traversal toggles.
    ///
    /// Only the traversal-time settings of `config` (early termination,
    /// deduplication, optimized traversal, ray/box prefilter, metrics,
    /// visualization, debug) apply; the lattice is the grid's.
    pub fn with_config(grid: &'g RegularGrid, config: &'g GridConfig) -> Self {
        Self { grid, config }
    }

    /// The grid being traversed.
    pub fn grid(&self) -> &'g RegularGrid {
        self.grid
    }

    /// A fresh context for this traverser.
    pub fn context(&self) -> TraversalContext {
        TraversalContext::new()
    }

    /// Every hit along the ray, sorted by distance. `None` if nothing is hit.
    pub fn find_intersections(&self, ray: &Ray) -> Option<Vec<Intersection>> {
        self.find_intersections_with(ray, &mut self.context())
    }

    /// [`find_intersections`](Self::find_intersections) reusing a context.
    pub fn find_intersections_with(
        &self,
        ray: &Ray,
        ctx: &mut TraversalContext,
    ) -> Option<Vec<Intersection>> {
        let mut hits = self.trace(ray, ctx, Mode::All).all;
        hits.sort_by(|a, b| a.t.total_cmp(&b.t).then(a.geometry.cmp(&b.geometry)));
        (!hits.is_empty()).then_some(hits)
    }

    /// The hit nearest the ray origin, if any.
    pub fn find_closest_intersection(&self, ray: &Ray) -> Option<Intersection> {
        self.find_closest_intersection_with(ray, &mut self.context())
    }

    /// [`find_closest_intersection`](Self::find_closest_intersection)
    /// reusing a context.
    pub fn find_closest_intersection_with(
        &self,
        ray: &Ray,
        ctx: &mut TraversalContext,
    ) -> Option<Intersection> {
        self.trace(ray, ctx, Mode::Closest).closest
    }

    fn trace(&self, ray: &Ray, ctx: &mut TraversalContext, mode: Mode) -> Hits {
        ctx.reset(self.grid.geometry_count(), self.config);
        let mut hits = Hits::new(mode);

        for &id in self.grid.infinite_geometries() {
            if let Some(geometry) = self.grid.geometry(id) {
                ctx.stats.infinite_tests += 1;
                self.collect(id, &**geometry, ray, ctx, &mut hits);
            }
        }

        if self.grid.finite_count() > 0 {
            if let Some((t_enter, t_exit)) = ray.intersect_aabb(self.grid.scene_bounds()) {
                self.walk(ray, t_enter, t_exit, ctx, &mut hits);
            }
        }

        if self.config.debug() && self.config.collect_metrics() {
            trace!(
                "ray {:?} -> {:?}: {:?}",
                ray.origin.coords.as_slice(),
                ray.direction.as_ref().as_slice(),
                ctx.stats
            );
        }
        hits
    }

    /// Step through the lattice from `t_enter`, testing voxel contents.
    fn walk(
        &self,
        ray: &Ray,
        t_enter: f64,
        t_exit: f64,
        ctx: &mut TraversalContext,
        hits: &mut Hits,
    ) {
        let dedup = self.config.deduplication();
        let prefilter = self.config.ray_box_optimization();
        let early_out = hits.mode == Mode::Closest && self.config.early_termination();

        for cell in VoxelWalk::new(self.grid, ray, t_enter) {
            ctx.stats.voxels_visited += 1;
            if ctx.record_path {
                ctx.path.push(cell.key);
            }

            if let Some(voxel) = self.grid.voxel(cell.key) {
                ctx.stats.non_empty_voxels += 1;
                for &id in voxel.geometries() {
                    let first_visit = ctx.mark_tested(id);
                    if dedup && !first_visit {
                        ctx.stats.duplicates_skipped += 1;
                        continue;
                    }
                    let Some(geometry) = self.grid.geometry(id) else {
                        continue;
                    };
                    if prefilter && !box_may_hit(&**geometry, ray, hits.best_t()) {
                        ctx.stats.bbox_rejections += 1;
                        continue;
                    }
                    ctx.stats.geometry_tests += 1;
                    if first_visit {
                        self.collect(id, &**geometry, ray, ctx, hits);
                    } else {
                        // Retest of a geometry whose hits are already recorded.
                        geometry.intersect(ray);
                    }
                }
            }

            // Anything not yet seen lies beyond this cell's exit.
            if early_out && hits.best_t() <= cell.t_exit {
                break;
            }
            if self.config.optimized_traversal() && cell.t_exit > t_exit {
                break;
            }
        }
    }

    fn collect(
        &self,
        id: GeometryId,
        geometry: &dyn Geometry,
        ray: &Ray,
        ctx: &mut TraversalContext,
        hits: &mut Hits,
    ) {
        for hit in geometry.intersect(ray) {
            ctx.stats.intersections_found += 1;
            hits.push(Intersection::from_hit(id, ray, hit));
        }
    }
}

/// Ray/box prefilter: false if the ray misses the geometry's box or enters
/// it beyond `best_t`.
fn box_may_hit(geometry: &dyn Geometry, ray: &Ray, best_t: f64) -> bool {
    let Some(mut bb) = geometry.bounding_box() else {
        return true;
    };
    bb.expand(Tolerance::DEFAULT.linear);
    match ray.intersect_aabb(&bb) {
        Some((t_min, _)) => t_min <= best_t,
        None => false,
    }
}
