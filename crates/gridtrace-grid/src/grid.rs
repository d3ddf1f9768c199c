//! The regular grid: a uniform lattice over the scene's finite geometry.

use std::sync::Arc;

use gridtrace_math::{Aabb3, Point3, Vec3};
use gridtrace_scene::{Geometry, GeometryId, Scene};
use log::{debug, warn};
use serde::Serialize;

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::storage::{dense_footprint, VoxelStorage};
use crate::voxel::{Voxel, VoxelKey};

/// Smallest voxel edge length. Keeps cells non-degenerate when the scene
/// is flat along an axis (a single polygon, a ground grid of triangles).
pub const VOXEL_SIZE_EPSILON: f64 = 1e-6;

/// Summary of a built grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GridStats {
    /// Cells in the lattice (`rx * ry * rz`).
    pub total_cells: u64,
    /// Cells holding at least one geometry reference.
    pub occupied_voxels: usize,
    /// Sum of references over all voxels.
    pub total_references: usize,
    /// Largest occupancy of a single voxel.
    pub max_occupancy: usize,
    /// Mean occupancy over occupied voxels.
    pub average_occupancy: f64,
    /// Voxels whose occupancy exceeds the configured ceiling.
    pub overfull_voxels: usize,
    /// Finite geometries indexed.
    pub finite_geometries: usize,
    /// Infinite geometries kept outside the lattice.
    pub infinite_geometries: usize,
    /// Approximate lattice memory in bytes.
    pub memory_bytes: u64,
    /// Whether the lattice uses sparse storage.
    pub sparse: bool,
}

/// Uniform 3D lattice indexing a scene's finite geometry.
///
/// Built once from a snapshot of the scene and immutable afterwards, so it
/// can be shared across threads. Each finite geometry is referenced from
/// every cell its bounding box overlaps; geometry without a bounding box is
/// kept in a separate list and never voxelized.
#[derive(Debug)]
pub struct RegularGrid {
    config: GridConfig,
    bounds: Aabb3,
    resolution: [u32; 3],
    voxel_size: Vec3,
    storage: VoxelStorage,
    geometries: Vec<Arc<dyn Geometry>>,
    infinite: Vec<GeometryId>,
    finite_count: usize,
    stats: GridStats,
}

impl RegularGrid {
    /// Build a grid over the scene's finite geometry.
    pub fn new(scene: &Scene, config: GridConfig) -> Result<Self> {
        Self::build(scene, config, None)
    }

    /// Build a grid whose extent covers at least `bounds`.
    ///
    /// The effective bounds are the union of `bounds` and the scene's own.
    pub fn with_bounds(scene: &Scene, config: GridConfig, bounds: Aabb3) -> Result<Self> {
        Self::build(scene, config, Some(bounds))
    }

    fn build(scene: &Scene, config: GridConfig, extra: Option<Aabb3>) -> Result<Self> {
        config.validate()?;

        let finite: Vec<(GeometryId, Aabb3)> = scene
            .finite_ids()
            .filter_map(|id| {
                scene
                    .geometry(id)
                    .and_then(|g| g.bounding_box())
                    .map(|bb| (id, bb))
            })
            .collect();
        let infinite: Vec<GeometryId> = scene.infinite_ids().collect();

        let bounds = match (scene.bounds(), extra) {
            (Some(a), Some(b)) => a.union(&b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => Aabb3::new(Point3::origin(), Point3::origin()),
        };
        let all_finite = bounds.min.iter().chain(bounds.max.iter()).all(|c| c.is_finite());
        if bounds.is_empty() || !all_finite {
            return Err(GridError::config(format!(
                "scene bounds are not a finite box: {:?}",
                bounds
            )));
        }

        let resolution = if finite.is_empty() {
            [1, 1, 1]
        } else {
            config.calculate_optimal_resolution(finite.len())
        };
        let extent = bounds.extent();
        let voxel_size = Vec3::from_fn(|axis, _| {
            (extent[axis] / resolution[axis] as f64).max(VOXEL_SIZE_EPSILON)
        });

        let storage = select_storage(&config, resolution);

        let mut grid = Self {
            config,
            bounds,
            resolution,
            voxel_size,
            storage,
            geometries: scene.geometries().to_vec(),
            infinite,
            finite_count: finite.len(),
            stats: GridStats::default(),
        };

        for (id, bb) in &finite {
            grid.insert(*id, bb);
        }

        grid.stats = grid.compute_stats();
        if grid.stats.overfull_voxels > 0 {
            warn!(
                "{} voxel(s) exceed max_objects_per_voxel = {} (max occupancy {})",
                grid.stats.overfull_voxels,
                grid.config.max_objects_per_voxel(),
                grid.stats.max_occupancy
            );
        }
        if grid.config.debug() {
            debug!(
                "built {}x{}x{} grid over {:?}: voxel size {:?}, {} finite / {} infinite, {} occupied voxels, {} references",
                resolution[0],
                resolution[1],
                resolution[2],
                grid.bounds,
                grid.voxel_size.as_slice(),
                grid.stats.finite_geometries,
                grid.stats.infinite_geometries,
                grid.stats.occupied_voxels,
                grid.stats.total_references
            );
        }

        Ok(grid)
    }

    /// Reference `id` from every cell in the inclusive index range spanned
    /// by its bounding box.
    fn insert(&mut self, id: GeometryId, bb: &Aabb3) {
        let lo = self.world_to_grid(&bb.min);
        let hi = self.world_to_grid(&bb.max);
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    self.storage
                        .get_or_create(VoxelKey::new(x, y, z))
                        .add_geometry(id);
                }
            }
        }
    }

    fn compute_stats(&self) -> GridStats {
        let ceiling = self.config.max_objects_per_voxel();
        let mut stats = GridStats {
            total_cells: self.resolution.iter().map(|&r| r as u64).product(),
            finite_geometries: self.finite_count,
            infinite_geometries: self.infinite.len(),
            memory_bytes: self.storage.memory_bytes(),
            sparse: self.storage.is_sparse(),
            ..GridStats::default()
        };
        for (_, voxel) in self.storage.occupied() {
            stats.occupied_voxels += 1;
            stats.total_references += voxel.len();
            stats.max_occupancy = stats.max_occupancy.max(voxel.len());
            if voxel.len() > ceiling {
                stats.overfull_voxels += 1;
            }
        }
        if stats.occupied_voxels > 0 {
            stats.average_occupancy = stats.total_references as f64 / stats.occupied_voxels as f64;
        }
        stats
    }

    /// Cell containing a world-space point, clamped into the lattice.
    ///
    /// Points on the outer boundary or outside the scene map to the nearest
    /// edge cell; a NaN coordinate maps to 0.
    pub fn world_to_grid(&self, p: &Point3) -> VoxelKey {
        let idx = [0, 1, 2].map(|axis| {
            let raw = ((p[axis] - self.bounds.min[axis]) / self.voxel_size[axis]).floor();
            let max = (self.resolution[axis] - 1) as f64;
            if raw.is_nan() {
                0
            } else {
                raw.clamp(0.0, max) as i32
            }
        });
        VoxelKey::from_array(idx)
    }

    /// Center of a cell. Fails for an index outside the lattice.
    pub fn grid_to_world(&self, key: VoxelKey) -> Result<Point3> {
        self.check_key(key)?;
        let idx = key.to_array();
        Ok(Point3::from(Vec3::from_fn(|axis, _| {
            self.bounds.min[axis] + (idx[axis] as f64 + 0.5) * self.voxel_size[axis]
        })))
    }

    /// World-space box of a cell. Fails for an index outside the lattice.
    pub fn voxel_bounds(&self, key: VoxelKey) -> Result<Aabb3> {
        self.check_key(key)?;
        let idx = key.to_array();
        let min = Point3::from(Vec3::from_fn(|axis, _| {
            self.bounds.min[axis] + idx[axis] as f64 * self.voxel_size[axis]
        }));
        Ok(Aabb3::new(min, min + self.voxel_size))
    }

    fn check_key(&self, key: VoxelKey) -> Result<()> {
        if key.in_bounds(self.resolution) {
            Ok(())
        } else {
            Err(GridError::InvalidCoordinate {
                key,
                resolution: self.resolution,
            })
        }
    }

    /// True if the key lies inside the lattice.
    #[inline]
    pub fn contains_key(&self, key: VoxelKey) -> bool {
        key.in_bounds(self.resolution)
    }

    /// The voxel at `key`, if it is inside the lattice and non-empty.
    ///
    /// Out-of-range and empty cells both yield `None`: either way there is
    /// nothing to test.
    #[inline]
    pub fn voxel(&self, key: VoxelKey) -> Option<&Voxel> {
        if !self.contains_key(key) {
            return None;
        }
        self.storage.get(key).filter(|v| !v.is_empty())
    }

    /// Non-empty voxels with their keys, in no particular order.
    pub fn occupied_voxels(&self) -> impl Iterator<Item = (VoxelKey, &Voxel)> + '_ {
        self.storage.occupied()
    }

    /// Cells per axis.
    pub fn resolution(&self) -> [u32; 3] {
        self.resolution
    }

    /// Cell edge lengths.
    pub fn voxel_size(&self) -> Vec3 {
        self.voxel_size
    }

    /// The lattice's world-space extent at construction.
    pub fn scene_bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// The configuration the grid was built with.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Geometry without a bounding box, tested on every ray.
    pub fn infinite_geometries(&self) -> &[GeometryId] {
        &self.infinite
    }

    /// Look up a geometry of the snapshot by id.
    pub fn geometry(&self, id: GeometryId) -> Option<&Arc<dyn Geometry>> {
        self.geometries.get(id.index())
    }

    /// Number of geometries in the snapshot, finite and infinite.
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Number of geometries indexed by the lattice.
    pub fn finite_count(&self) -> usize {
        self.finite_count
    }

    /// True if voxels live in sparse storage.
    pub fn is_sparse(&self) -> bool {
        self.storage.is_sparse()
    }

    /// Build statistics.
    pub fn stats(&self) -> &GridStats {
        &self.stats
    }
}

fn select_storage(config: &GridConfig, resolution: [u32; 3]) -> VoxelStorage {
    if config.sparse_storage() {
        return VoxelStorage::sparse();
    }
    let ceiling = config.max_memory_mb().saturating_mul(1024 * 1024);
    let needed = dense_footprint(resolution);
    if needed > ceiling {
        warn!(
            "dense {}x{}x{} lattice needs {} bytes, over the {} MiB ceiling; using sparse storage",
            resolution[0],
            resolution[1],
            resolution[2],
            needed,
            config.max_memory_mb()
        );
        VoxelStorage::sparse()
    } else {
        VoxelStorage::dense(resolution)
    }
}
