//! 3D-DDA: incremental cell stepping along a ray.
//!
//! Amanatides & Woo, "A Fast Voxel Traversal Algorithm for Ray Tracing".
//! Each step crosses the nearest cell boundary, so cells come out in ray
//! parameter order and none is skipped.

use gridtrace_math::Tolerance;
use gridtrace_scene::Ray;

use crate::grid::RegularGrid;
use crate::voxel::VoxelKey;

/// One lattice cell crossed by a ray, with its parameter interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CellCrossing {
    pub key: VoxelKey,
    /// Ray parameter where the ray enters the cell.
    pub t_enter: f64,
    /// Ray parameter where the ray leaves the cell.
    pub t_exit: f64,
}

/// Iterator over the cells a ray passes through, starting at `t_start`.
///
/// Ends as soon as the index leaves the lattice.
#[derive(Debug, Clone)]
pub(crate) struct VoxelWalk {
    cell: [i32; 3],
    step: [i32; 3],
    /// Ray parameter of the next boundary crossing per axis.
    t_next: [f64; 3],
    /// Parameter distance between two boundaries per axis.
    t_delta: [f64; 3],
    t: f64,
    resolution: [u32; 3],
}

impl VoxelWalk {
    pub(crate) fn new(grid: &RegularGrid, ray: &Ray, t_start: f64) -> Self {
        let tol = Tolerance::DEFAULT;
        let entry = ray.at(t_start);
        let cell = grid.world_to_grid(&entry).to_array();
        let min = grid.scene_bounds().min;
        let size = grid.voxel_size();

        let mut step = [1; 3];
        let mut t_next = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];
        for axis in 0..3 {
            let d = ray.dir(axis);
            step[axis] = if d > 0.0 { 1 } else { -1 };
            if tol.is_parallel(d) {
                continue;
            }
            t_delta[axis] = size[axis] / d.abs();
            let face = if d > 0.0 { cell[axis] + 1 } else { cell[axis] };
            let boundary = min[axis] + face as f64 * size[axis];
            // Clamping can leave the entry point marginally outside its cell.
            t_next[axis] = (t_start + (boundary - entry[axis]) / d).max(t_start);
        }

        Self {
            cell,
            step,
            t_next,
            t_delta,
            t: t_start,
            resolution: grid.resolution(),
        }
    }
}

impl Iterator for VoxelWalk {
    type Item = CellCrossing;

    fn next(&mut self) -> Option<CellCrossing> {
        let key = VoxelKey::from_array(self.cell);
        if !key.in_bounds(self.resolution) {
            return None;
        }

        let (axis, t_exit) = self
            .t_next
            .into_iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))?;

        let crossing = CellCrossing {
            key,
            t_enter: self.t,
            t_exit,
        };

        self.t = t_exit;
        self.t_next[axis] += self.t_delta[axis];
        self.cell[axis] += self.step[axis];
        Some(crossing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use gridtrace_math::{Aabb3, Point3, Vec3};
    use gridtrace_scene::{Scene, Sphere};

    fn grid_4() -> RegularGrid {
        let mut scene = Scene::new();
        scene.add(Sphere::new(Point3::new(2.0, 2.0, 2.0), 0.5));
        let config = GridConfig::builder().manual_resolution(4, 4, 4).build().unwrap();
        let bounds = Aabb3::new(Point3::origin(), Point3::new(4.0, 4.0, 4.0));
        RegularGrid::with_bounds(&scene, config, bounds).unwrap()
    }

    fn walk(grid: &RegularGrid, ray: &Ray) -> Vec<CellCrossing> {
        let (t_enter, _) = ray.intersect_aabb(grid.scene_bounds()).unwrap();
        VoxelWalk::new(grid, ray, t_enter).collect()
    }

    #[test]
    fn test_axis_aligned_walk() {
        let grid = grid_4();
        let ray = Ray::new(Point3::new(-1.0, 2.5, 2.5), Vec3::new(1.0, 0.0, 0.0));
        let cells = walk(&grid, &ray);
        let keys: Vec<VoxelKey> = cells.iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            (0..4).map(|x| VoxelKey::new(x, 2, 2)).collect::<Vec<_>>()
        );
        for (i, c) in cells.iter().enumerate() {
            assert!((c.t_enter - (1.0 + i as f64)).abs() < 1e-12);
            assert!((c.t_exit - (2.0 + i as f64)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_negative_direction_walk() {
        let grid = grid_4();
        let ray = Ray::new(Point3::new(1.5, 5.0, 0.5), Vec3::new(0.0, -1.0, 0.0));
        let keys: Vec<VoxelKey> = walk(&grid, &ray).iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            vec![
                VoxelKey::new(1, 3, 0),
                VoxelKey::new(1, 2, 0),
                VoxelKey::new(1, 1, 0),
                VoxelKey::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn test_diagonal_walk_is_contiguous() {
        let grid = grid_4();
        let ray = Ray::new(Point3::new(0.1, 0.3, 0.2), Vec3::new(1.0, 0.7, 0.45));
        let cells = walk(&grid, &ray);
        assert_eq!(cells[0].key, VoxelKey::new(0, 0, 0));
        for pair in cells.windows(2) {
            let a = pair[0].key.to_array();
            let b = pair[1].key.to_array();
            let manhattan: i32 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).abs()).sum();
            assert_eq!(manhattan, 1, "{} -> {}", pair[0].key, pair[1].key);
            assert!(pair[1].t_enter > pair[0].t_enter);
            assert_eq!(pair[0].t_exit, pair[1].t_enter);
        }
        // The ray's midpoint in each cell lies inside that cell.
        for c in &cells {
            let t_exit = c.t_exit.min(ray.intersect_aabb(grid.scene_bounds()).unwrap().1);
            let mid = ray.at(0.5 * (c.t_enter + t_exit));
            assert_eq!(grid.world_to_grid(&mid), c.key);
        }
    }

    #[test]
    fn test_near_parallel_component() {
        let grid = grid_4();
        let ray = Ray::new(Point3::new(-1.0, 1.5, 3.5), Vec3::new(1.0, 1e-14, -1e-13));
        let keys: Vec<VoxelKey> = walk(&grid, &ray).iter().map(|c| c.key).collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.iter().all(|k| k.y == 1 && k.z == 3));
    }

    #[test]
    fn test_start_inside_lattice() {
        let grid = grid_4();
        let ray = Ray::new(Point3::new(2.5, 2.5, 2.5), Vec3::new(0.0, 0.0, 1.0));
        let cells = walk(&grid, &ray);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].t_enter, 0.0);
        assert!((cells[0].t_exit - 0.5).abs() < 1e-12);
    }
}
