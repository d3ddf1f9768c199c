#![warn(missing_docs)]

//! Regular-grid ray acceleration for gridtrace.
//!
//! A scene's finite geometry is bucketed into a uniform 3D lattice once, at
//! scene-setup time. Rays then step through the lattice cell by cell with a
//! 3D-DDA, testing only the geometry referenced by the cells they cross.
//! Geometry without a bounding box (infinite planes) is tested on every ray.
//!
//! # Architecture
//!
//! - [`GridConfig`] - Validated tunables, built through [`GridConfigBuilder`]
//!   or taken from a preset for an [`AccelerationMode`]
//! - [`RegularGrid`] - The immutable lattice, dense or sparse
//! - [`VoxelKey`] / [`Voxel`] - Cell index and cell contents
//! - [`VoxelTraverser`] - Closest-hit and all-hits queries
//! - [`TraversalContext`] - Per-query scratch state and [`TraversalStats`]
//!
//! # Example
//!
//! ```
//! use gridtrace_grid::{GridConfig, RegularGrid, VoxelTraverser};
//! use gridtrace_math::{Point3, Vec3};
//! use gridtrace_scene::{Ray, Scene, Sphere};
//!
//! let mut scene = Scene::new();
//! for i in 0..10 {
//!     scene.add(Sphere::new(Point3::new(i as f64 * 3.0, 0.0, 0.0), 1.0));
//! }
//!
//! let grid = RegularGrid::new(&scene, GridConfig::default()).unwrap();
//! let traverser = VoxelTraverser::new(&grid);
//!
//! let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
//! let hits = traverser.find_intersections(&ray).unwrap();
//! assert_eq!(hits.len(), 20);
//! assert!((hits[0].t - 4.0).abs() < 1e-10);
//! ```

mod config;
mod dda;
mod error;
mod grid;
mod storage;
mod traverser;
mod voxel;

pub use config::{
    AccelerationMode, GridConfig, GridConfigBuilder, ResolutionStrategy, MAX_RESOLUTION,
};
pub use error::{GridError, Result};
pub use grid::{GridStats, RegularGrid, VOXEL_SIZE_EPSILON};
pub use traverser::{TraversalContext, TraversalStats, VoxelTraverser};
pub use voxel::{Voxel, VoxelKey, KEY_BITS};
