#![warn(missing_docs)]

//! Math types for gridtrace.
//!
//! Thin wrappers around nalgebra providing the point, vector and direction
//! types shared by the scene and grid crates, tolerance constants, and the
//! axis-aligned bounding box used for scene extents and voxel assignment.

mod aabb;

pub use aabb::Aabb3;

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in scene units.
    pub linear: f64,
    /// Threshold below which a direction component counts as zero.
    pub direction: f64,
}

impl Tolerance {
    /// Default tolerances (1e-9 linear, 1e-12 for direction components).
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        direction: 1e-12,
    };

    /// Check if a direction component is too small to ever cross a cell boundary.
    pub fn is_parallel(&self, component: f64) -> bool {
        component.abs() < self.direction
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
