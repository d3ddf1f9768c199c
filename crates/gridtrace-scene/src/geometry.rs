//! The geometry interface consumed by acceleration structures.

use std::fmt;

use gridtrace_math::{Aabb3, Dir3, Point3};
use serde::{Deserialize, Serialize};

use crate::Ray;

/// Index of a geometry within its [`Scene`](crate::Scene).
///
/// Acceleration structures store ids rather than the geometry itself; the
/// scene keeps ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeometryId(pub u32);

impl GeometryId {
    /// Position of the geometry in the scene's list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of intersecting a ray with a single geometry.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit {
    /// Parameter along the ray (distance, since ray directions are unit length).
    pub t: f64,
    /// Outward surface normal at the hit.
    pub normal: Dir3,
}

/// Something a ray can hit.
///
/// Finite geometry reports a bounding box and is indexed by acceleration
/// structures. Geometry with unbounded extent (planes) returns `None` and is
/// tested against every ray.
pub trait Geometry: Send + Sync + fmt::Debug {
    /// World-space bounding box, or `None` for infinite geometry.
    fn bounding_box(&self) -> Option<Aabb3>;

    /// All intersections with `t >= 0`, sorted by `t`.
    fn intersect(&self, ray: &Ray) -> Vec<SurfaceHit>;

    /// True if the geometry has no bounding box.
    fn is_infinite(&self) -> bool {
        self.bounding_box().is_none()
    }
}

/// A ray hit attributed to a scene geometry.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    /// Geometry that was hit.
    pub geometry: GeometryId,
    /// Parameter along the ray.
    pub t: f64,
    /// 3D intersection point.
    pub point: Point3,
    /// Surface normal at the intersection.
    pub normal: Dir3,
}

impl Intersection {
    /// Attribute a surface hit to `geometry`.
    pub fn from_hit(geometry: GeometryId, ray: &Ray, hit: SurfaceHit) -> Self {
        Self {
            geometry,
            t: hit.t,
            point: ray.at(hit.t),
            normal: hit.normal,
        }
    }

    /// Euclidean distance from `origin` to the hit point.
    pub fn distance_from(&self, origin: &Point3) -> f64 {
        (self.point - origin).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridtrace_math::Vec3;

    #[test]
    fn test_intersection_from_hit() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -2.0));
        let hit = SurfaceHit {
            t: 2.5,
            normal: Dir3::new_normalize(Vec3::z()),
        };
        let isect = Intersection::from_hit(GeometryId(4), &ray, hit);
        assert_eq!(isect.geometry, GeometryId(4));
        assert!((isect.point - Point3::new(1.0, 2.0, 0.5)).norm() < 1e-12);
        assert!((isect.distance_from(&ray.origin) - 2.5).abs() < 1e-12);
        assert_eq!(isect.geometry.to_string(), "#4");
    }
}
