//! Axis-aligned bounding boxes.

use crate::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
///
/// `min <= max` on every axis is the caller's responsibility; it is not
/// re-validated on use. [`Aabb3::empty`] is the deliberate exception: an
/// inverted box that becomes valid after the first expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// True while the box is still inverted on some axis.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box.
    pub fn include_aabb(&mut self, other: &Aabb3) {
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        let mut out = *self;
        out.include_aabb(other);
        out
    }

    /// Test whether a point lies inside or on the boundary.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Expand the AABB by a tolerance in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// Edge lengths along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_empty_then_include() {
        let mut aabb = Aabb3::empty();
        assert!(aabb.is_empty());
        aabb.include_point(&Point3::new(1.0, -2.0, 3.0));
        assert!(!aabb.is_empty());
        aabb.include_point(&Point3::new(-1.0, 2.0, 0.0));
        assert_eq!(aabb.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_union() {
        let a = unit_box();
        let b = Aabb3::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 4.0, 5.0));
        let u = a.union(&b);
        assert_eq!(u.min, Point3::origin());
        assert_eq!(u.max, Point3::new(3.0, 4.0, 5.0));
        assert_relative_eq!(u.extent().z, 5.0);
    }

    #[test]
    fn test_contains_point_boundary() {
        let aabb = unit_box();
        assert!(aabb.contains_point(&Point3::new(0.5, 0.5, 0.5)));
        assert!(aabb.contains_point(&Point3::new(1.0, 0.0, 1.0)));
        assert!(!aabb.contains_point(&Point3::new(1.0 + 1e-9, 0.5, 0.5)));
    }

    #[test]
    fn test_expand_and_center() {
        let mut aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 4.0));
        assert_eq!(aabb.center(), Point3::new(1.0, 1.0, 2.0));
        aabb.expand(0.5);
        assert_eq!(aabb.min, Point3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(aabb.extent().z, 5.0);
        assert_eq!(aabb.center(), Point3::new(1.0, 1.0, 2.0));
    }
}
