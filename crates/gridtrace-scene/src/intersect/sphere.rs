//! Ray-sphere intersection (quadratic equation).

use gridtrace_math::{Aabb3, Dir3, Point3, Vec3};

use super::sort_hits;
use crate::{Geometry, Ray, SurfaceHit};

/// A solid sphere.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    /// Center point.
    pub center: Point3,
    /// Radius (positive).
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Geometry for Sphere {
    fn bounding_box(&self) -> Option<Aabb3> {
        let r = Vec3::repeat(self.radius);
        Some(Aabb3::new(self.center - r, self.center + r))
    }

    fn intersect(&self, ray: &Ray) -> Vec<SurfaceHit> {
        intersect_sphere(ray, self)
    }
}

/// Intersect a ray with a sphere.
///
/// Returns up to 2 intersections (entry and exit points), sorted by t.
/// Only intersections with t >= 0 are returned.
pub fn intersect_sphere(ray: &Ray, sphere: &Sphere) -> Vec<SurfaceHit> {
    let oc = ray.origin - sphere.center;
    let d = ray.direction.as_ref();

    // Quadratic: |oc + t*d|^2 = r^2, with |d| = 1
    let b = oc.dot(d);
    let c = oc.dot(&oc) - sphere.radius * sphere.radius;

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return Vec::new();
    }

    let sqrt_disc = discriminant.sqrt();
    let mut hits = Vec::with_capacity(2);

    for t in [-b - sqrt_disc, -b + sqrt_disc] {
        if t < 0.0 {
            continue;
        }
        let normal = Dir3::new_normalize(ray.at(t) - sphere.center);
        hits.push(SurfaceHit { t, normal });
    }

    sort_hits(&mut hits);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere5() -> Sphere {
        Sphere::new(Point3::origin(), 5.0)
    }

    #[test]
    fn test_ray_sphere_through_center() {
        let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let hits = intersect_sphere(&ray, &sphere5());
        assert_eq!(hits.len(), 2);
        assert!((hits[0].t - 5.0).abs() < 1e-10);
        assert!((hits[1].t - 15.0).abs() < 1e-10);
        // Entry normal faces the ray.
        assert!((hits[0].normal.x + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_sphere_tangent() {
        let ray = Ray::new(Point3::new(5.0, -10.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let hits = intersect_sphere(&ray, &sphere5());
        assert!(hits.len() <= 2);
        if hits.len() == 2 {
            assert!((hits[0].t - hits[1].t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ray_sphere_miss() {
        let ray = Ray::new(Point3::new(-10.0, 10.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersect_sphere(&ray, &sphere5()).is_empty());
    }

    #[test]
    fn test_ray_sphere_from_inside() {
        let ray = Ray::new(Point3::origin(), Vec3::new(1.0, 0.0, 0.0));
        let hits = intersect_sphere(&ray, &sphere5());
        assert_eq!(hits.len(), 1);
        assert!((hits[0].t - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_sphere_bounding_box() {
        let s = Sphere::new(Point3::new(1.0, 2.0, 3.0), 0.5);
        let bb = s.bounding_box().unwrap();
        assert_eq!(bb.min, Point3::new(0.5, 1.5, 2.5));
        assert_eq!(bb.max, Point3::new(1.5, 2.5, 3.5));
        assert!(!s.is_infinite());
    }
}
