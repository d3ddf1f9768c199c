//! Ray-plane intersection (closed-form).

use gridtrace_math::{Aabb3, Dir3, Point3, Tolerance, Vec3};

use crate::{Geometry, Ray, SurfaceHit};

/// An unbounded plane through `point` with unit `normal`.
///
/// Has no bounding box, so acceleration structures test it against every ray.
#[derive(Debug, Clone, Copy)]
pub struct InfinitePlane {
    /// Any point on the plane.
    pub point: Point3,
    /// Unit normal.
    pub normal: Dir3,
}

impl InfinitePlane {
    /// Create a plane; `normal` is normalized.
    pub fn new(point: Point3, normal: Vec3) -> Self {
        Self {
            point,
            normal: Dir3::new_normalize(normal),
        }
    }

    /// The z = 0 plane with +Z normal.
    pub fn xy() -> Self {
        Self::new(Point3::origin(), Vec3::z())
    }
}

impl Geometry for InfinitePlane {
    fn bounding_box(&self) -> Option<Aabb3> {
        None
    }

    fn intersect(&self, ray: &Ray) -> Vec<SurfaceHit> {
        intersect_plane(ray, self).into_iter().collect()
    }
}

/// Intersect a ray with a plane.
///
/// Returns `Some(hit)` if the ray intersects the plane at a positive t,
/// or `None` if the ray is parallel to the plane or intersects behind the origin.
pub fn intersect_plane(ray: &Ray, plane: &InfinitePlane) -> Option<SurfaceHit> {
    let normal = plane.normal.as_ref();
    let denom = ray.direction.as_ref().dot(normal);

    if Tolerance::DEFAULT.is_parallel(denom) {
        return None;
    }

    let t = (plane.point - ray.origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }

    Some(SurfaceHit {
        t,
        normal: plane.normal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_plane_perpendicular() {
        let plane = InfinitePlane::xy();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = intersect_plane(&ray, &plane).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_plane_oblique() {
        let plane = InfinitePlane::xy();
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, -1.0));
        let hit = intersect_plane(&ray, &plane).unwrap();
        assert!((hit.t - 2f64.sqrt()).abs() < 1e-10);
        let p = ray.at(hit.t);
        assert!(p.z.abs() < 1e-10);
    }

    #[test]
    fn test_ray_plane_parallel() {
        let plane = InfinitePlane::xy();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersect_plane(&ray, &plane).is_none());
    }

    #[test]
    fn test_ray_plane_behind() {
        let plane = InfinitePlane::xy();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_plane(&ray, &plane).is_none());
    }

    #[test]
    fn test_plane_is_infinite() {
        assert!(InfinitePlane::xy().is_infinite());
    }
}
