//! Ray-triangle intersection (Möller–Trumbore).

use gridtrace_math::{Aabb3, Dir3, Point3, Tolerance};

use crate::{Geometry, Ray, SurfaceHit};

/// A single triangle. The normal follows the counter-clockwise winding.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Vertex positions.
    pub v: [Point3; 3],
}

impl Triangle {
    /// Create a triangle from three vertices.
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self { v: [v0, v1, v2] }
    }

    /// Geometric normal, or `None` for a degenerate triangle.
    pub fn normal(&self) -> Option<Dir3> {
        let n = (self.v[1] - self.v[0]).cross(&(self.v[2] - self.v[0]));
        Dir3::try_new(n, Tolerance::DEFAULT.direction)
    }
}

impl Geometry for Triangle {
    fn bounding_box(&self) -> Option<Aabb3> {
        let mut bb = Aabb3::empty();
        for p in &self.v {
            bb.include_point(p);
        }
        Some(bb)
    }

    fn intersect(&self, ray: &Ray) -> Vec<SurfaceHit> {
        intersect_triangle(ray, self).into_iter().collect()
    }
}

/// Intersect a ray with a triangle.
///
/// Edge hits are accepted with a small barycentric slack so that rays through
/// a shared edge of a mesh do not slip between the two triangles.
pub fn intersect_triangle(ray: &Ray, tri: &Triangle) -> Option<SurfaceHit> {
    let normal = tri.normal()?;
    let e1 = tri.v[1] - tri.v[0];
    let e2 = tri.v[2] - tri.v[0];
    let d = ray.direction.as_ref();

    let p = d.cross(&e2);
    let det = e1.dot(&p);
    if Tolerance::DEFAULT.is_parallel(det) {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - tri.v[0];
    let u = s.dot(&p) * inv_det;
    let eps = -1e-10;
    if u < eps || u > 1.0 - eps {
        return None;
    }

    let q = s.cross(&e1);
    let v = d.dot(&q) * inv_det;
    if v < eps || u + v > 1.0 - eps {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    if t < 0.0 {
        return None;
    }

    Some(SurfaceHit { t, normal })
}
