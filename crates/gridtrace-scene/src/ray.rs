//! Ray representation and ray-box tests.

use gridtrace_math::{Aabb3, Dir3, Point3, Tolerance, Vec3};

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized. A zero direction yields NaN
    /// components; use [`Ray::try_new`] when the direction is not trusted.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self::from_dir(origin, Dir3::new_normalize(direction))
    }

    /// Create a ray, returning `None` for a (near) zero direction.
    pub fn try_new(origin: Point3, direction: Vec3) -> Option<Self> {
        Dir3::try_new(direction, Tolerance::DEFAULT.direction).map(|dir| Self::from_dir(origin, dir))
    }

    fn from_dir(origin: Point3, dir: Dir3) -> Self {
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Direction component along one axis (0, 1 or 2).
    #[inline]
    pub fn dir(&self, axis: usize) -> f64 {
        self.direction.as_ref()[axis]
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` if the ray intersects the box,
    /// where `t_min` (clamped to zero) and `t_max` are the entry and exit
    /// parameters. Returns `None` if no intersection.
    ///
    /// Axes the ray runs parallel to are handled explicitly: the origin must
    /// lie within that slab, otherwise the ray misses.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let tol = Tolerance::DEFAULT;
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let o = self.origin[axis];
            let lo = aabb.min[axis];
            let hi = aabb.max[axis];

            if tol.is_parallel(self.dir(axis)) {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = self.inv_direction[axis];
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }

    /// Point where the ray enters the box, together with the entry and exit
    /// parameters.
    ///
    /// A ray starting inside the box enters at its own origin (`t = 0`).
    pub fn entry_point(&self, aabb: &Aabb3) -> Option<(Point3, f64, f64)> {
        self.intersect_aabb(aabb)
            .map(|(t_enter, t_exit)| (self.at(t_enter), t_enter, t_exit))
    }
}
