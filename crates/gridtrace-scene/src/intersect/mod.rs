//! Reference primitives and their ray intersection routines.
//!
//! These are the minimal collaborators needed to drive and test the
//! acceleration structures; renderers are expected to bring their own
//! [`Geometry`](crate::Geometry) implementations.

mod plane;
mod sphere;
mod triangle;

pub use plane::{intersect_plane, InfinitePlane};
pub use sphere::{intersect_sphere, Sphere};
pub use triangle::{intersect_triangle, Triangle};

use crate::SurfaceHit;

/// Sort hits by ray parameter.
pub(crate) fn sort_hits(hits: &mut [SurfaceHit]) {
    hits.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));
}
