//! In-memory scene: the geometry list acceleration structures are built from.

use std::sync::Arc;

use gridtrace_math::Aabb3;

use crate::{Geometry, GeometryId, Intersection, Ray};

/// An ordered collection of geometry.
///
/// The position of a geometry in the list is its [`GeometryId`]. The union
/// bounding box of all finite geometry is maintained incrementally.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    geometries: Vec<Arc<dyn Geometry>>,
    bounds: Option<Aabb3>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a geometry, returning its id.
    pub fn add<G: Geometry + 'static>(&mut self, geometry: G) -> GeometryId {
        self.add_shared(Arc::new(geometry))
    }

    /// Add an already shared geometry, returning its id.
    pub fn add_shared(&mut self, geometry: Arc<dyn Geometry>) -> GeometryId {
        let id = GeometryId(self.geometries.len() as u32);
        if let Some(bb) = geometry.bounding_box() {
            self.bounds = Some(match self.bounds {
                Some(bounds) => bounds.union(&bb),
                None => bb,
            });
        }
        self.geometries.push(geometry);
        id
    }

    /// All geometry, indexed by id.
    pub fn geometries(&self) -> &[Arc<dyn Geometry>] {
        &self.geometries
    }

    /// Look up a geometry by id.
    pub fn geometry(&self, id: GeometryId) -> Option<&Arc<dyn Geometry>> {
        self.geometries.get(id.index())
    }

    /// Number of geometries.
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// True if the scene holds no geometry.
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Ids of geometry with a bounding box.
    pub fn finite_ids(&self) -> impl Iterator<Item = GeometryId> + '_ {
        self.ids_where(|g| !g.is_infinite())
    }

    /// Ids of geometry without a bounding box.
    pub fn infinite_ids(&self) -> impl Iterator<Item = GeometryId> + '_ {
        self.ids_where(|g| g.is_infinite())
    }

    fn ids_where<'a>(
        &'a self,
        pred: impl Fn(&dyn Geometry) -> bool + 'a,
    ) -> impl Iterator<Item = GeometryId> + 'a {
        self.geometries
            .iter()
            .enumerate()
            .filter(move |(_, g)| pred(&***g))
            .map(|(i, _)| GeometryId(i as u32))
    }

    /// Union bounding box of all finite geometry, `None` if there is none.
    pub fn bounds(&self) -> Option<Aabb3> {
        self.bounds
    }

    /// Test the ray against every geometry, returning all hits sorted by `t`.
    ///
    /// Brute force; used when no acceleration structure is requested and as
    /// a reference answer in tests.
    pub fn intersect_all(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = self
            .geometries
            .iter()
            .enumerate()
            .flat_map(|(i, g)| {
                g.intersect(ray)
                    .into_iter()
                    .map(move |hit| Intersection::from_hit(GeometryId(i as u32), ray, hit))
            })
            .collect();
        hits.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    /// Brute-force closest hit.
    pub fn intersect_closest(&self, ray: &Ray) -> Option<Intersection> {
        self.intersect_all(ray).into_iter().next()
    }
}
