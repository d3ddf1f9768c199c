//! Lattice coordinates and voxel contents.

use std::fmt;

use gridtrace_scene::GeometryId;
use serde::{Deserialize, Serialize};

/// Bits per axis in a packed [`VoxelKey`].
pub const KEY_BITS: u32 = 21;

const KEY_MASK: u64 = (1 << KEY_BITS) - 1;

/// Integer index `(x, y, z)` of one lattice cell.
///
/// Signed so that a traversal step past the low face produces `-1` rather
/// than wrapping; only keys inside the lattice are ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelKey {
    /// Index along X.
    pub x: i32,
    /// Index along Y.
    pub y: i32,
    /// Index along Z.
    pub z: i32,
}

impl VoxelKey {
    /// Create a key.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Components as an array.
    #[inline]
    pub fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Key from an array of components.
    #[inline]
    pub fn from_array(a: [i32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// True if `0 <= key < resolution` on every axis.
    #[inline]
    pub fn in_bounds(self, resolution: [u32; 3]) -> bool {
        self.to_array()
            .iter()
            .zip(resolution.iter())
            .all(|(&i, &r)| i >= 0 && (i as i64) < r as i64)
    }

    /// Pack an in-range key into a single integer, [`KEY_BITS`] per axis.
    #[inline]
    pub fn pack(self) -> u64 {
        (self.x as u64 & KEY_MASK)
            | ((self.y as u64 & KEY_MASK) << KEY_BITS)
            | ((self.z as u64 & KEY_MASK) << (2 * KEY_BITS))
    }

    /// Inverse of [`VoxelKey::pack`].
    #[inline]
    pub fn unpack(packed: u64) -> Self {
        Self::new(
            (packed & KEY_MASK) as i32,
            ((packed >> KEY_BITS) & KEY_MASK) as i32,
            ((packed >> (2 * KEY_BITS)) & KEY_MASK) as i32,
        )
    }
}

impl fmt::Display for VoxelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Geometry references held by one lattice cell.
///
/// Filled during grid construction and read-only afterwards: the grid only
/// hands out shared references. Insertion does not deduplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Voxel {
    geometries: Vec<GeometryId>,
}

impl Voxel {
    /// Create an empty voxel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a geometry reference.
    pub fn add_geometry(&mut self, id: GeometryId) {
        self.geometries.push(id);
    }

    /// The geometry references, in insertion order.
    pub fn geometries(&self) -> &[GeometryId] {
        &self.geometries
    }

    /// True if the voxel references the geometry.
    pub fn contains(&self, id: GeometryId) -> bool {
        self.geometries.contains(&id)
    }

    /// True if no geometry overlaps this cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Number of geometry references.
    #[inline]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }
}
