//! Backing stores for the voxel lattice.

use std::collections::HashMap;
use std::mem::size_of;

use crate::voxel::{Voxel, VoxelKey};

/// Bytes a dense lattice of `resolution` would take, saturating on overflow.
pub(crate) fn dense_footprint(resolution: [u32; 3]) -> u64 {
    resolution
        .iter()
        .fold(1u64, |acc, &r| acc.saturating_mul(r as u64))
        .saturating_mul(size_of::<Voxel>() as u64)
}

/// Either a flat array over every cell or a map over occupied cells only.
#[derive(Debug, Clone)]
pub(crate) enum VoxelStorage {
    /// One slot per cell, indexed by `x + rx * (y + ry * z)`.
    Dense {
        cells: Vec<Voxel>,
        resolution: [u32; 3],
    },
    /// Occupied cells keyed by [`VoxelKey::pack`].
    Sparse(HashMap<u64, Voxel>),
}

impl VoxelStorage {
    pub(crate) fn dense(resolution: [u32; 3]) -> Self {
        let count = resolution.iter().map(|&r| r as usize).product();
        VoxelStorage::Dense {
            cells: vec![Voxel::default(); count],
            resolution,
        }
    }

    pub(crate) fn sparse() -> Self {
        VoxelStorage::Sparse(HashMap::new())
    }

    #[inline]
    fn linear_index(key: VoxelKey, resolution: [u32; 3]) -> usize {
        let [rx, ry, _] = resolution.map(|r| r as usize);
        key.x as usize + rx * (key.y as usize + ry * key.z as usize)
    }

    /// Voxel at an in-range key, if a slot exists.
    #[inline]
    pub(crate) fn get(&self, key: VoxelKey) -> Option<&Voxel> {
        match self {
            VoxelStorage::Dense { cells, resolution } => {
                cells.get(Self::linear_index(key, *resolution))
            }
            VoxelStorage::Sparse(map) => map.get(&key.pack()),
        }
    }

    /// Voxel at an in-range key, created on demand.
    pub(crate) fn get_or_create(&mut self, key: VoxelKey) -> &mut Voxel {
        match self {
            VoxelStorage::Dense { cells, resolution } => {
                let idx = Self::linear_index(key, *resolution);
                &mut cells[idx]
            }
            VoxelStorage::Sparse(map) => map.entry(key.pack()).or_insert_with(Voxel::new),
        }
    }

    /// Non-empty voxels with their keys, in no particular order.
    pub(crate) fn occupied(&self) -> Box<dyn Iterator<Item = (VoxelKey, &Voxel)> + '_> {
        match self {
            VoxelStorage::Dense { cells, resolution } => {
                let [rx, ry, _] = resolution.map(|r| r as usize);
                Box::new(
                    cells
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| !v.is_empty())
                        .map(move |(i, v)| {
                            let key = VoxelKey::new(
                                (i % rx) as i32,
                                ((i / rx) % ry) as i32,
                                (i / (rx * ry)) as i32,
                            );
                            (key, v)
                        }),
                )
            }
            VoxelStorage::Sparse(map) => Box::new(
                map.iter()
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(&k, v)| (VoxelKey::unpack(k), v)),
            ),
        }
    }

    pub(crate) fn is_sparse(&self) -> bool {
        matches!(self, VoxelStorage::Sparse(_))
    }

    /// Approximate heap usage of the lattice itself (not the references).
    pub(crate) fn memory_bytes(&self) -> u64 {
        match self {
            VoxelStorage::Dense { cells, .. } => (cells.len() * size_of::<Voxel>()) as u64,
            VoxelStorage::Sparse(map) => {
                (map.capacity() * (size_of::<u64>() + size_of::<Voxel>())) as u64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridtrace_scene::GeometryId;

    fn fill(storage: &mut VoxelStorage) {
        storage.get_or_create(VoxelKey::new(1, 2, 3)).add_geometry(GeometryId(0));
        storage.get_or_create(VoxelKey::new(1, 2, 3)).add_geometry(GeometryId(1));
        storage.get_or_create(VoxelKey::new(0, 0, 0)).add_geometry(GeometryId(2));
    }

    #[test]
    fn test_dense_and_sparse_agree() {
        let res = [4, 4, 4];
        let mut dense = VoxelStorage::dense(res);
        let mut sparse = VoxelStorage::sparse();
        fill(&mut dense);
        fill(&mut sparse);

        for storage in [&dense, &sparse] {
            assert_eq!(storage.get(VoxelKey::new(1, 2, 3)).map(Voxel::len), Some(2));
            assert_eq!(storage.get(VoxelKey::new(0, 0, 0)).map(Voxel::len), Some(1));
            let mut keys: Vec<VoxelKey> = storage.occupied().map(|(k, _)| k).collect();
            keys.sort();
            assert_eq!(keys, vec![VoxelKey::new(0, 0, 0), VoxelKey::new(1, 2, 3)]);
        }

        // Dense slots exist for every cell but stay empty.
        assert!(dense.get(VoxelKey::new(3, 3, 3)).unwrap().is_empty());
        assert!(sparse.get(VoxelKey::new(3, 3, 3)).is_none());
        assert!(sparse.is_sparse() && !dense.is_sparse());
    }

    #[test]
    fn test_dense_linear_layout() {
        let res = [3, 5, 2];
        let mut dense = VoxelStorage::dense(res);
        dense.get_or_create(VoxelKey::new(2, 4, 1)).add_geometry(GeometryId(9));
        let (key, voxel) = dense.occupied().next().unwrap();
        assert_eq!(key, VoxelKey::new(2, 4, 1));
        assert!(voxel.contains(GeometryId(9)));
    }

    #[test]
    fn test_dense_footprint_saturates() {
        assert_eq!(dense_footprint([2, 2, 2]), 8 * size_of::<Voxel>() as u64);
        assert_eq!(dense_footprint([u32::MAX; 3]), u64::MAX);
    }
}
