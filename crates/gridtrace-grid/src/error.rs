//! Error types for grid construction and lookup.

use thiserror::Error;

use crate::voxel::VoxelKey;

/// Errors that can occur while configuring, building or querying a grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Configuration parameters are invalid or inconsistent.
    #[error("invalid grid configuration: {0}")]
    Configuration(String),

    /// A lattice index outside the grid was used where one is required.
    #[error("voxel {key} is outside the grid resolution {resolution:?}")]
    InvalidCoordinate {
        /// The offending index.
        key: VoxelKey,
        /// Grid resolution per axis.
        resolution: [u32; 3],
    },
}

impl GridError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        GridError::Configuration(msg.into())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
