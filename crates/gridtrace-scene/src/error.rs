//! Error types for scene loading.

use thiserror::Error;

/// Errors that can occur while building a scene from a description.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The description could not be parsed.
    #[error("failed to parse scene description: {0}")]
    Parse(#[from] serde_json::Error),

    /// A shape has invalid parameters.
    #[error("invalid shape at index {index}: {reason}")]
    InvalidShape {
        /// Position of the shape in the description.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
