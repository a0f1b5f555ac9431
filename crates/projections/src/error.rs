//! Projection error types.

use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A projection-specific error.
    #[error("Projection error: {0}")]
    Projection(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
