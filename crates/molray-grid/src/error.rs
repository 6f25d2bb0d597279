//! Error types for grid configuration.

use thiserror::Error;

/// Errors raised while validating a grid configuration.
///
/// Queries and insertions never fail; only sizing a grid can. Bad
/// insertions are dropped with a diagnostic instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Cell size must be positive and finite
    #[error("invalid cell size {0}: must be positive and finite")]
    BadCellSize(f32),

    /// Extent corners are inverted or non-finite
    #[error("invalid grid extent: {0}")]
    BadExtent(String),
}

pub type GridResult<T> = Result<T, GridError>;
