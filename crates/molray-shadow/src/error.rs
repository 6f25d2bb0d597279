//! Error types for the shadow engine.

use thiserror::Error;

use molray_grid::GridError;

/// Errors raised while configuring the engine for a frame.
///
/// Point queries never fail; a query the engine cannot resolve reports
/// "not shadowed" instead of erroring mid-frame.
#[derive(Error, Debug)]
pub enum ShadowError {
    /// Light direction too short to normalize
    #[error("light direction is degenerate (near-zero length)")]
    DegenerateLight,

    /// Culling grid rejected its configuration
    #[error("culling grid configuration failed: {0}")]
    Grid(#[from] GridError),
}

pub type ShadowResult<T> = Result<T, ShadowError>;
