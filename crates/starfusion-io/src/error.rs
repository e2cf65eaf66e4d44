//! Error type for the raster I/O boundary.

use thiserror::Error;

/// Errors raised reading, writing, or warping a raster file.
#[derive(Debug, Error)]
pub enum Error {
    /// Propagated from a `starfusion-core` image operation (shape/type
    /// mismatch discovered while building the in-memory `Image`).
    #[error(transparent)]
    Core(#[from] starfusion_core::error::Error),

    /// Propagated from the GDAL collaborator itself (open failure, driver
    /// not registered, reprojection failure, ...).
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    /// A filesystem-level failure distinct from a GDAL driver error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// No registered driver matches the requested format name or file
    /// extension.
    #[error("unsupported raster format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for raster I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
