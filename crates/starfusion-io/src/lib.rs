//! Raster I/O boundary for the starfusion fusors: read/write/reproject a
//! georeferenced [`starfusion_core::image::Image`] through GDAL, behind a
//! trait (`starfusion-core` and the fusor crates never link `gdal`
//! directly).
//!
//! # Modules
//!
//! - [`traits`] — [`traits::RasterSource`], the format-agnostic
//!   read/write/warp boundary, plus its option types.
//! - [`gdal_source`] — [`gdal_source::GdalRasterSource`], the one
//!   implementation, backed by the `gdal` crate.
//! - [`format`] — [`format::FileFormat`], extension-to-driver lookup.
//! - [`error`] — the I/O error taxonomy.

pub mod error;
pub mod format;
pub mod gdal_source;
pub mod traits;

/// Re-exports of the types most callers need, for `use
/// starfusion_io::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::format::FileFormat;
    pub use crate::gdal_source::GdalRasterSource;
    pub use crate::traits::{Interp, RasterSource, ReadOptions, WriteOptions};
}
