//! [`RasterSource`]: the external raster I/O boundary spec.md §6 names.
//!
//! One implementation, [`crate::gdal_source::GdalRasterSource`], wraps the
//! `gdal` crate. Keeping the boundary as a trait rather than calling GDAL
//! directly from the fusors matches spec.md §9's "no global state" guidance
//! — a fusor crate never links `gdal` itself, only `starfusion-io`'s thin
//! surface.

use std::path::Path;

use starfusion_core::geoinfo::GeoInfo;
use starfusion_core::image::Image;
use starfusion_core::rect::Rect;

use crate::error::Result;
use crate::format::FileFormat;

/// Resampling algorithm for [`RasterSource::warp`], mirroring the four
/// kernels spec.md §6 enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interp {
    /// Nearest-neighbor; used to re-warp nodata masks regardless of the
    /// data warp's own kernel, so nodata never blurs into valid pixels.
    Nearest,
    /// Bilinear.
    Bilinear,
    /// Bicubic.
    Cubic,
    /// Cubic B-spline.
    CubicSpline,
}

/// Options for [`RasterSource::read`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Band indices to read (1-based, GDAL convention), or all bands when
    /// `None`.
    pub layers: Option<Vec<usize>>,
    /// Pixel-space sub-window to read, or the full raster when `None`.
    pub crop: Option<Rect>,
    /// Flip the read buffer horizontally after reading.
    pub flip_h: bool,
    /// Flip the read buffer vertically after reading.
    pub flip_v: bool,
    /// Skip interpreting a single-band paletted raster's color table as
    /// an implicit RGB expansion.
    pub ignore_color_table: bool,
}

/// Options for [`RasterSource::write`].
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Driver to write with; inferred from the file extension via
    /// [`FileFormat::from_file`] when `None`.
    pub driver: Option<FileFormat>,
    /// Extra GDAL creation options, appended after the format's own
    /// defaults (e.g. `GTiff`'s `COMPRESS=LZW`).
    pub creation_options: Vec<(String, String)>,
}

/// The external raster I/O collaborator: read, write, and reproject a
/// georeferenced [`Image`]. Everything CRS-, geotransform-, and
/// driver-shaped lives behind this trait; `starfusion-core` never parses
/// a CRS string itself (spec.md §3, §6).
pub trait RasterSource {
    /// Reads a raster file into an in-memory [`Image`] plus its
    /// [`GeoInfo`].
    fn read(&self, path: &Path, opts: &ReadOptions) -> Result<(Image, GeoInfo)>;

    /// Writes `image` to `path`, preserving `geo` in the output file.
    fn write(&self, image: &Image, path: &Path, opts: &WriteOptions, geo: &GeoInfo) -> Result<()>;

    /// Reprojects `image` from `from`'s geotransform/CRS to `to`'s,
    /// using `interp`. For a multi-channel non-nearest warp, a nodata
    /// mask is warped separately with [`Interp::Nearest`] and used to
    /// re-stamp nodata in the result, avoiding the aliasing a smooth
    /// kernel would otherwise blend nodata into (spec.md §6).
    fn warp(&self, image: &Image, from: &GeoInfo, to: &GeoInfo, interp: Interp) -> Result<Image>;
}
