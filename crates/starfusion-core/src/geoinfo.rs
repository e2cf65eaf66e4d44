//! [`GeoInfo`]: per-file geospatial metadata carried alongside pixel
//! data, consumed only at the I/O boundary.
//!
//! The image core is agnostic to coordinate reference systems — no
//! algorithm here interprets a geotransform or CRS string — but every
//! raster read/write preserves `GeoInfo` unchanged so round-tripping a
//! file through `starfusion-io` doesn't lose georeferencing.

/// A 6-parameter affine pixel-to-projected-coordinate transform, in the
/// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation,
/// pixel_height]` convention.
pub type GeoTransform = [f64; 6];

/// A color table entry: palette index to RGBA.
pub type ColorTableEntry = (u8, [u8; 4]);

/// Per-file geospatial metadata: geotransform, CRS, per-band nodata, and
/// an optional color table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoInfo {
    /// Pixel-to-projected affine transform, if known.
    pub geotransform: Option<GeoTransform>,
    /// Coordinate reference system, as an opaque string (e.g. a WKT or
    /// `EPSG:4326`-style identifier); the core never parses this.
    pub crs: Option<String>,
    /// Nodata value per band, indexed by band.
    pub nodata: Vec<Option<f64>>,
    /// Optional palette, for images carrying a color table.
    pub color_table: Option<Vec<ColorTableEntry>>,
}

impl GeoInfo {
    /// Metadata carrying no georeferencing at all (a synthetic or
    /// purely-numeric image).
    pub fn none() -> GeoInfo {
        GeoInfo::default()
    }

    /// Nodata value for `band`, if both the band index is in range and a
    /// value was set.
    pub fn nodata_for(&self, band: usize) -> Option<f64> {
        self.nodata.get(band).copied().flatten()
    }
}
