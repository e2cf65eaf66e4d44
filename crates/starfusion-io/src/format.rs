//! [`FileFormat`]: extension-to-driver lookup for the small set of raster
//! formats starfusion cares about, grounded in the same "inferred from
//! extension, GTiff gets a default creation option" pattern spec.md §6
//! describes.

use std::path::Path;

use crate::error::{Error, Result};

/// A raster file format starfusion knows how to read or write, named by
/// its GDAL short driver name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// GeoTIFF (`GTiff`). Writes default to `{"COMPRESS": "LZW"}`.
    GeoTiff,
    /// Erdas Imagine (`HFA`).
    Hfa,
    /// ENVI raw binary + header (`ENVI`).
    Envi,
    /// PNG (`PNG`), non-georeferenced preview output.
    Png,
}

impl FileFormat {
    /// The GDAL short driver name for this format.
    pub fn driver_name(self) -> &'static str {
        match self {
            FileFormat::GeoTiff => "GTiff",
            FileFormat::Hfa => "HFA",
            FileFormat::Envi => "ENVI",
            FileFormat::Png => "PNG",
        }
    }

    /// Every format this build understands, in a stable order.
    pub fn supported_formats() -> &'static [FileFormat] {
        &[FileFormat::GeoTiff, FileFormat::Hfa, FileFormat::Envi, FileFormat::Png]
    }

    /// Looks up a format by (case-insensitive) file extension, without
    /// the leading dot.
    pub fn from_extension(ext: &str) -> Result<FileFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "tif" | "tiff" => Ok(FileFormat::GeoTiff),
            "img" => Ok(FileFormat::Hfa),
            "envi" | "dat" | "bil" | "bip" | "bsq" => Ok(FileFormat::Envi),
            "png" => Ok(FileFormat::Png),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Infers a format from a file path's extension.
    pub fn from_file(path: &Path) -> Result<FileFormat> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(format!("{path:?} has no extension")))?;
        FileFormat::from_extension(ext)
    }

    /// Default GDAL creation options for this format. Only `GTiff` carries
    /// one by default (`COMPRESS=LZW`, per spec.md §6); other formats get
    /// none unless the caller supplies their own.
    pub fn default_creation_options(self) -> &'static [(&'static str, &'static str)] {
        match self {
            FileFormat::GeoTiff => &[("COMPRESS", "LZW")],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn from_extension_is_case_insensitive() {
        assert_eq!(FileFormat::from_extension("TIF").unwrap(), FileFormat::GeoTiff);
        assert_eq!(FileFormat::from_extension("tiff").unwrap(), FileFormat::GeoTiff);
    }

    #[test]
    fn from_file_infers_from_path_extension() {
        let path = PathBuf::from("scene.img");
        assert_eq!(FileFormat::from_file(&path).unwrap(), FileFormat::Hfa);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = FileFormat::from_extension("xyz");
        assert!(matches!(err, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn gtiff_default_creation_options_set_lzw_compression() {
        assert_eq!(FileFormat::GeoTiff.default_creation_options(), &[("COMPRESS", "LZW")]);
        assert!(FileFormat::Png.default_creation_options().is_empty());
    }
}
