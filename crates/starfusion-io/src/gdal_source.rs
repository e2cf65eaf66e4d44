//! [`GdalRasterSource`]: the one [`RasterSource`] implementation, wrapping
//! `gdal::Dataset` / `gdal::raster::RasterBand` / `gdal::raster::reproject`.

use std::path::Path;

use gdal::raster::warp::{reproject_into, ReprojectIntoOptions, WarpResampleAlg};
use gdal::raster::{GDALDataType, GdalType, RasterCreationOption, ResampleAlg};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};

use starfusion_core::geoinfo::{GeoInfo, GeoTransform};
use starfusion_core::image::Image;
use starfusion_core::pixelbase::BaseType;
use starfusion_core::rect::Rect;

use crate::error::{Error, Result};
use crate::format::FileFormat;
use crate::traits::{Interp, RasterSource, ReadOptions, WriteOptions};

/// The default [`RasterSource`], backed by GDAL. Stateless: every call
/// opens (or creates) the dataset it needs and drops it on return, so a
/// `GdalRasterSource` can be shared freely across threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalRasterSource;

impl GdalRasterSource {
    /// Constructs the adapter. No configuration: every option lives on
    /// the per-call [`ReadOptions`] / [`WriteOptions`].
    pub fn new() -> GdalRasterSource {
        GdalRasterSource
    }
}

fn gdal_to_base(ty: GDALDataType::Type) -> BaseType {
    if ty == u8::gdal_type() {
        BaseType::U8
    } else if ty == u16::gdal_type() {
        BaseType::U16
    } else if ty == i16::gdal_type() {
        BaseType::I16
    } else if ty == i32::gdal_type() || ty == u32::gdal_type() {
        BaseType::I32
    } else if ty == f32::gdal_type() {
        BaseType::F32
    } else {
        BaseType::F64
    }
}

fn interp_to_resample(interp: Interp) -> ResampleAlg {
    match interp {
        Interp::Nearest => ResampleAlg::NearestNeighbour,
        Interp::Bilinear => ResampleAlg::Bilinear,
        Interp::Cubic => ResampleAlg::Cubic,
        Interp::CubicSpline => ResampleAlg::CubicSpline,
    }
}

fn interp_to_warp_resample(interp: Interp) -> WarpResampleAlg {
    match interp {
        Interp::Nearest => WarpResampleAlg::NearestNeighbour,
        Interp::Bilinear => WarpResampleAlg::Bilinear,
        Interp::Cubic => WarpResampleAlg::Cubic,
        Interp::CubicSpline => WarpResampleAlg::CubicSpline,
    }
}

/// Creates a dataset through `driver`, dispatching the compile-time
/// `GdalType` generic `Driver::create_with_band_type_with_options` needs
/// to starfusion's runtime-typed [`BaseType`]. The macro is the one place
/// that bridges the two typing disciplines.
macro_rules! create_dataset {
    ($driver:expr, $base:expr, $filename:expr, $w:expr, $h:expr, $bands:expr, $options:expr) => {
        match $base {
            BaseType::U8 | BaseType::I8 => {
                $driver.create_with_band_type_with_options::<u8>($filename, $w, $h, $bands, $options)
            }
            BaseType::U16 => $driver.create_with_band_type_with_options::<u16>($filename, $w, $h, $bands, $options),
            BaseType::I16 => $driver.create_with_band_type_with_options::<i16>($filename, $w, $h, $bands, $options),
            BaseType::I32 => $driver.create_with_band_type_with_options::<i32>($filename, $w, $h, $bands, $options),
            BaseType::F32 => $driver.create_with_band_type_with_options::<f32>($filename, $w, $h, $bands, $options),
            BaseType::F64 => $driver.create_with_band_type_with_options::<f64>($filename, $w, $h, $bands, $options),
        }
    };
}

/// Reads band `band_idx` (1-based) of `dataset` into a single-channel
/// [`Image`], widening through the band's native GDAL type and mapping it
/// onto the nearest starfusion [`BaseType`] (see [`gdal_to_base`]).
fn read_plane(
    dataset: &Dataset,
    band_idx: usize,
    window: (isize, isize),
    window_size: (usize, usize),
    resample: Interp,
) -> Result<Image> {
    let band = dataset.rasterband(band_idx as isize)?;
    let base = gdal_to_base(band.band_type());
    let alg = Some(interp_to_resample(resample));
    let sample = match base {
        BaseType::U8 | BaseType::I8 => {
            starfusion_core::pixelbase::Sample::U8(band.read_as::<u8>(window, window_size, window_size, alg)?.data)
        }
        BaseType::U16 => {
            starfusion_core::pixelbase::Sample::U16(band.read_as::<u16>(window, window_size, window_size, alg)?.data)
        }
        BaseType::I16 => {
            starfusion_core::pixelbase::Sample::I16(band.read_as::<i16>(window, window_size, window_size, alg)?.data)
        }
        BaseType::I32 => {
            starfusion_core::pixelbase::Sample::I32(band.read_as::<i32>(window, window_size, window_size, alg)?.data)
        }
        BaseType::F32 => {
            starfusion_core::pixelbase::Sample::F32(band.read_as::<f32>(window, window_size, window_size, alg)?.data)
        }
        BaseType::F64 => {
            starfusion_core::pixelbase::Sample::F64(band.read_as::<f64>(window, window_size, window_size, alg)?.data)
        }
    };
    Ok(Image::from_sample(window_size.0 as u32, window_size.1 as u32, 1, sample)?)
}

fn write_plane(band: &mut gdal::raster::RasterBand, plane: &Image) -> Result<()> {
    let (w, h) = (plane.width() as usize, plane.height() as usize);
    macro_rules! write_as {
        ($t:ty) => {{
            let mut data: Vec<$t> = Vec::with_capacity(w * h);
            for y in 0..plane.height() {
                for x in 0..plane.width() {
                    data.push(plane.get(x, y, 0) as $t);
                }
            }
            let buffer = gdal::raster::Buffer::new((w, h), data);
            band.write((0, 0), (w, h), &buffer)?;
        }};
    }
    match plane.base_type() {
        BaseType::U8 | BaseType::I8 => write_as!(u8),
        BaseType::U16 => write_as!(u16),
        BaseType::I16 => write_as!(i16),
        BaseType::I32 => write_as!(i32),
        BaseType::F32 => write_as!(f32),
        BaseType::F64 => write_as!(f64),
    }
    Ok(())
}

fn read_geo_info(dataset: &Dataset, band_count: usize) -> GeoInfo {
    let geotransform: Option<GeoTransform> = dataset.geo_transform().ok();
    let crs = dataset.spatial_ref().ok().and_then(|sr| sr.to_wkt().ok());
    let mut nodata = Vec::with_capacity(band_count);
    for i in 1..=band_count {
        let value = dataset.rasterband(i as isize).ok().and_then(|band| band.no_data_value());
        nodata.push(value);
    }
    GeoInfo {
        geotransform,
        crs,
        nodata,
        // Color table round-tripping isn't wired up: starfusion images
        // are multi-channel numeric rasters, not paletted single-band
        // ones, and the spec's test imagery carries none.
        color_table: None,
    }
}

fn write_geo_info(dataset: &mut Dataset, geo: &GeoInfo) -> Result<()> {
    if let Some(gt) = geo.geotransform {
        dataset.set_geo_transform(&gt)?;
    }
    if let Some(crs) = &geo.crs {
        if let Ok(sr) = SpatialRef::from_wkt(crs) {
            dataset.set_spatial_ref(&sr)?;
        }
    }
    Ok(())
}

fn write_image_into(dataset: &mut Dataset, image: &Image, geo: &GeoInfo) -> Result<()> {
    for (i, plane) in image.split(None)?.iter().enumerate() {
        let mut band = dataset.rasterband(i as isize + 1)?;
        if let Some(nodata) = geo.nodata_for(i) {
            band.set_no_data_value(nodata)?;
        }
        write_plane(&mut band, plane)?;
    }
    Ok(())
}

fn read_image_from(dataset: &Dataset, resample: Interp) -> Result<Image> {
    let (w, h) = dataset.size();
    let band_count = dataset.raster_count() as usize;
    let mut planes = Vec::with_capacity(band_count);
    for i in 1..=band_count {
        planes.push(read_plane(dataset, i, (0, 0), (w, h), resample)?);
    }
    Ok(Image::merge(&planes)?)
}

impl RasterSource for GdalRasterSource {
    fn read(&self, path: &Path, opts: &ReadOptions) -> Result<(Image, GeoInfo)> {
        let dataset = Dataset::open(path)?;
        let raster_count = dataset.raster_count() as usize;
        let layers: Vec<usize> = opts.layers.clone().unwrap_or_else(|| (1..=raster_count).collect());
        if layers.is_empty() || layers.len() > 4 {
            return Err(Error::Core(starfusion_core::error::Error::invalid_argument(format!(
                "starfusion images support 1..=4 channels, requested {}",
                layers.len()
            ))));
        }

        let (raster_w, raster_h) = dataset.size();
        let window_rect = opts.crop.unwrap_or_else(|| Rect::from_size(raster_w as u32, raster_h as u32));
        let window = (window_rect.x as isize, window_rect.y as isize);
        let window_size = (window_rect.width as usize, window_rect.height as usize);

        let mut planes = Vec::with_capacity(layers.len());
        for &band_idx in &layers {
            let mut plane = read_plane(&dataset, band_idx, window, window_size, Interp::Nearest)?;
            if opts.flip_h || opts.flip_v {
                plane = flip(&plane, opts.flip_h, opts.flip_v)?;
            }
            planes.push(plane);
        }
        let _ = opts.ignore_color_table;
        let image = Image::merge(&planes)?;
        let geo = read_geo_info(&dataset, raster_count);
        Ok((image, geo))
    }

    fn write(&self, image: &Image, path: &Path, opts: &WriteOptions, geo: &GeoInfo) -> Result<()> {
        let format = match opts.driver {
            Some(f) => f,
            None => FileFormat::from_file(path)?,
        };
        let driver = DriverManager::get_driver_by_name(format.driver_name())?;

        let mut creation_options: Vec<(String, String)> = format
            .default_creation_options()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        creation_options.extend(opts.creation_options.iter().cloned());
        let options: Vec<RasterCreationOption> = creation_options
            .iter()
            .map(|(k, v)| RasterCreationOption { key: k, value: v })
            .collect();

        let filename = path
            .to_str()
            .ok_or_else(|| Error::UnsupportedFormat(format!("{path:?} is not valid UTF-8")))?;
        let mut dataset = create_dataset!(
            driver,
            image.base_type(),
            filename,
            image.width() as isize,
            image.height() as isize,
            image.channels() as isize,
            &options
        )?;

        write_geo_info(&mut dataset, geo)?;
        write_image_into(&mut dataset, image, geo)?;
        Ok(())
    }

    /// Reprojects by pre-creating an in-memory destination dataset already
    /// stamped with `to`'s geotransform/CRS/size, then calling GDAL's
    /// two-dataset `GDALReprojectImage` (exposed as
    /// `gdal::raster::warp::reproject_into(&src, &mut dst, &options)`):
    /// GDAL resamples directly onto the destination's existing grid, so
    /// the result is aligned to `to` pixel-for-pixel without a second
    /// resampling pass. `interp` selects the resampling kernel GDAL runs
    /// during that warp, via `ReprojectIntoOptions::warp_options_mut`.
    fn warp(&self, image: &Image, from: &GeoInfo, to: &GeoInfo, interp: Interp) -> Result<Image> {
        let mem = DriverManager::get_driver_by_name("MEM")?;

        let mut src = create_dataset!(
            mem,
            image.base_type(),
            "",
            image.width() as isize,
            image.height() as isize,
            image.channels() as isize,
            &[]
        )?;
        write_geo_info(&mut src, from)?;
        write_image_into(&mut src, image, from)?;

        let mut dst = create_dataset!(
            mem,
            image.base_type(),
            "",
            image.width() as isize,
            image.height() as isize,
            image.channels() as isize,
            &[]
        )?;
        write_geo_info(&mut dst, to)?;

        let mut warp_opts = ReprojectIntoOptions::default();
        warp_opts.warp_options_mut().with_resampling_alg(interp_to_warp_resample(interp));
        reproject_into(&src, &mut dst, &warp_opts)?;
        let mut out = read_image_from(&dst, Interp::Nearest)?;

        if image.channels() > 1 && interp != Interp::Nearest {
            if let Some(nodata) = from.nodata.iter().flatten().next().copied() {
                let mask = nodata_mask(image, nodata)?;
                let warped_mask = self.warp(&mask, from, to, Interp::Nearest)?;
                restamp_nodata(&mut out, &warped_mask, nodata);
            }
        }
        Ok(out)
    }
}

fn flip(image: &Image, flip_h: bool, flip_v: bool) -> Result<Image> {
    let (w, h) = (image.width(), image.height());
    let mut out = Image::new(w, h, image.channels(), image.base_type())?;
    let mut px = vec![0.0f64; image.channels()];
    for y in 0..h {
        let sy = if flip_v { h - 1 - y } else { y };
        for x in 0..w {
            let sx = if flip_h { w - 1 - x } else { x };
            image.get_pixel(sx, sy, &mut px);
            out.set_pixel(x, y, &px);
        }
    }
    Ok(out)
}

fn nodata_mask(image: &Image, nodata: f64) -> Result<Image> {
    let mut mask = Image::new(image.width(), image.height(), 1, BaseType::U8)?;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let valid = (0..image.channels()).all(|c| image.get(x, y, c) != nodata);
            mask.set(x, y, 0, if valid { 255.0 } else { 0.0 });
        }
    }
    Ok(mask)
}

fn restamp_nodata(image: &mut Image, mask: &Image, nodata: f64) {
    for y in 0..image.height() {
        for x in 0..image.width() {
            if mask.get(x, y, 0) == 0.0 {
                for c in 0..image.channels() {
                    image.set(x, y, c, nodata);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_to_gdal_and_back_roundtrips_for_non_ambiguous_types() {
        for base in [BaseType::U8, BaseType::U16, BaseType::I16, BaseType::I32, BaseType::F32, BaseType::F64] {
            let gdal_ty = match base {
                BaseType::U8 | BaseType::I8 => u8::gdal_type(),
                BaseType::U16 => u16::gdal_type(),
                BaseType::I16 => i16::gdal_type(),
                BaseType::I32 => i32::gdal_type(),
                BaseType::F32 => f32::gdal_type(),
                BaseType::F64 => f64::gdal_type(),
            };
            assert_eq!(gdal_to_base(gdal_ty), base);
        }
    }
}
