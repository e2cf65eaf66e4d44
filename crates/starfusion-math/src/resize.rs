//! Area-average downscale and bicubic upscale, the two resampling
//! operations FitFC's residual step chains together (downscale by
//! `resolution_factor` with area-averaging, then upscale back with
//! bicubic interpolation — see the `starfusion-fitfc` residual step).
//!
//! Bicubic uses reflect borders: a sample that would read past an edge
//! mirrors back into the image rather than clamping or reading zero.

use starfusion_core::error::{Error, Result};
use starfusion_core::image::Image;
use wide::f64x4;

use crate::interp::{cubic_weight, reflect_index};

/// Downscales `image` by the integer `factor` (each output pixel is the
/// mean of the `factor x factor` block of source pixels it covers).
///
/// `factor = 1` returns a clone of `image`. Returns
/// [`Error::InvalidArgument`] if `factor` is zero or does not evenly
/// divide both dimensions.
pub fn area_average(image: &Image, factor: u32) -> Result<Image> {
    if factor == 0 {
        return Err(Error::invalid_argument("area_average: factor must be positive"));
    }
    if factor == 1 {
        return Ok(image.clone());
    }
    let (width, height) = (image.width(), image.height());
    if width % factor != 0 || height % factor != 0 {
        return Err(Error::invalid_argument(format!(
            "area_average: factor {factor} does not evenly divide {width}x{height}"
        )));
    }
    let out_width = width / factor;
    let out_height = height / factor;
    let mut out = Image::new(out_width, out_height, image.channels(), image.base_type())?;
    let norm = (factor * factor) as f64;
    for oy in 0..out_height {
        for ox in 0..out_width {
            for c in 0..image.channels() {
                let mut sum = 0.0;
                for dy in 0..factor {
                    for dx in 0..factor {
                        sum += image.get(ox * factor + dx, oy * factor + dy, c);
                    }
                }
                out.set(ox, oy, c, sum / norm);
            }
        }
    }
    Ok(out)
}

/// Upscales (or downscales) `image` to `(out_width, out_height)` using
/// separable bicubic (Catmull-Rom, `a = -0.5`) convolution with reflect
/// borders.
///
/// Returns [`Error::InvalidArgument`] if either target dimension is zero.
pub fn bicubic(image: &Image, out_width: u32, out_height: u32) -> Result<Image> {
    if out_width == 0 || out_height == 0 {
        return Err(Error::invalid_argument("bicubic: target size must be non-zero"));
    }
    if out_width == image.width() && out_height == image.height() {
        return Ok(image.clone());
    }
    let mut out = Image::new(out_width, out_height, image.channels(), image.base_type())?;
    let scale_x = image.width() as f64 / out_width as f64;
    let scale_y = image.height() as f64 / out_height as f64;

    for oy in 0..out_height {
        let sy = (oy as f64 + 0.5) * scale_y - 0.5;
        let sy0 = sy.floor() as i64;
        let wy = weights4(sy - sy0 as f64);
        for ox in 0..out_width {
            let sx = (ox as f64 + 0.5) * scale_x - 0.5;
            let sx0 = sx.floor() as i64;
            let wx = weights4(sx - sx0 as f64);
            for c in 0..image.channels() {
                let mut rows = [0.0; 4];
                for (j, row) in rows.iter_mut().enumerate() {
                    let y = reflect_index(sy0 - 1 + j as i64, image.height());
                    let taps = [
                        image.get(reflect_index(sx0 - 1, image.width()), y, c),
                        image.get(reflect_index(sx0, image.width()), y, c),
                        image.get(reflect_index(sx0 + 1, image.width()), y, c),
                        image.get(reflect_index(sx0 + 2, image.width()), y, c),
                    ];
                    *row = dot4(taps, wx);
                }
                out.set(ox, oy, c, dot4(rows, wy));
            }
        }
    }
    Ok(out)
}

fn weights4(frac: f64) -> [f64; 4] {
    [
        cubic_weight(frac + 1.0),
        cubic_weight(frac),
        cubic_weight(frac - 1.0),
        cubic_weight(frac - 2.0),
    ]
}

fn dot4(a: [f64; 4], b: [f64; 4]) -> f64 {
    (f64x4::from(a) * f64x4::from(b)).reduce_add()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use starfusion_core::pixelbase::BaseType;

    #[test]
    fn area_average_of_uniform_block_is_identity() {
        let mut img = Image::new(4, 4, 1, BaseType::F64).unwrap();
        img.fill(&[7.0], None).unwrap();
        let out = area_average(&img, 2).unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 2);
        assert_relative_eq!(out.get(0, 0, 0), 7.0);
    }

    #[test]
    fn area_average_factor_one_is_clone() {
        let img = Image::new(3, 3, 1, BaseType::U8).unwrap();
        let out = area_average(&img, 1).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn area_average_rejects_non_dividing_factor() {
        let img = Image::new(3, 3, 1, BaseType::U8).unwrap();
        assert!(area_average(&img, 2).is_err());
    }

    #[test]
    fn bicubic_of_uniform_image_is_identity() {
        let mut img = Image::new(4, 4, 1, BaseType::F64).unwrap();
        img.fill(&[3.5], None).unwrap();
        let out = bicubic(&img, 8, 8).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_relative_eq!(out.get(x, y, 0), 3.5, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn bicubic_same_size_is_identity() {
        let mut img = Image::new(3, 3, 1, BaseType::U8).unwrap();
        img.set(1, 1, 0, 200.0);
        let out = bicubic(&img, 3, 3).unwrap();
        assert_eq!(out, img);
    }
}
