//! [`Fitfc`]: local-regression + residual-upsample + spatial-filter
//! fusor, spec.md §4.3.

use starfusion_core::error::Error as CoreError;
use starfusion_core::image::{mask_is_valid, Image};
use starfusion_core::multires::MultiResImage;
use starfusion_core::pixelbase::BaseType;
use starfusion_math::{area_average, bicubic};

use crate::error::Result;
use crate::integral::RegressionSums;
use crate::options::FitfcOptions;

/// Determinant threshold below which the local regression falls back to
/// `a = 1, b = 0` (spec.md §4.3 step 2).
const DET_EPSILON: f64 = 1e-14;

/// The FitFC fusor: a single-pair local-regression predictor with
/// residual upsampling and a spectral k-nearest-neighbor spatial filter.
///
/// Like [`starfusion_starfm::Starfm`], a `Fitfc` instance is cheap to
/// construct and holds no reference to a [`MultiResImage`] between
/// calls. The `win_size`-dependent spatial weight matrix is cached on the
/// instance.
pub struct Fitfc {
    options: FitfcOptions,
    spatial_weights: Vec<f64>,
}

impl Fitfc {
    /// Validates `options` and constructs a fusor instance.
    pub fn new(options: FitfcOptions) -> Result<Fitfc> {
        options.validate()?;
        let spatial_weights = build_spatial_weights(options.win_size);
        Ok(Fitfc { options, spatial_weights })
    }

    /// The validated options this instance predicts with.
    pub fn options(&self) -> &FitfcOptions {
        &self.options
    }

    /// Predicts the high-resolution image at `target_date` from the
    /// single `pair_date` pair.
    pub fn predict(
        &self,
        images: &MultiResImage,
        target_date: i64,
        mask: Option<&Image>,
        predict_mask: Option<&Image>,
    ) -> Result<Image> {
        let opts = &self.options;
        tracing::debug!(win_size = opts.win_size, target_date, "fitfc predict");

        let h1 = self.required(images, &opts.high_tag, opts.pair_date)?;
        let l1 = self.required(images, &opts.low_tag, opts.pair_date)?;
        let lt = self.required(images, &opts.low_tag, target_date)?;
        require_compatible(h1, l1)?;
        require_compatible(h1, lt)?;

        let (width, height, channels) = (h1.width(), h1.height(), h1.channels());
        if width < opts.resolution_factor || height < opts.resolution_factor {
            return Err(CoreError::size(
                "FitFC: image size is smaller than resolution_factor",
            )
            .into());
        }
        if let Some(m) = mask {
            if m.width() != width || m.height() != height {
                return Err(CoreError::size("FitFC: mask size does not match image size").into());
            }
        }
        if let Some(pm) = predict_mask {
            if pm.width() != width || pm.height() != height {
                return Err(
                    CoreError::size("FitFC: predict_mask size does not match image size").into(),
                );
            }
        }

        let predict_area = opts.prediction_area.or_full(width, height);
        let half = opts.win_size / 2;

        let (frm, residual) = self.local_regression(h1, l1, lt, mask)?;
        let residual = residual_upsample(&residual, opts.resolution_factor)?;

        let k = self.options.clamped_number_neighbors() as usize;
        let mut out = Image::new(width, height, channels, h1.base_type())?;

        let compute_row = |y: u32| -> Vec<(u32, Vec<f64>)> {
            let mut row = Vec::new();
            for x in predict_area.x..predict_area.right() {
                if let Some(pm) = predict_mask {
                    if !(0..channels).any(|c| mask_is_valid(pm, x, y, c)) {
                        continue;
                    }
                }
                let values = self.predict_pixel(x, y, width, height, channels, half, k, h1, &frm, &residual, mask);
                row.push((x, values));
            }
            row
        };

        let rows: Vec<(u32, Vec<(u32, Vec<f64>)>)> = {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                (predict_area.y..predict_area.bottom())
                    .into_par_iter()
                    .map(|y| (y, compute_row(y)))
                    .collect()
            }
            #[cfg(not(feature = "parallel"))]
            {
                (predict_area.y..predict_area.bottom())
                    .map(|y| (y, compute_row(y)))
                    .collect()
            }
        };

        for (y, row) in rows {
            for (x, values) in row {
                for (c, v) in values.into_iter().enumerate() {
                    out.set(x, y, c, v);
                }
            }
        }

        Ok(out)
    }

    fn required<'a>(&self, images: &'a MultiResImage, tag: &str, date: i64) -> Result<&'a Image> {
        images
            .get(tag, date)
            .ok_or_else(|| CoreError::NotFound { tag: tag.to_string(), date }.into())
    }

    /// Step 2: per-channel local regression producing `FRM(h_1) = a·h_1 +
    /// b` and the `f64` residual `l_t − (a·l_1 + b)`, both at full image
    /// extent.
    fn local_regression(&self, h1: &Image, l1: &Image, lt: &Image, mask: Option<&Image>) -> Result<(Image, Image)> {
        let (width, height, channels) = (h1.width(), h1.height(), h1.channels());
        let half = self.options.win_size as i64 / 2;
        let mut frm = Image::new(width, height, channels, BaseType::F64)?;
        let mut residual = Image::new(width, height, channels, BaseType::F64)?;

        for c in 0..channels {
            let sums = RegressionSums::build(
                width,
                height,
                |x, y| l1.get(x, y, c),
                |x, y| lt.get(x, y, c),
                |x, y| mask.map_or(true, |m| mask_is_valid(m, x, y, c)),
            );
            for y in 0..height {
                for x in 0..width {
                    let (sx, sy, sxx, sxy, n) = sums.window(
                        x as i64 - half,
                        y as i64 - half,
                        x as i64 + half,
                        y as i64 + half,
                    );
                    let det = n * sxx - sx * sx;
                    let (a, b) = if det.abs() < DET_EPSILON {
                        (1.0, 0.0)
                    } else {
                        ((n * sxy - sx * sy) / det, (sxx * sy - sx * sxy) / det)
                    };
                    let frm_v = a * h1.get(x, y, c) + b;
                    let r_v = lt.get(x, y, c) - (a * l1.get(x, y, c) + b);
                    frm.set(x, y, c, frm_v);
                    residual.set(x, y, c, r_v);
                }
            }
        }
        Ok((frm, residual))
    }

    /// Step 4: the spatial filter for one output pixel — rank window
    /// candidates by squared multi-channel spectral distance in `h1`,
    /// keep the `k` nearest, and blend their `FRM + r` by the
    /// precomputed spatial distance weight.
    #[allow(clippy::too_many_arguments)]
    fn predict_pixel(
        &self,
        cx: u32,
        cy: u32,
        width: u32,
        height: u32,
        channels: usize,
        half: u32,
        k: usize,
        h1: &Image,
        frm: &Image,
        residual: &Image,
        mask: Option<&Image>,
    ) -> Vec<f64> {
        let win_size = self.options.win_size;
        let mut candidates: Vec<(f64, u32, u32, usize)> = Vec::new();

        for wy in 0..win_size {
            let y = cy as i64 + wy as i64 - half as i64;
            if y < 0 || y >= height as i64 {
                continue;
            }
            let y = y as u32;
            for wx in 0..win_size {
                let x = cx as i64 + wx as i64 - half as i64;
                if x < 0 || x >= width as i64 {
                    continue;
                }
                let x = x as u32;

                if let Some(m) = mask {
                    if !(0..channels).all(|c| mask_is_valid(m, x, y, c)) {
                        continue;
                    }
                }

                let dist2: f64 = (0..channels)
                    .map(|c| {
                        let d = h1.get(cx, cy, c) - h1.get(x, y, c);
                        d * d
                    })
                    .sum();
                candidates.push((dist2, x, y, (wy * win_size + wx) as usize));
            }
        }

        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        candidates.truncate(k.max(1));

        let mut values = vec![0.0; channels];
        if candidates.is_empty() {
            for (c, v) in values.iter_mut().enumerate() {
                *v = frm.get(cx, cy, c) + residual.get(cx, cy, c);
            }
            return values;
        }

        for c in 0..channels {
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;
            for &(_, x, y, idx) in &candidates {
                let dw = self.spatial_weights[idx];
                weighted_sum += dw * (frm.get(x, y, c) + residual.get(x, y, c));
                weight_total += dw;
            }
            values[c] = if weight_total > 0.0 {
                weighted_sum / weight_total
            } else {
                frm.get(cx, cy, c) + residual.get(cx, cy, c)
            };
        }
        values
    }
}

fn require_compatible(a: &Image, b: &Image) -> Result<()> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(CoreError::size("FitFC: image sizes do not match").into());
    }
    if a.channels() != b.channels() {
        return Err(CoreError::image_type("FitFC: channel counts do not match").into());
    }
    if a.base_type() != b.base_type() {
        return Err(CoreError::image_type("FitFC: base types do not match").into());
    }
    Ok(())
}

/// Downscales the residual by `factor` with area-averaging, then upscales
/// back to the original size with bicubic interpolation (spec.md §4.3
/// step 3). Images whose dimensions are not exact multiples of `factor`
/// are edge-padded before downscaling and cropped back afterward, since
/// `starfusion_math::area_average` requires an evenly-dividing factor.
fn residual_upsample(residual: &Image, factor: u32) -> Result<Image> {
    if factor == 1 {
        return Ok(residual.clone());
    }
    let (width, height, channels) = (residual.width(), residual.height(), residual.channels());
    let padded_width = width.div_ceil(factor) * factor;
    let padded_height = height.div_ceil(factor) * factor;

    let padded = if padded_width == width && padded_height == height {
        residual.clone()
    } else {
        let mut p = Image::new(padded_width, padded_height, channels, residual.base_type())?;
        for y in 0..padded_height {
            let sy = y.min(height - 1);
            for x in 0..padded_width {
                let sx = x.min(width - 1);
                for c in 0..channels {
                    p.set(x, y, c, residual.get(sx, sy, c));
                }
            }
        }
        p
    };

    let down = area_average(&padded, factor)?;
    let up = bicubic(&down, padded_width, padded_height)?;

    if padded_width == width && padded_height == height {
        Ok(up)
    } else {
        let mut out = Image::new(width, height, channels, residual.base_type())?;
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    out.set(x, y, c, up.get(x, y, c));
                }
            }
        }
        Ok(out)
    }
}

/// Builds the `win_size x win_size` spatial distance-weight matrix used
/// by the spatial filter: `dw = 1 / (1 + 2*sqrt(dx^2+dy^2)/win_size)`,
/// the reciprocal form of STARFM's distance weight (spec.md §4.3 step 4).
fn build_spatial_weights(win_size: u32) -> Vec<f64> {
    let half = win_size as f64 / 2.0;
    let center = (win_size / 2) as i64;
    let mut out = Vec::with_capacity((win_size * win_size) as usize);
    for wy in 0..win_size {
        for wx in 0..win_size {
            let dx = wx as i64 - center;
            let dy = wy as i64 - center;
            let dist = ((dx * dx + dy * dy) as f64).sqrt();
            out.push(1.0 / (1.0 + 2.0 * dist / (2.0 * half)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use starfusion_core::pixelbase::BaseType;

    fn uniform(w: u32, h: u32, c: usize, v: f64) -> Image {
        let mut img = Image::new(w, h, c, BaseType::U16).unwrap();
        img.fill(&vec![v; c], None).unwrap();
        img
    }

    #[test]
    fn constant_images_predict_constant_output() {
        let mut images = MultiResImage::new();
        images.set("high", 1, uniform(8, 8, 1, 200.0));
        images.set("low", 1, uniform(8, 8, 1, 200.0));
        images.set("low", 2, uniform(8, 8, 1, 200.0));

        let opts = FitfcOptions {
            win_size: 5,
            number_neighbors: 5,
            resolution_factor: 1,
            pair_date: 1,
            ..FitfcOptions::default()
        };
        let fitfc = Fitfc::new(opts).unwrap();
        let out = fitfc.predict(&images, 2, None, None).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_relative_eq!(out.get(x, y, 0), 200.0, epsilon = 1e-6);
            }
        }
    }

    /// Degenerate regression (`l_1` constant ⇒ determinant 0) falls back
    /// to `a=1, b=0`, giving `h_1 + (l_t − l_1)` exactly.
    #[test]
    fn degenerate_regression_falls_back_to_identity_model() {
        let mut images = MultiResImage::new();
        images.set("high", 1, uniform(8, 8, 1, 50.0));
        images.set("low", 1, uniform(8, 8, 1, 0.0));
        images.set("low", 2, uniform(8, 8, 1, 10.0));

        let opts = FitfcOptions {
            win_size: 5,
            number_neighbors: 9,
            resolution_factor: 1,
            pair_date: 1,
            ..FitfcOptions::default()
        };
        let fitfc = Fitfc::new(opts).unwrap();
        let out = fitfc.predict(&images, 2, None, None).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_relative_eq!(out.get(x, y, 0), 60.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn missing_pair_date_is_not_found() {
        let images = MultiResImage::new();
        let opts = FitfcOptions {
            pair_date: 1,
            ..FitfcOptions::default()
        };
        let fitfc = Fitfc::new(opts).unwrap();
        assert!(fitfc.predict(&images, 2, None, None).is_err());
    }

    #[test]
    fn resolution_factor_larger_than_image_is_size_error() {
        let mut images = MultiResImage::new();
        images.set("high", 1, uniform(2, 2, 1, 1.0));
        images.set("low", 1, uniform(2, 2, 1, 1.0));
        images.set("low", 2, uniform(2, 2, 1, 1.0));

        let opts = FitfcOptions {
            pair_date: 1,
            resolution_factor: 4,
            ..FitfcOptions::default()
        };
        let fitfc = Fitfc::new(opts).unwrap();
        let err = fitfc.predict(&images, 2, None, None);
        assert!(matches!(
            err,
            Err(crate::error::Error::Core(starfusion_core::error::Error::SizeError { .. }))
        ));
    }
}
