//! [`Starfm`]: the moving-window weighted-voting fusor, spec.md §4.2.

use starfusion_core::error::Error as CoreError;
use starfusion_core::image::{mask_is_valid, Image};
use starfusion_core::multires::MultiResImage;
use starfusion_core::pixelbase::BaseType;
use starfusion_core::rect::Rect;
use starfusion_core::stats::mean_std_dev;

use crate::error::Result;
use crate::options::{StarfmOptions, TempDiffWeighting};

/// One pair date's precomputed spectral/temporal diffs and local
/// prediction, shared by every output pixel's candidate search.
struct PairData {
    h: Image,
    ds: Image,
    dt: Image,
    lv: Image,
    tol: Vec<f64>,
}

/// The STARFM fusor: a moving-window weighted-voting predictor built
/// from one or two high/low pair dates.
///
/// A `Starfm` instance is cheap to construct and holds no reference to a
/// [`MultiResImage`] between calls — the caller passes one to each
/// [`Starfm::predict`] call, matching spec.md §3's "fusors hold a
/// non-owning reference" ownership rule. The `win_size`-dependent
/// distance-weight matrix is cached on the instance so that repeated
/// calls with an unchanged `win_size` (as STAARCH's three-call
/// composition does, spec.md §9) don't recompute it.
pub struct Starfm {
    options: StarfmOptions,
    distance_weights: Vec<f64>,
}

impl Starfm {
    /// Validates `options` (spec.md's `processOptions`) and constructs a
    /// fusor instance.
    pub fn new(options: StarfmOptions) -> Result<Starfm> {
        options.validate()?;
        let distance_weights = build_distance_weights(options.win_size);
        Ok(Starfm { options, distance_weights })
    }

    /// The validated options this instance predicts with.
    pub fn options(&self) -> &StarfmOptions {
        &self.options
    }

    /// Predicts the high-resolution image at `target_date`.
    ///
    /// `mask` gates which pixels are valid inputs (used both for the
    /// per-channel σ used to build the same-class tolerance, and for
    /// candidate acceptance inside the moving window); `predict_mask`
    /// additionally restricts which output pixels are computed at all —
    /// STAARCH uses this to scatter disjoint DoD-partitioned
    /// sub-predictions back into one output image (spec.md §4.4 step 3).
    /// Both default to "every pixel valid" when `None`.
    pub fn predict(
        &self,
        images: &MultiResImage,
        target_date: i64,
        mask: Option<&Image>,
        predict_mask: Option<&Image>,
    ) -> Result<Image> {
        let opts = &self.options;
        tracing::debug!(
            win_size = opts.win_size,
            double_pair = opts.is_double_pair(),
            target_date,
            "starfm predict"
        );

        let h1 = self.required(images, &opts.high_tag, opts.date_1)?;
        let l1 = self.required(images, &opts.low_tag, opts.date_1)?;
        let lt = self.required(images, &opts.low_tag, target_date)?;
        require_compatible(h1, l1)?;
        require_compatible(h1, lt)?;

        let pair3 = match opts.date_3 {
            Some(date_3) => {
                let h3 = self.required(images, &opts.high_tag, date_3)?;
                let l3 = self.required(images, &opts.low_tag, date_3)?;
                require_compatible(h1, h3)?;
                require_compatible(h1, l3)?;
                Some((h3, l3))
            }
            None => None,
        };

        let (width, height, channels) = (h1.width(), h1.height(), h1.channels());
        if let Some(m) = mask {
            if m.width() != width || m.height() != height {
                return Err(CoreError::size("STARFM: mask size does not match image size").into());
            }
        }
        if let Some(pm) = predict_mask {
            if pm.width() != width || pm.height() != height {
                return Err(CoreError::size("STARFM: predict_mask size does not match image size").into());
            }
        }

        let predict_area = opts.prediction_area.or_full(width, height);
        let half = opts.win_size / 2;
        let sample_area = predict_area.dilate_clipped(half, width, height);
        let _ = sample_area; // bounds every candidate lookup below via clamping

        let pair1 = self.build_pair_data(h1, l1, lt, mask)?;
        let pair3_data = match pair3 {
            Some((h3, l3)) => Some(self.build_pair_data(h3, l3, lt, mask)?),
            None => None,
        };

        let sigma_t = opts.temporal_uncertainty;
        let sigma_s = opts.spectral_uncertainty;
        let sigma_dt = sigma_t * 2.0f64.sqrt();
        let sigma_ds = (sigma_t * sigma_t + sigma_s * sigma_s).sqrt();
        let sigma_comb = (sigma_dt * sigma_dt + sigma_ds * sigma_ds).sqrt();

        let mut out = Image::new(width, height, channels, h1.base_type())?;

        let compute_row = |y: u32| -> Vec<(u32, usize, f64)> {
            let mut row = Vec::new();
            for x in predict_area.x..predict_area.right() {
                if let Some(pm) = predict_mask {
                    if !(0..channels).any(|c| mask_is_valid(pm, x, y, c)) {
                        continue;
                    }
                }
                for c in 0..channels {
                    if let Some(pm) = predict_mask {
                        if !mask_is_valid(pm, x, y, c) {
                            continue;
                        }
                    }
                    let value = self.predict_pixel(
                        x,
                        y,
                        c,
                        width,
                        height,
                        half,
                        &pair1,
                        pair3_data.as_ref(),
                        mask,
                        sigma_dt,
                        sigma_ds,
                        sigma_comb,
                    );
                    row.push((x, c, value));
                }
            }
            row
        };

        let rows: Vec<(u32, Vec<(u32, usize, f64)>)> = {
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
                (predict_area.y..predict_area.bottom()).map(|y| (y, compute_row(y))).collect()
            }
        };

        for (y, row) in rows {
            for (x, c, value) in row {
                out.set(x, y, c, value);
            }
        }

        Ok(out)
    }

    fn required<'a>(&self, images: &'a MultiResImage, tag: &str, date: i64) -> Result<&'a Image> {
        images
            .get(tag, date)
            .ok_or_else(|| CoreError::NotFound { tag: tag.to_string(), date }.into())
    }

    fn build_pair_data(&self, h: &Image, l: &Image, lt: &Image, mask: Option<&Image>) -> Result<PairData> {
        let ds = h.absdiff(l)?;
        let dt = l.absdiff(lt)?;
        let lv = local_prediction(h, l, lt)?;

        let stats = mean_std_dev(h, mask, false)?;
        let tol: Vec<f64> = stats
            .iter()
            .map(|s| 2.0 * s.std_dev / self.options.number_classes as f64)
            .collect();

        Ok(PairData { h: h.clone(), ds, dt, lv, tol })
    }

    #[allow(clippy::too_many_arguments)]
    fn predict_pixel(
        &self,
        cx: u32,
        cy: u32,
        c: usize,
        width: u32,
        height: u32,
        half: u32,
        pair1: &PairData,
        pair3: Option<&PairData>,
        mask: Option<&Image>,
        sigma_dt: f64,
        sigma_ds: f64,
        sigma_comb: f64,
    ) -> f64 {
        let opts = &self.options;

        if opts.do_copy_on_zero_diff {
            if let Some(shortcut) = self.zero_diff_shortcut(cx, cy, c, pair1, pair3) {
                return shortcut;
            }
        }

        let pairs: Vec<&PairData> = std::iter::once(pair1).chain(pair3).collect();
        let double_pair = pairs.len() == 2;

        let dt_center = pairs
            .iter()
            .map(|p| p.dt.get(cx, cy, c) + sigma_dt)
            .fold(f64::INFINITY, f64::min);
        let ds_center = pairs
            .iter()
            .map(|p| p.ds.get(cx, cy, c) + sigma_ds)
            .fold(f64::INFINITY, f64::min);

        let weight_dt_disabled = matches!(opts.use_temp_diff_for_weights, TempDiffWeighting::Disable)
            || (matches!(opts.use_temp_diff_for_weights, TempDiffWeighting::OnDoublePair) && !double_pair);

        let win_size = opts.win_size;
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for (pi, pair) in pairs.iter().enumerate() {
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
                        if !mask_is_valid(m, x, y, c) {
                            continue;
                        }
                    }

                    let same_class = (pair.h.get(cx, cy, c) - pair.h.get(x, y, c)).abs() < pair.tol[c];
                    if !same_class {
                        continue;
                    }

                    let dt = pair.dt.get(x, y, c);
                    let ds = pair.ds.get(x, y, c);
                    let passes = if opts.use_strict_filtering {
                        dt < dt_center && ds < ds_center
                    } else {
                        dt < dt_center || ds < ds_center
                    };
                    if !passes {
                        continue;
                    }

                    let dt_for_weight = if weight_dt_disabled { 0.0 } else { dt };
                    let dw = self.distance_weights[(wy * win_size + wx) as usize];
                    let weight = if opts.log_scale_factor > 0.0 {
                        let k = opts.log_scale_factor;
                        1.0 / ((2.0 + dt_for_weight * k).ln() * (2.0 + ds * k).ln() * dw)
                    } else if (1.0 + dt_for_weight) * (1.0 + ds) < sigma_comb {
                        1.0
                    } else {
                        1.0 / (dw * (1.0 + dt_for_weight) * (1.0 + ds))
                    };

                    weighted_sum += weight * pair.lv.get(x, y, c);
                    weight_total += weight;
                    let _ = pi;
                }
            }
        }

        if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            let center_sum: f64 = pairs.iter().map(|p| p.lv.get(cx, cy, c)).sum();
            center_sum / pairs.len() as f64
        }
    }

    fn zero_diff_shortcut(&self, x: u32, y: u32, c: usize, pair1: &PairData, pair3: Option<&PairData>) -> Option<f64> {
        match pair3 {
            None => {
                if pair1.ds.get(x, y, c) == 0.0 {
                    Some(pair1.lv.get(x, y, c))
                } else if pair1.dt.get(x, y, c) == 0.0 {
                    Some(pair1.h.get(x, y, c))
                } else {
                    None
                }
            }
            Some(pair3) => {
                if pair1.ds.get(x, y, c) == 0.0 && pair3.ds.get(x, y, c) == 0.0 {
                    Some((pair1.lv.get(x, y, c) + pair3.lv.get(x, y, c)) / 2.0)
                } else if pair1.dt.get(x, y, c) == 0.0 && pair3.dt.get(x, y, c) == 0.0 {
                    Some((pair1.h.get(x, y, c) + pair3.h.get(x, y, c)) / 2.0)
                } else if pair1.ds.get(x, y, c) == 0.0 {
                    Some(pair1.lv.get(x, y, c))
                } else if pair3.ds.get(x, y, c) == 0.0 {
                    Some(pair3.lv.get(x, y, c))
                } else if pair1.dt.get(x, y, c) == 0.0 {
                    Some(pair1.h.get(x, y, c))
                } else if pair3.dt.get(x, y, c) == 0.0 {
                    Some(pair3.h.get(x, y, c))
                } else {
                    None
                }
            }
        }
    }
}

fn local_prediction(h: &Image, l: &Image, lt: &Image) -> Result<Image> {
    let mut out = Image::new(h.width(), h.height(), h.channels(), h.base_type())?;
    for y in 0..h.height() {
        for x in 0..h.width() {
            for c in 0..h.channels() {
                let v = h.get(x, y, c) + (lt.get(x, y, c) - l.get(x, y, c));
                out.set(x, y, c, v);
            }
        }
    }
    Ok(out)
}

fn require_compatible(a: &Image, b: &Image) -> Result<()> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(CoreError::size("STARFM: image sizes do not match").into());
    }
    if a.channels() != b.channels() {
        return Err(CoreError::image_type("STARFM: channel counts do not match").into());
    }
    if a.base_type() != b.base_type() {
        return Err(CoreError::image_type("STARFM: base types do not match").into());
    }
    Ok(())
}

/// Builds the `win_size x win_size` distance-weight matrix, `dw(x,y) = 1
/// + 2*sqrt(x^2+y^2)/win_size`, with `(x,y)` measured from the window
/// center (spec.md §4.2 step 2).
fn build_distance_weights(win_size: u32) -> Vec<f64> {
    let half = win_size as f64 / 2.0;
    let center = (win_size / 2) as i64;
    let mut out = Vec::with_capacity((win_size * win_size) as usize);
    for wy in 0..win_size {
        for wx in 0..win_size {
            let dx = wx as i64 - center;
            let dy = wy as i64 - center;
            let dist = ((dx * dx + dy * dy) as f64).sqrt();
            out.push(1.0 + 2.0 * dist / (2.0 * half));
        }
    }
    out
}

/// Convenience: the base-type check [`Starfm`] applies to input images
/// also applies to masks, which carry base [`BaseType::U8`] by
/// convention (see `starfusion_core::image::mask_is_valid`).
pub fn expected_mask_base() -> BaseType {
    BaseType::U8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use starfusion_core::multires::MultiResImage;

    fn uniform(w: u32, h: u32, c: usize, v: f64) -> Image {
        let mut img = Image::new(w, h, c, BaseType::U8).unwrap();
        img.fill(&vec![v; c], None).unwrap();
        img
    }

    #[test]
    fn single_pair_identity_copies_through() {
        let mut images = MultiResImage::new();
        images.set("high", 1, uniform(10, 10, 1, 100.0));
        images.set("low", 1, uniform(10, 10, 1, 100.0));
        images.set("low", 2, uniform(10, 10, 1, 100.0));

        let opts = StarfmOptions {
            win_size: 5,
            number_classes: 4,
            do_copy_on_zero_diff: true,
            date_1: 1,
            ..StarfmOptions::default()
        };
        let starfm = Starfm::new(opts).unwrap();
        let out = starfm.predict(&images, 2, None, None).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                assert_relative_eq!(out.get(x, y, 0), 100.0);
            }
        }
    }

    #[test]
    fn double_pair_center_copy_averages_to_same_value() {
        let mut images = MultiResImage::new();
        images.set("high", 1, uniform(6, 6, 1, 50.0));
        images.set("low", 1, uniform(6, 6, 1, 50.0));
        images.set("high", 3, uniform(6, 6, 1, 150.0));
        images.set("low", 3, uniform(6, 6, 1, 150.0));
        images.set("low", 2, uniform(6, 6, 1, 100.0));

        let opts = StarfmOptions {
            win_size: 3,
            number_classes: 4,
            date_1: 1,
            date_3: Some(3),
            do_copy_on_zero_diff: false,
            ..StarfmOptions::default()
        };
        let starfm = Starfm::new(opts).unwrap();
        let out = starfm.predict(&images, 2, None, None).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                assert_relative_eq!(out.get(x, y, 0), 100.0, epsilon = 1.0);
            }
        }
    }

    #[test]
    fn missing_pair_date_is_not_found() {
        let images = MultiResImage::new();
        let opts = StarfmOptions {
            date_1: 1,
            ..StarfmOptions::default()
        };
        let starfm = Starfm::new(opts).unwrap();
        let err = starfm.predict(&images, 2, None, None);
        assert!(err.is_err());
    }
}
