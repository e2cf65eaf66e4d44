//! [`Staarch`]: the tasseled-cap disturbance-index driver that computes
//! a date-of-disturbance map and uses it to compose three STARFM calls,
//! spec.md §4.4.

use std::sync::Mutex;

use starfusion_core::error::Error as CoreError;
use starfusion_core::image::{mask_is_valid, Image};
use starfusion_core::multires::MultiResImage;
use starfusion_core::pixelbase::BaseType;
use starfusion_starfm::{Starfm, StarfmOptions};

use crate::changemask::{assign_clusters, build_date_features, change_mask};
use crate::dod::{assign_dod, moving_average, DiSample, NEVER_DISTURBED};
use crate::error::Result;
use crate::options::StaarchOptions;

/// The left/right dates and low-res date set a cached DoD image was
/// computed from; recomputation is skipped while this key is unchanged
/// (spec.md §6's "internal i32-per-pixel raster valid only across a
/// single prediction session").
#[derive(PartialEq, Eq, Clone)]
struct CacheKey {
    date_left: i64,
    date_right: i64,
    low_dates: Vec<i64>,
}

struct CacheEntry {
    key: CacheKey,
    width: u32,
    height: u32,
    dod: Vec<i64>,
}

/// The STAARCH driver: a per-pixel date-of-disturbance map derived from
/// a high-res pair and an interior low-res time series, used to scatter
/// three STARFM sub-predictions into one output image.
pub struct Staarch {
    options: StaarchOptions,
    cache: Mutex<Option<CacheEntry>>,
}

impl Staarch {
    /// Validates `options` and constructs a driver instance.
    pub fn new(options: StaarchOptions) -> Result<Staarch> {
        options.validate()?;
        Ok(Staarch { options, cache: Mutex::new(None) })
    }

    /// The validated options this instance predicts with.
    pub fn options(&self) -> &StaarchOptions {
        &self.options
    }

    /// Predicts the high-resolution image at `target_date`.
    pub fn predict(
        &self,
        images: &MultiResImage,
        target_date: i64,
        mask: Option<&Image>,
    ) -> Result<Image> {
        let opts = &self.options;
        tracing::debug!(
            date_left = opts.date_left,
            date_right = opts.date_right,
            target_date,
            "staarch predict"
        );

        let h_left = self.required(images, &opts.high_tag, opts.date_left)?;
        let h_right = self.required(images, &opts.high_tag, opts.date_right)?;
        let (width, height) = (h_left.width(), h_left.height());

        let low_dates: Vec<i64> = images
            .dates(&opts.low_tag)
            .into_iter()
            .filter(|d| *d >= opts.date_left && *d <= opts.date_right)
            .collect();
        let key = CacheKey { date_left: opts.date_left, date_right: opts.date_right, low_dates: low_dates.clone() };

        let dod = {
            let mut cache = self.cache.lock().unwrap();
            let hit = cache.as_ref().map(|e| e.key == key).unwrap_or(false);
            if !hit {
                let dod = self.compute_dod(images, h_left, h_right, &low_dates)?;
                *cache = Some(CacheEntry { key: key.clone(), width, height, dod });
            }
            cache.as_ref().unwrap().dod.clone()
        };

        self.predict_from_dod(images, target_date, mask, &dod, width, height)
    }

    fn required<'a>(&self, images: &'a MultiResImage, tag: &str, date: i64) -> Result<&'a Image> {
        images
            .get(tag, date)
            .ok_or_else(|| CoreError::NotFound { tag: tag.to_string(), date }.into())
    }

    /// Steps 1 and 2: the high-res change mask and the low-res DoD
    /// assignment.
    fn compute_dod(
        &self,
        images: &MultiResImage,
        h_left: &Image,
        h_right: &Image,
        low_dates: &[i64],
    ) -> Result<Vec<i64>> {
        let opts = &self.options;
        let order = opts.source_channel_order.as_deref();

        let mask_left = opts.mask_tag.as_ref().and_then(|t| images.get(t, opts.date_left));
        let mask_right = opts.mask_tag.as_ref().and_then(|t| images.get(t, opts.date_right));

        let cluster_mask = if opts.standardize_with_shared_mask {
            union_mask(mask_left, mask_right, h_left.width(), h_left.height())?
        } else {
            None
        };
        let cluster_mask_ref = cluster_mask.as_ref().or(mask_left);

        let (clusters, num_clusters) =
            assign_clusters(h_left, opts.high_res_sensor, order, cluster_mask_ref, opts)?;

        let left_mask_used = if opts.standardize_with_shared_mask { cluster_mask.as_ref() } else { mask_left };
        let right_mask_used = if opts.standardize_with_shared_mask { cluster_mask.as_ref() } else { mask_right };

        let left_features =
            build_date_features(h_left, opts.high_res_sensor, order, left_mask_used, &clusters, num_clusters)?;
        let right_features =
            build_date_features(h_right, opts.high_res_sensor, order, right_mask_used, &clusters, num_clusters)?;

        let change_mask_image = change_mask(&left_features, &right_features, opts)?;
        let (width, height) = (h_left.width(), h_left.height());
        let mut change_mask_bools = vec![false; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                change_mask_bools[(y * width + x) as usize] = change_mask_image.get(x, y, 0) != 0.0;
            }
        }

        let build_one = |&date: &i64| -> Result<DiSample> {
            let low_image = self.required(images, &opts.low_tag, date)?;
            let low_mask = opts.mask_tag.as_ref().and_then(|t| images.get(t, date));
            let (low_clusters, low_k) =
                assign_clusters(low_image, opts.low_res_sensor, order, low_mask, opts)?;
            let features =
                build_date_features(low_image, opts.low_res_sensor, order, low_mask, &low_clusters, low_k)?;
            Ok(DiSample { date, di: features.di, valid: features.valid })
        };

        // Each date's standardized DI is independent of every other date's
        // (spec.md §9's per-image standardization choice), so this is a
        // plain data-parallel map over dates.
        #[cfg(feature = "parallel")]
        let series: Vec<DiSample> = {
            use rayon::prelude::*;
            low_dates
                .par_iter()
                .map(build_one)
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let series: Vec<DiSample> = low_dates
            .iter()
            .map(build_one)
            .collect::<Result<Vec<_>>>()?;

        let smoothed = moving_average(&series, opts.number_images_for_averaging, opts.di_moving_average_window);
        Ok(assign_dod(&series, &smoothed, &change_mask_bools, opts.low_res_di_ratio))
    }

    /// Step 3: three STARFM sub-calls scattered back into one output
    /// image by the DoD-partitioned prediction masks.
    fn predict_from_dod(
        &self,
        images: &MultiResImage,
        target_date: i64,
        mask: Option<&Image>,
        dod: &[i64],
        width: u32,
        height: u32,
    ) -> Result<Image> {
        let opts = &self.options;

        let never_disturbed = mask_from(dod, width, height, |d| d == NEVER_DISTURBED)?;
        let disturbed_after_target = mask_from(dod, width, height, |d| d != NEVER_DISTURBED && d > target_date)?;
        let disturbed_before_or_eq = mask_from(dod, width, height, |d| d != NEVER_DISTURBED && d <= target_date)?;

        let double_pair = Starfm::new(StarfmOptions {
            high_tag: opts.high_tag.clone(),
            low_tag: opts.low_tag.clone(),
            date_1: opts.date_left,
            date_3: Some(opts.date_right),
            prediction_area: opts.prediction_area,
            ..opts.starfm_options.clone()
        })?;
        let from_left = Starfm::new(StarfmOptions {
            high_tag: opts.high_tag.clone(),
            low_tag: opts.low_tag.clone(),
            date_1: opts.date_left,
            date_3: None,
            prediction_area: opts.prediction_area,
            ..opts.starfm_options.clone()
        })?;
        let from_right = Starfm::new(StarfmOptions {
            high_tag: opts.high_tag.clone(),
            low_tag: opts.low_tag.clone(),
            date_1: opts.date_right,
            date_3: None,
            prediction_area: opts.prediction_area,
            ..opts.starfm_options.clone()
        })?;

        let part1 = double_pair.predict(images, target_date, mask, Some(&never_disturbed))?;
        let part2 = from_left.predict(images, target_date, mask, Some(&disturbed_after_target))?;
        let part3 = from_right.predict(images, target_date, mask, Some(&disturbed_before_or_eq))?;

        let channels = part1.channels();
        let mut out = Image::new(width, height, channels, part1.base_type())?;
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    let v = part1.get(x, y, c) + part2.get(x, y, c) + part3.get(x, y, c);
                    out.set(x, y, c, v);
                }
            }
        }
        Ok(out)
    }
}

fn mask_from(dod: &[i64], width: u32, height: u32, predicate: impl Fn(i64) -> bool) -> Result<Image> {
    let mut mask = Image::new(width, height, 1, BaseType::U8)?;
    for y in 0..height {
        for x in 0..width {
            let v = dod[(y * width + x) as usize];
            mask.set(x, y, 0, if predicate(v) { 255.0 } else { 0.0 });
        }
    }
    Ok(mask)
}

/// Pixelwise OR of two optional validity masks, used for
/// `standardize_with_shared_mask`. `None` for both inputs returns `None`
/// (no restriction at all, rather than an all-invalid mask).
fn union_mask(a: Option<&Image>, b: Option<&Image>, width: u32, height: u32) -> Result<Option<Image>> {
    let (a, b) = match (a, b) {
        (None, None) => return Ok(None),
        (Some(a), None) => return Ok(Some(a.clone())),
        (None, Some(b)) => return Ok(Some(b.clone())),
        (Some(a), Some(b)) => (a, b),
    };
    let mut out = Image::new(width, height, 1, BaseType::U8)?;
    for y in 0..height {
        for x in 0..width {
            let valid = mask_is_valid(a, x, y, 0) || mask_is_valid(b, x, y, 0);
            out.set(x, y, 0, if valid { 255.0 } else { 0.0 });
        }
    }
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_mask_of_none_is_none() {
        let result = union_mask(None, None, 4, 4).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn union_mask_combines_either_valid() {
        let mut a = Image::new(2, 2, 1, BaseType::U8).unwrap();
        a.set(0, 0, 0, 255.0);
        let mut b = Image::new(2, 2, 1, BaseType::U8).unwrap();
        b.set(1, 1, 0, 255.0);
        let combined = union_mask(Some(&a), Some(&b), 2, 2).unwrap().unwrap();
        assert_eq!(combined.get(0, 0, 0), 255.0);
        assert_eq!(combined.get(1, 1, 0), 255.0);
        assert_eq!(combined.get(0, 1, 0), 0.0);
    }
}
