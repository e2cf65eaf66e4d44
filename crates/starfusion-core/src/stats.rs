//! Whole-image statistics: extrema with location, mean, mean/stddev, and
//! value histograms.
//!
//! Each function accumulates per-channel min/max/sum/sum2 in a single
//! pass, honors an optional mask with the standard channel-broadcast
//! rule, and reports pixel locations for the extrema rather than only
//! the values.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::image::{mask_is_valid, Image};

/// Per-channel minimum and maximum, each with the `(x, y)` location of
/// its first occurrence in raster scan order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxLocation {
    /// Minimum value.
    pub min: f64,
    /// Location of the minimum.
    pub min_at: (u32, u32),
    /// Maximum value.
    pub max: f64,
    /// Location of the maximum.
    pub max_at: (u32, u32),
}

/// Per-channel mean and (sample or population) standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanStdDev {
    /// Arithmetic mean.
    pub mean: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// Count of pixels that contributed.
    pub count: u64,
}

fn masked_values<'a>(
    image: &'a Image,
    channel: usize,
    mask: Option<&'a Image>,
) -> impl Iterator<Item = (u32, u32, f64)> + 'a {
    (0..image.height()).flat_map(move |y| {
        (0..image.width()).filter_map(move |x| {
            if mask.map(|m| mask_is_valid(m, x, y, channel)).unwrap_or(true) {
                Some((x, y, image.get(x, y, channel)))
            } else {
                None
            }
        })
    })
}

/// Per-channel min/max with location, honoring `mask` if given.
pub fn min_max_locations(image: &Image, mask: Option<&Image>) -> Result<Vec<MinMaxLocation>> {
    let mut out = Vec::with_capacity(image.channels());
    for c in 0..image.channels() {
        let mut iter = masked_values(image, c, mask);
        let first = iter.next().ok_or_else(|| Error::invalid_argument("no valid pixels under mask"))?;
        let mut result = MinMaxLocation {
            min: first.2,
            min_at: (first.0, first.1),
            max: first.2,
            max_at: (first.0, first.1),
        };
        for (x, y, v) in iter {
            if v < result.min {
                result.min = v;
                result.min_at = (x, y);
            }
            if v > result.max {
                result.max = v;
                result.max_at = (x, y);
            }
        }
        out.push(result);
    }
    Ok(out)
}

/// Per-channel arithmetic mean, honoring `mask` if given.
pub fn mean(image: &Image, mask: Option<&Image>) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(image.channels());
    for c in 0..image.channels() {
        let mut sum = 0.0;
        let mut count = 0u64;
        for (_, _, v) in masked_values(image, c, mask) {
            sum += v;
            count += 1;
        }
        if count == 0 {
            return Err(Error::invalid_argument("no valid pixels under mask"));
        }
        out.push(sum / count as f64);
    }
    Ok(out)
}

/// Per-channel mean and standard deviation, honoring `mask` if given.
///
/// When `sample_correction` is `true` and `n > 1`, the population standard
/// deviation is scaled by `sqrt(n / (n - 1))` (Bessel's correction).
pub fn mean_std_dev(image: &Image, mask: Option<&Image>, sample_correction: bool) -> Result<Vec<MeanStdDev>> {
    let mut out = Vec::with_capacity(image.channels());
    for c in 0..image.channels() {
        let mut sum = 0.0;
        let mut sum2 = 0.0;
        let mut count = 0u64;
        for (_, _, v) in masked_values(image, c, mask) {
            sum += v;
            sum2 += v * v;
            count += 1;
        }
        if count == 0 {
            return Err(Error::invalid_argument("no valid pixels under mask"));
        }
        let n = count as f64;
        let m = sum / n;
        let variance = (sum2 / n - m * m).max(0.0);
        let mut std_dev = variance.sqrt();
        if sample_correction && count > 1 {
            std_dev *= (n / (n - 1.0)).sqrt();
        }
        out.push(MeanStdDev { mean: m, std_dev, count });
    }
    Ok(out)
}

/// Per-channel sorted set of distinct values present, honoring `mask` if
/// given.
pub fn unique(image: &Image, mask: Option<&Image>) -> Result<Vec<Vec<f64>>> {
    let with_count = unique_with_count(image, mask)?;
    Ok(with_count
        .into_iter()
        .map(|channel| channel.into_iter().map(|(v, _)| v).collect())
        .collect())
}

/// Per-channel sorted `(value, count)` pairs, honoring `mask` if given.
///
/// Values are bucketed by bit pattern (`to_bits` for `f64`, so `-0.0` and
/// `0.0` are distinct buckets, and `NaN` buckets by representation rather
/// than comparing equal to itself).
pub fn unique_with_count(image: &Image, mask: Option<&Image>) -> Result<Vec<Vec<(f64, u64)>>> {
    let mut out = Vec::with_capacity(image.channels());
    for c in 0..image.channels() {
        let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
        for (_, _, v) in masked_values(image, c, mask) {
            *counts.entry(v.to_bits()).or_insert(0) += 1;
        }
        out.push(counts.into_iter().map(|(bits, n)| (f64::from_bits(bits), n)).collect());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixelbase::BaseType;
    use approx::assert_relative_eq;

    fn ramp(w: u32, h: u32) -> Image {
        let mut img = Image::new(w, h, 1, BaseType::U8).unwrap();
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, 0, (y * w + x) as f64);
            }
        }
        img
    }

    #[test]
    fn min_max_locations_finds_corners() {
        let img = ramp(4, 4);
        let stats = min_max_locations(&img, None).unwrap();
        assert_eq!(stats[0].min, 0.0);
        assert_eq!(stats[0].min_at, (0, 0));
        assert_eq!(stats[0].max, 15.0);
        assert_eq!(stats[0].max_at, (3, 3));
    }

    #[test]
    fn mean_of_uniform_image_is_the_value() {
        let mut img = Image::new(3, 3, 1, BaseType::U8).unwrap();
        img.fill(&[42.0], None).unwrap();
        let m = mean(&img, None).unwrap();
        assert_relative_eq!(m[0], 42.0);
    }

    #[test]
    fn sample_correction_scales_population_std_dev() {
        let mut img = Image::new(2, 1, 1, BaseType::U8).unwrap();
        img.set(0, 0, 0, 0.0);
        img.set(1, 0, 0, 10.0);
        let pop = mean_std_dev(&img, None, false).unwrap();
        let sample = mean_std_dev(&img, None, true).unwrap();
        assert_relative_eq!(sample[0].std_dev, pop[0].std_dev * (2.0f64 / 1.0).sqrt());
    }

    #[test]
    fn unique_with_count_counts_each_distinct_value() {
        let mut img = Image::new(4, 1, 1, BaseType::U8).unwrap();
        img.set(0, 0, 0, 1.0);
        img.set(1, 0, 0, 1.0);
        img.set(2, 0, 0, 2.0);
        img.set(3, 0, 0, 3.0);
        let uc = unique_with_count(&img, None).unwrap();
        assert_eq!(uc[0], vec![(1.0, 2), (2.0, 1), (3.0, 1)]);
    }

    #[test]
    fn mask_restricts_statistics_to_valid_pixels() {
        let img = ramp(2, 2);
        let mut mask = Image::new(2, 2, 1, BaseType::U8).unwrap();
        mask.set(0, 0, 0, 255.0);
        let m = mean(&img, Some(&mask)).unwrap();
        assert_relative_eq!(m[0], 0.0);
    }
}
