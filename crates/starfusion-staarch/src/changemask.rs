//! Step 1 of the STAARCH algorithm: the high-resolution-side change mask
//! (spec.md §4.4 step 1).

use starfusion_color::tasseled_cap::{tasseled_cap, Sensor, TasseledCapInput};
use starfusion_core::image::{mask_is_valid, Image};
use starfusion_core::pixelbase::BaseType;
use starfusion_core::range::IntervalSet;

use crate::cluster::{kmeans, INVALID_CLUSTER};
use crate::error::Result;
use crate::options::{NeighborShape, StaarchOptions};

/// `(brightness, greenness, wetness)` standardized per land class, plus
/// the derived disturbance index `DI = brightness - greenness - wetness`
/// and NDVI, all at full image extent.
pub struct DateFeatures {
    pub brightness: Vec<f64>,
    pub greenness: Vec<f64>,
    pub wetness: Vec<f64>,
    pub ndvi: Vec<f64>,
    pub di: Vec<f64>,
    pub valid: Vec<bool>,
    width: u32,
    height: u32,
}

impl DateFeatures {
    fn idx(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get_di(&self, x: u32, y: u32) -> f64 {
        self.di[self.idx(x, y)]
    }

    pub fn is_valid(&self, x: u32, y: u32) -> bool {
        self.valid[self.idx(x, y)]
    }
}

/// Extracts a pixel's bands in sensor-canonical order, applying
/// `source_channel_order` if given.
fn bands_at(image: &Image, x: u32, y: u32, order: Option<&[usize]>) -> Vec<f64> {
    match order {
        Some(order) => order.iter().map(|&c| image.get(x, y, c)).collect(),
        None => (0..image.channels()).map(|c| image.get(x, y, c)).collect(),
    }
}

/// Red/NIR band indices (in the sensor's canonical tasseled-cap band
/// order) used for NDVI.
fn ndvi_bands(sensor: Sensor) -> (usize, usize) {
    match sensor {
        Sensor::Landsat => (2, 3),
        Sensor::Modis => (0, 1),
    }
}

/// Computes raw (un-standardized) brightness/greenness/wetness/NDVI for
/// every pixel of `image`, gated by `mask`.
fn raw_tc_features(
    image: &Image,
    sensor: Sensor,
    order: Option<&[usize]>,
    mask: Option<&Image>,
) -> Result<(Vec<[f64; 3]>, Vec<f64>, Vec<bool>)> {
    let (width, height) = (image.width(), image.height());
    let mut tc = Vec::with_capacity(width as usize * height as usize);
    let mut ndvi = Vec::with_capacity(tc.capacity());
    let mut valid = Vec::with_capacity(tc.capacity());
    let (red_idx, nir_idx) = ndvi_bands(sensor);

    for y in 0..height {
        for x in 0..width {
            let bands = bands_at(image, x, y, order);
            let out = tasseled_cap(sensor, TasseledCapInput::Reflectance, &bands)?;
            tc.push(out);
            ndvi.push(starfusion_color::index::ndi(bands[nir_idx], bands[red_idx]));
            valid.push(mask.map_or(true, |m| mask_is_valid(m, x, y, 0)));
        }
    }
    Ok((tc, ndvi, valid))
}

/// Standardizes one channel of `raw` per cluster: subtract the cluster's
/// mean, divide by its standard deviation (`0` maps to `1`, leaving the
/// centered value unscaled).
fn standardize_channel(raw: &[f64], clusters: &[usize], num_clusters: usize) -> Vec<f64> {
    let mut sum = vec![0.0; num_clusters];
    let mut sum2 = vec![0.0; num_clusters];
    let mut count = vec![0u64; num_clusters];
    for (i, &v) in raw.iter().enumerate() {
        let c = clusters[i];
        if c == INVALID_CLUSTER {
            continue;
        }
        sum[c] += v;
        sum2[c] += v * v;
        count[c] += 1;
    }
    let mut mean = vec![0.0; num_clusters];
    let mut std_dev = vec![1.0; num_clusters];
    for c in 0..num_clusters {
        if count[c] == 0 {
            continue;
        }
        let n = count[c] as f64;
        mean[c] = sum[c] / n;
        let variance = (sum2[c] / n - mean[c] * mean[c]).max(0.0);
        let sd = variance.sqrt();
        std_dev[c] = if sd > 0.0 { sd } else { 1.0 };
    }
    raw.iter()
        .enumerate()
        .map(|(i, &v)| {
            let c = clusters[i];
            if c == INVALID_CLUSTER {
                0.0
            } else {
                (v - mean[c]) / std_dev[c]
            }
        })
        .collect()
}

/// Builds standardized per-date features. `clusters` assigns every pixel
/// of `image` to a land class (or [`INVALID_CLUSTER`]).
pub fn build_date_features(
    image: &Image,
    sensor: Sensor,
    order: Option<&[usize]>,
    mask: Option<&Image>,
    clusters: &[usize],
    num_clusters: usize,
) -> Result<DateFeatures> {
    let (width, height) = (image.width(), image.height());
    let (tc, ndvi, valid) = raw_tc_features(image, sensor, order, mask)?;
    let brightness_raw: Vec<f64> = tc.iter().map(|t| t[0]).collect();
    let greenness_raw: Vec<f64> = tc.iter().map(|t| t[1]).collect();
    let wetness_raw: Vec<f64> = tc.iter().map(|t| t[2]).collect();

    let brightness = standardize_channel(&brightness_raw, clusters, num_clusters);
    let greenness = standardize_channel(&greenness_raw, clusters, num_clusters);
    let wetness = standardize_channel(&wetness_raw, clusters, num_clusters);
    let di: Vec<f64> = brightness
        .iter()
        .zip(&greenness)
        .zip(&wetness)
        .map(|((b, g), w)| b - g - w)
        .collect();

    Ok(DateFeatures { brightness, greenness, wetness, ndvi, di, valid, width, height })
}

/// Land-class assignment for every pixel of `image`: the explicit
/// `cluster_image` if given, else a fresh k-means++ clustering of its
/// tasseled-cap feature vectors.
pub fn assign_clusters(
    image: &Image,
    sensor: Sensor,
    order: Option<&[usize]>,
    mask: Option<&Image>,
    opts: &StaarchOptions,
) -> Result<(Vec<usize>, usize)> {
    if let Some(explicit) = &opts.cluster_image {
        let mut clusters = Vec::with_capacity((image.width() * image.height()) as usize);
        let mut max_cluster = 0usize;
        for y in 0..image.height() {
            for x in 0..image.width() {
                let v = explicit.get(x, y, 0);
                if mask.map_or(true, |m| mask_is_valid(m, x, y, 0)) {
                    let c = v.round().max(0.0) as usize;
                    max_cluster = max_cluster.max(c);
                    clusters.push(c);
                } else {
                    clusters.push(INVALID_CLUSTER);
                }
            }
        }
        return Ok((clusters, max_cluster + 1));
    }

    let (tc, _, valid) = raw_tc_features(image, sensor, order, mask)?;
    let k = opts.number_land_classes.max(1) as usize;
    let clusters = kmeans(&tc, &valid, k);
    Ok((clusters, k))
}

/// Step 1e-g: per-date disturbance acceptance — the center plus at least
/// one matching neighbor satisfies `high_res_di_range`, and the center
/// also satisfies the NDVI/brightness/greenness/wetness gates.
fn disturbed(features: &DateFeatures, opts: &StaarchOptions) -> Vec<bool> {
    let (width, height) = (features.width, features.height);
    let mut out = vec![false; (width * height) as usize];
    let offsets = opts.neighbor_shape.offsets();

    for y in 0..height {
        for x in 0..width {
            let idx = features.idx(x, y);
            if !features.is_valid(x, y) {
                continue;
            }
            if !in_range(&opts.high_res_di_range, features.get_di(x, y)) {
                continue;
            }
            let mut score = 10;
            for &(dx, dy) in offsets {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                if features.is_valid(nx, ny) && in_range(&opts.high_res_di_range, features.get_di(nx, ny)) {
                    score += 1;
                }
            }
            if score <= 10 {
                continue;
            }
            if !in_range(&opts.ndvi_range, features.ndvi[idx]) {
                continue;
            }
            if !in_range(&opts.brightness_range, features.brightness[idx]) {
                continue;
            }
            if !in_range(&opts.greeness_range, features.greenness[idx]) {
                continue;
            }
            if !in_range(&opts.wetness_range, features.wetness[idx]) {
                continue;
            }
            out[idx] = true;
        }
    }
    out
}

fn in_range(ranges: &IntervalSet, v: f64) -> bool {
    ranges.intervals().is_empty() || ranges.contains(v)
}

/// Builds the change mask: `¬disturbed_L ∧ disturbed_R`.
pub fn change_mask(left: &DateFeatures, right: &DateFeatures, opts: &StaarchOptions) -> Result<Image> {
    let (width, height) = (left.width, left.height);
    let disturbed_l = disturbed(left, opts);
    let disturbed_r = disturbed(right, opts);

    let mut out = Image::new(width, height, 1, BaseType::U8)?;
    for y in 0..height {
        for x in 0..width {
            let idx = left.idx(x, y);
            let changed = !disturbed_l[idx] && disturbed_r[idx];
            out.set(x, y, 0, if changed { 255.0 } else { 0.0 });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_ranges_accept_everything_in_range_check() {
        let ranges = IntervalSet::new();
        assert!(in_range(&ranges, 12345.0));
    }

    #[test]
    fn four_neighbor_offsets_exclude_diagonals() {
        let offsets = NeighborShape::Four.offsets();
        assert_eq!(offsets.len(), 4);
        assert!(!offsets.contains(&(1, 1)));
    }

    #[test]
    fn eight_neighbor_offsets_include_diagonals() {
        let offsets = NeighborShape::Eight.offsets();
        assert_eq!(offsets.len(), 8);
        assert!(offsets.contains(&(1, 1)));
    }
}
