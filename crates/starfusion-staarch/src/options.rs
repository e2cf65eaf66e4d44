//! [`StaarchOptions`]: the option set spec.md §4.4 lists, plus the
//! `processOptions`-style [`StaarchOptions::validate`] that runs once
//! before any pixel work begins.

use starfusion_color::Sensor;
use starfusion_core::error::{Error, Result};
use starfusion_core::image::Image;
use starfusion_core::range::IntervalSet;
use starfusion_core::rect::Rect;
use starfusion_starfm::{StarfmOptions, TempDiffWeighting};

/// Which neighbors count toward the connectivity test in the change-mask
/// step (spec.md §4.4 step 1e).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeighborShape {
    /// Up/down/left/right.
    #[default]
    Four,
    /// The 4-neighborhood plus the four diagonals.
    Eight,
}

impl NeighborShape {
    /// Pixel offsets this shape contributes, excluding the center.
    pub fn offsets(self) -> &'static [(i64, i64)] {
        const FOUR: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        const EIGHT: [(i64, i64); 8] = [
            (0, -1), (0, 1), (-1, 0), (1, 0),
            (-1, -1), (1, -1), (-1, 1), (1, 1),
        ];
        match self {
            NeighborShape::Four => &FOUR,
            NeighborShape::Eight => &EIGHT,
        }
    }
}

/// How the moving average over disturbance-index images is aligned
/// relative to the date it's assigned to (spec.md §4.4 step 2b).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovingAverageAlignment {
    /// The window trails the assigned date.
    Left,
    /// The assigned date sits at the window's center (odd widths) or
    /// just after center (even widths). Width 2 is a no-op, per spec.md.
    #[default]
    Center,
    /// The window leads the assigned date.
    Right,
}

/// STAARCH's options, see spec.md §4.4.
#[derive(Debug, Clone)]
pub struct StaarchOptions {
    /// Left edge of the disturbance interval (a high-res pair date).
    pub date_left: i64,
    /// Right edge of the disturbance interval (a high-res pair date).
    pub date_right: i64,
    /// Resolution tag of the high-spatial-resolution series.
    pub high_tag: String,
    /// Resolution tag of the low-spatial-resolution series.
    pub low_tag: String,
    /// Optional tag of a per-date validity mask.
    pub mask_tag: Option<String>,
    /// Sensor whose tasseled-cap coefficients apply to the high-res
    /// series.
    pub high_res_sensor: Sensor,
    /// Sensor whose tasseled-cap coefficients apply to the low-res
    /// series.
    pub low_res_sensor: Sensor,
    /// Permutation mapping source band index to the sensor's canonical
    /// band order; `None` means the source is already in canonical
    /// order.
    pub source_channel_order: Option<Vec<usize>>,
    /// Acceptable standardized high-res DI range for a disturbed pixel.
    pub high_res_di_range: IntervalSet,
    /// Acceptable NDVI range gating disturbance acceptance.
    pub ndvi_range: IntervalSet,
    /// Acceptable standardized brightness range.
    pub brightness_range: IntervalSet,
    /// Acceptable standardized greenness range.
    pub greeness_range: IntervalSet,
    /// Acceptable standardized wetness range.
    pub wetness_range: IntervalSet,
    /// `t ∈ [0, 1]`: the low-res DI threshold is `min + (max - min) * t`.
    pub low_res_di_ratio: f64,
    /// Width of the moving average applied to low-res DI images.
    pub number_images_for_averaging: u32,
    /// Alignment of the moving average window.
    pub di_moving_average_window: MovingAverageAlignment,
    /// Connectivity used by the change-mask step.
    pub neighbor_shape: NeighborShape,
    /// Number of land-cover clusters; ignored if `cluster_image` is set.
    pub number_land_classes: u32,
    /// Explicit cluster assignment image (one channel, cluster index per
    /// pixel); if absent, STAARCH clusters the left-date tasseled-cap
    /// image itself via k-means++.
    pub cluster_image: Option<Image>,
    /// When `true`, per-land-class standardization for the left- and
    /// right-date tasseled-cap images shares one combined validity mask
    /// (union of both dates') rather than standardizing each date
    /// against its own mask independently. Resolves an ambiguity spec.md
    /// leaves open (§9 Open Question).
    pub standardize_with_shared_mask: bool,
    /// Options forwarded to each of the three STARFM sub-calls; its
    /// `high_tag`/`low_tag`/`date_1`/`date_3`/`prediction_area` fields
    /// are overwritten per call and so are ignored here.
    pub starfm_options: StarfmOptions,
    /// Sub-region to predict; empty means the full image.
    pub prediction_area: Rect,
}

impl Default for StaarchOptions {
    fn default() -> Self {
        StaarchOptions {
            date_left: 0,
            date_right: 0,
            high_tag: "high".to_string(),
            low_tag: "low".to_string(),
            mask_tag: None,
            high_res_sensor: Sensor::Landsat,
            low_res_sensor: Sensor::Modis,
            source_channel_order: None,
            high_res_di_range: IntervalSet::new(),
            ndvi_range: IntervalSet::new(),
            brightness_range: IntervalSet::new(),
            greeness_range: IntervalSet::new(),
            wetness_range: IntervalSet::new(),
            low_res_di_ratio: 0.5,
            number_images_for_averaging: 1,
            di_moving_average_window: MovingAverageAlignment::default(),
            neighbor_shape: NeighborShape::default(),
            number_land_classes: 1,
            cluster_image: None,
            standardize_with_shared_mask: false,
            starfm_options: StarfmOptions {
                use_temp_diff_for_weights: TempDiffWeighting::Enable,
                ..StarfmOptions::default()
            },
            prediction_area: Rect::default(),
        }
    }
}

impl StaarchOptions {
    /// Validates the option combination, the way `processOptions` does in
    /// spec.md §3/§7.
    pub fn validate(&self) -> Result<()> {
        if self.high_tag == self.low_tag {
            return Err(Error::invalid_argument(
                "STAARCH: high_tag and low_tag must be distinct",
            ));
        }
        if self.date_right <= self.date_left {
            return Err(Error::invalid_argument(
                "STAARCH: date_right must be after date_left",
            ));
        }
        if !(0.0..=1.0).contains(&self.low_res_di_ratio) {
            return Err(Error::invalid_argument(
                "STAARCH: low_res_di_ratio must be in [0, 1]",
            ));
        }
        if self.number_images_for_averaging == 0 {
            return Err(Error::invalid_argument(
                "STAARCH: number_images_for_averaging must be positive",
            ));
        }
        if self.cluster_image.is_none() && self.number_land_classes == 0 {
            return Err(Error::invalid_argument(
                "STAARCH: number_land_classes must be positive without an explicit cluster image",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_tag_is_invalid_argument() {
        let opts = StaarchOptions {
            low_tag: "high".to_string(),
            date_left: 1,
            date_right: 2,
            ..StaarchOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn non_increasing_interval_is_invalid_argument() {
        let opts = StaarchOptions {
            date_left: 5,
            date_right: 5,
            ..StaarchOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn ratio_out_of_range_is_invalid_argument() {
        let opts = StaarchOptions {
            date_left: 1,
            date_right: 2,
            low_res_di_ratio: 1.5,
            ..StaarchOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn default_with_dates_is_valid() {
        let opts = StaarchOptions {
            date_left: 1,
            date_right: 2,
            ..StaarchOptions::default()
        };
        assert!(opts.validate().is_ok());
    }
}
