//! [`StarfmOptions`]: the enumerated option set spec.md §4.2 lists, plus
//! the `processOptions`-style [`StarfmOptions::validate`] that runs once
//! before any pixel work begins.

use starfusion_core::error::{Error, Result};
use starfusion_core::rect::Rect;

/// Whether (and under what condition) STARFM's weight formula includes
/// the temporal-difference term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempDiffWeighting {
    /// Never include `dt` in the weight (`dt` is treated as `0` for
    /// weighting purposes only; it still participates in candidate
    /// filtering).
    Disable,
    /// Always include `dt` in the weight.
    #[default]
    Enable,
    /// Include `dt` only when both pair dates are available
    /// (double-pair mode); single-pair predictions weight as if
    /// disabled.
    OnDoublePair,
}

/// STARFM's options, see spec.md §4.2.
#[derive(Debug, Clone)]
pub struct StarfmOptions {
    /// Resolution tag of the high-spatial-resolution series.
    pub high_tag: String,
    /// Resolution tag of the low-spatial-resolution series.
    pub low_tag: String,
    /// First (or only) pair date.
    pub date_1: i64,
    /// Second pair date; `Some` switches to double-pair mode.
    pub date_3: Option<i64>,
    /// Odd side length of the moving window.
    pub win_size: u32,
    /// Divides the per-channel high-res σ to produce the same-class
    /// spectral tolerance.
    pub number_classes: u32,
    /// Spectral uncertainty σ term.
    pub spectral_uncertainty: f64,
    /// Temporal uncertainty σ term.
    pub temporal_uncertainty: f64,
    /// Whether the weight formula's temporal term is active.
    pub use_temp_diff_for_weights: TempDiffWeighting,
    /// `> 0` switches the weight formula to the logarithmic form, using
    /// this as the scale factor `k`.
    pub log_scale_factor: f64,
    /// `true`: a candidate must pass both the temporal and spectral
    /// filters; `false`: either is sufficient.
    pub use_strict_filtering: bool,
    /// Shortcut exact copies where the spectral or temporal diff is
    /// exactly zero.
    pub do_copy_on_zero_diff: bool,
    /// Sub-region to predict; empty means the full image.
    pub prediction_area: Rect,
}

impl Default for StarfmOptions {
    fn default() -> Self {
        StarfmOptions {
            high_tag: "high".to_string(),
            low_tag: "low".to_string(),
            date_1: 0,
            date_3: None,
            win_size: 3,
            number_classes: 1,
            spectral_uncertainty: 0.0,
            temporal_uncertainty: 0.0,
            use_temp_diff_for_weights: TempDiffWeighting::default(),
            log_scale_factor: 0.0,
            use_strict_filtering: false,
            do_copy_on_zero_diff: true,
            prediction_area: Rect::default(),
        }
    }
}

impl StarfmOptions {
    /// `true` if both `date_1` and `date_3` pair dates are configured.
    pub fn is_double_pair(&self) -> bool {
        self.date_3.is_some()
    }

    /// Validates the option combination, the way `processOptions` does in
    /// spec.md §3/§7: every invalid combination is caught here, before
    /// `predict` touches any image.
    pub fn validate(&self) -> Result<()> {
        if self.high_tag == self.low_tag {
            return Err(Error::invalid_argument(
                "STARFM: high_tag and low_tag must be distinct",
            ));
        }
        if self.win_size == 0 || self.win_size % 2 == 0 {
            return Err(Error::invalid_argument(format!(
                "STARFM: win_size must be a positive odd integer, got {}",
                self.win_size
            )));
        }
        if self.number_classes == 0 {
            return Err(Error::invalid_argument(
                "STARFM: number_classes must be positive",
            ));
        }
        if let Some(date_3) = self.date_3 {
            if date_3 == self.date_1 {
                return Err(Error::invalid_argument(
                    "STARFM: date_1 and date_3 must be distinct",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_tag_is_invalid_argument() {
        let mut opts = StarfmOptions {
            low_tag: "high".to_string(),
            ..StarfmOptions::default()
        };
        opts.high_tag = "high".to_string();
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn even_win_size_is_invalid_argument() {
        let opts = StarfmOptions {
            win_size: 4,
            ..StarfmOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn default_options_are_valid() {
        let opts = StarfmOptions::default();
        assert!(opts.validate().is_ok());
    }
}
